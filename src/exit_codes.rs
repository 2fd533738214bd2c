//! Exit code constants for the seqlog CLI.
//!
//! Each error kind maps to its own code so shell callers can branch on
//! the failure without parsing stderr:
//! - 0: Success
//! - 1: User error (bad args, malformed log or config)
//! - 2: Target directory not found
//! - 3: Duplicate entry on add
//! - 4: Lock acquisition failure
//! - 5: Filesystem I/O failure

/// Successful execution.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, malformed log file, or invalid config.
pub const USER_ERROR: i32 = 1;

/// Target directory missing on add/update.
pub const TARGET_NOT_FOUND: i32 = 2;

/// Add attempted against a directory already present in the log.
pub const DUPLICATE_ENTRY: i32 = 3;

/// Lock acquisition failure: another process holds the log lock.
pub const LOCK_FAILURE: i32 = 4;

/// Filesystem failure during read, temp-file write, or atomic replace.
pub const IO_FAILURE: i32 = 5;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            SUCCESS,
            USER_ERROR,
            TARGET_NOT_FOUND,
            DUPLICATE_ENTRY,
            LOCK_FAILURE,
            IO_FAILURE,
        ];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn exit_codes_match_documented_values() {
        assert_eq!(SUCCESS, 0);
        assert_eq!(USER_ERROR, 1);
        assert_eq!(TARGET_NOT_FOUND, 2);
        assert_eq!(DUPLICATE_ENTRY, 3);
        assert_eq!(LOCK_FAILURE, 4);
        assert_eq!(IO_FAILURE, 5);
    }
}
