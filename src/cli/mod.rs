//! CLI argument parsing for seqlog.
//!
//! Uses clap derive macros for declarative argument definitions. This
//! module defines the command structure; actual implementations are in
//! the `commands` module.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Seqlog: shared log of sequencing data directories.
///
/// The log is a flat tab-delimited file, safe to update from many hosts
/// at once: every mutation runs under an exclusive lock and rewrites the
/// file atomically, sorted newest-first.
#[derive(Parser, Debug)]
#[command(name = "seqlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to a YAML config file (default: seqlog.yaml next to the log file).
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for seqlog.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record a new sequencing data directory.
    ///
    /// Fails if the directory is already logged; the log file is created
    /// with its header on first use.
    Add(AddArgs),

    /// Refresh the entry for a directory.
    ///
    /// Replaces the entry's timestamp and description; inserts the entry
    /// if the directory was not logged yet.
    Update(UpdateArgs),

    /// Remove the entry for a directory.
    ///
    /// Succeeds even if no entry exists or the directory itself has
    /// vanished.
    Delete(DeleteArgs),

    /// Print the logged directories, newest first.
    List(ListArgs),

    /// Lock management commands.
    ///
    /// Inspect or clear the lock guarding a log file.
    Lock(LockCommand),
}

/// Arguments for the `add` command.
#[derive(Parser, Debug)]
pub struct AddArgs {
    /// Path to the log file.
    pub log_file: PathBuf,

    /// Sequencing data directory to record.
    pub directory: PathBuf,

    /// Free-text description for the entry.
    #[arg(short, long, default_value = "")]
    pub description: String,
}

/// Arguments for the `update` command.
#[derive(Parser, Debug)]
pub struct UpdateArgs {
    /// Path to the log file.
    pub log_file: PathBuf,

    /// Sequencing data directory to refresh.
    pub directory: PathBuf,

    /// Free-text description for the entry.
    #[arg(short, long, default_value = "")]
    pub description: String,
}

/// Arguments for the `delete` command.
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Path to the log file.
    pub log_file: PathBuf,

    /// Directory whose entry should be removed.
    pub directory: PathBuf,
}

/// Arguments for the `list` command.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Path to the log file.
    pub log_file: PathBuf,
}

/// Lock subcommands.
#[derive(Parser, Debug)]
pub struct LockCommand {
    #[command(subcommand)]
    pub action: LockAction,
}

/// Available lock actions.
#[derive(Subcommand, Debug)]
pub enum LockAction {
    /// Show the lock guarding a log file, if any.
    Show(LockShowArgs),

    /// Clear the lock guarding a log file.
    ///
    /// Requires --force to prevent accidental clearing.
    Clear(LockClearArgs),
}

/// Arguments for the `lock show` command.
#[derive(Parser, Debug)]
pub struct LockShowArgs {
    /// Path to the log file.
    pub log_file: PathBuf,
}

/// Arguments for the `lock clear` command.
#[derive(Parser, Debug)]
pub struct LockClearArgs {
    /// Path to the log file.
    pub log_file: PathBuf,

    /// Force clearing the lock (required for safety).
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_debug_assert() {
        // Verifies the CLI arguments configuration is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_add_minimal() {
        let cli = Cli::try_parse_from(["seqlog", "add", "seq_data.log", "/data/run1"]).unwrap();
        if let Command::Add(args) = cli.command {
            assert_eq!(args.log_file, PathBuf::from("seq_data.log"));
            assert_eq!(args.directory, PathBuf::from("/data/run1"));
            assert_eq!(args.description, "");
        } else {
            panic!("Expected Add command");
        }
    }

    #[test]
    fn parse_add_with_description() {
        let cli = Cli::try_parse_from([
            "seqlog",
            "add",
            "seq_data.log",
            "/data/run1",
            "--description",
            "first run",
        ])
        .unwrap();
        if let Command::Add(args) = cli.command {
            assert_eq!(args.description, "first run");
        } else {
            panic!("Expected Add command");
        }
    }

    #[test]
    fn parse_update_short_description_flag() {
        let cli =
            Cli::try_parse_from(["seqlog", "update", "seq_data.log", "/data/run1", "-d", "redo"])
                .unwrap();
        if let Command::Update(args) = cli.command {
            assert_eq!(args.directory, PathBuf::from("/data/run1"));
            assert_eq!(args.description, "redo");
        } else {
            panic!("Expected Update command");
        }
    }

    #[test]
    fn parse_delete() {
        let cli = Cli::try_parse_from(["seqlog", "delete", "seq_data.log", "/data/run1"]).unwrap();
        if let Command::Delete(args) = cli.command {
            assert_eq!(args.directory, PathBuf::from("/data/run1"));
        } else {
            panic!("Expected Delete command");
        }
    }

    #[test]
    fn parse_list() {
        let cli = Cli::try_parse_from(["seqlog", "list", "seq_data.log"]).unwrap();
        if let Command::List(args) = cli.command {
            assert_eq!(args.log_file, PathBuf::from("seq_data.log"));
        } else {
            panic!("Expected List command");
        }
    }

    #[test]
    fn parse_lock_show() {
        let cli = Cli::try_parse_from(["seqlog", "lock", "show", "seq_data.log"]).unwrap();
        if let Command::Lock(lock_cmd) = cli.command {
            assert!(matches!(lock_cmd.action, LockAction::Show(_)));
        } else {
            panic!("Expected Lock command");
        }
    }

    #[test]
    fn parse_lock_clear() {
        let cli =
            Cli::try_parse_from(["seqlog", "lock", "clear", "seq_data.log", "--force"]).unwrap();
        if let Command::Lock(lock_cmd) = cli.command {
            if let LockAction::Clear(args) = lock_cmd.action {
                assert_eq!(args.log_file, PathBuf::from("seq_data.log"));
                assert!(args.force);
            } else {
                panic!("Expected Clear action");
            }
        } else {
            panic!("Expected Lock command");
        }
    }

    #[test]
    fn parse_global_config_flag() {
        let cli = Cli::try_parse_from([
            "seqlog",
            "add",
            "seq_data.log",
            "/data/run1",
            "--config",
            "custom.yaml",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("custom.yaml")));
    }
}
