//! Command implementations for seqlog.
//!
//! Handlers are thin: resolve the target path, load the effective config,
//! run the log engine, append an audit event, and print a short summary.
//! All locking and atomicity lives in the `locks` and `log` modules.

use crate::cli::{
    AddArgs, Cli, Command, DeleteArgs, ListArgs, LockAction, LockClearArgs, LockCommand,
    LockShowArgs, UpdateArgs,
};
use crate::config::Config;
use crate::error::{Result, SeqLogError};
use crate::events::{Event, EventAction, append_event};
use crate::locks;
use crate::log::{Mode, SeqDataLog, mutate};
use crate::target;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::path::Path;

/// Dispatch a parsed command line to its implementation.
pub fn dispatch(cli: Cli) -> Result<()> {
    let config_flag = cli.config;
    match cli.command {
        Command::Add(args) => cmd_add(args, config_flag.as_deref()),
        Command::Update(args) => cmd_update(args, config_flag.as_deref()),
        Command::Delete(args) => cmd_delete(args, config_flag.as_deref()),
        Command::List(args) => cmd_list(args),
        Command::Lock(lock_cmd) => dispatch_lock(lock_cmd, config_flag.as_deref()),
    }
}

/// Dispatch lock subcommands.
fn dispatch_lock(lock_cmd: LockCommand, config_flag: Option<&Path>) -> Result<()> {
    match lock_cmd.action {
        LockAction::Show(args) => cmd_lock_show(args, config_flag),
        LockAction::Clear(args) => cmd_lock_clear(args, config_flag),
    }
}

/// Append an audit event, warning instead of failing.
///
/// A mutation that already succeeded must not be reported as failed just
/// because the audit side-car could not be written.
fn record_event(log_path: &Path, config: &Config, event: Event) {
    if !config.log_events {
        return;
    }
    if let Err(e) = append_event(log_path, &event) {
        eprintln!("Warning: failed to record audit event: {}", e);
    }
}

fn cmd_add(args: AddArgs, config_flag: Option<&Path>) -> Result<()> {
    let config = Config::resolve(config_flag, &args.log_file)?;
    let directory = target::resolve_dir(&args.directory)?;

    mutate(
        &args.log_file,
        Mode::Add,
        &directory,
        &args.description,
        &config,
    )?;

    record_event(
        &args.log_file,
        &config,
        Event::new(EventAction::Add)
            .with_path(directory.display().to_string())
            .with_details(json!({"description": args.description})),
    );

    println!(
        "Added {} to {}",
        directory.display(),
        args.log_file.display()
    );
    Ok(())
}

fn cmd_update(args: UpdateArgs, config_flag: Option<&Path>) -> Result<()> {
    let config = Config::resolve(config_flag, &args.log_file)?;
    let directory = target::resolve_dir(&args.directory)?;

    mutate(
        &args.log_file,
        Mode::Update,
        &directory,
        &args.description,
        &config,
    )?;

    record_event(
        &args.log_file,
        &config,
        Event::new(EventAction::Update)
            .with_path(directory.display().to_string())
            .with_details(json!({"description": args.description})),
    );

    println!(
        "Updated {} in {}",
        directory.display(),
        args.log_file.display()
    );
    Ok(())
}

fn cmd_delete(args: DeleteArgs, config_flag: Option<&Path>) -> Result<()> {
    let config = Config::resolve(config_flag, &args.log_file)?;
    // The directory may already be gone; resolve the key lexically then.
    let directory = target::resolve_key(&args.directory)?;

    mutate(&args.log_file, Mode::Delete, &directory, "", &config)?;

    record_event(
        &args.log_file,
        &config,
        Event::new(EventAction::Delete).with_path(directory.display().to_string()),
    );

    println!(
        "Removed {} from {}",
        directory.display(),
        args.log_file.display()
    );
    Ok(())
}

fn cmd_list(args: ListArgs) -> Result<()> {
    // Read-only: no lock needed, the atomic replace means we never see a
    // half-written file.
    let log = SeqDataLog::load_or_default(&args.log_file)?;

    if log.is_empty() {
        println!("No entries in {}.", args.log_file.display());
        return Ok(());
    }

    println!("Entries in {} ({}):", args.log_file.display(), log.len());
    println!();

    for entry in log.entries() {
        let logged = DateTime::<Utc>::from_timestamp(entry.timestamp, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| entry.timestamp.to_string());

        println!("  {}", entry.path);
        println!("    Logged:      {}", logged);
        if !entry.description.is_empty() {
            println!("    Description: {}", entry.description);
        }
        println!();
    }

    Ok(())
}

fn cmd_lock_show(args: LockShowArgs, config_flag: Option<&Path>) -> Result<()> {
    let config = Config::resolve(config_flag, &args.log_file)?;

    let Some(info) = locks::inspect_lock(&args.log_file, &config)? else {
        println!("No lock held for {}.", args.log_file.display());
        return Ok(());
    };

    println!("Lock held for {}:", args.log_file.display());
    match &info.metadata {
        Some(meta) => {
            println!("  Owner:      {}", meta.owner);
            if let Some(pid) = meta.pid {
                println!("  PID:        {}", pid);
            }
            println!(
                "  Created:    {}",
                meta.created_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
            println!("  Age:        {}", meta.age_string());
            println!("  Action:     {}", meta.action);
        }
        None => println!("  Metadata:   unreadable"),
    }
    if info.is_stale {
        println!(
            "  Status:     STALE (exceeds {} min threshold)",
            config.lock_stale_minutes
        );
        println!(
            "\nUse `seqlog lock clear {} --force` to clear it.",
            args.log_file.display()
        );
    }
    println!("  Path:       {}", info.path.display());

    Ok(())
}

fn cmd_lock_clear(args: LockClearArgs, config_flag: Option<&Path>) -> Result<()> {
    if !args.force {
        return Err(SeqLogError::UserError(format!(
            "refusing to clear lock without --force flag.\n\n\
             Clearing a lock can corrupt the log if the holder is still active.\n\
             Only clear locks left behind by a crashed process.\n\n\
             To clear the lock, run:\n  seqlog lock clear {} --force",
            args.log_file.display()
        )));
    }

    let config = Config::resolve(config_flag, &args.log_file)?;
    let cleared = locks::clear_lock(&args.log_file, &config)?;

    record_event(
        &args.log_file,
        &config,
        Event::new(EventAction::LockClear).with_details(json!({
            "was_stale": cleared.is_stale,
            "owner": cleared.metadata.as_ref().map(|m| m.owner.clone()),
            "original_action": cleared.metadata.as_ref().map(|m| m.action.clone()),
        })),
    );

    println!("Cleared lock: {}", cleared.path.display());
    if let Some(meta) = &cleared.metadata {
        println!("  Owner:      {}", meta.owner);
        println!("  Age:        {}", meta.age_string());
        println!("  Action:     {}", meta.action);
        if cleared.is_stale {
            println!("  Status:     was STALE");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events;
    use crate::exit_codes;
    use crate::log::LOG_HEADER;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn make_dir(temp: &TempDir, name: &str) -> PathBuf {
        let dir = temp.path().join(name);
        fs::create_dir(&dir).unwrap();
        dir
    }

    #[test]
    fn add_creates_log_and_audit_event() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join("seq_data.log");
        let run1 = make_dir(&temp, "run1");

        cmd_add(
            AddArgs {
                log_file: log_path.clone(),
                directory: run1.clone(),
                description: "first run".to_string(),
            },
            None,
        )
        .unwrap();

        let content = fs::read_to_string(&log_path).unwrap();
        assert!(content.starts_with(LOG_HEADER));
        let canonical = run1.canonicalize().unwrap();
        assert!(content.contains(&format!("{}\t", canonical.display())));
        assert!(content.contains("\tfirst run"));

        let events_file = events::events_path_for(&log_path).unwrap();
        let events_content = fs::read_to_string(&events_file).unwrap();
        assert!(events_content.contains("\"add\""));
    }

    #[test]
    fn add_duplicate_maps_to_duplicate_exit_code() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join("seq_data.log");
        let run1 = make_dir(&temp, "run1");

        let args = || AddArgs {
            log_file: log_path.clone(),
            directory: run1.clone(),
            description: String::new(),
        };
        cmd_add(args(), None).unwrap();

        let err = cmd_add(args(), None).unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::DUPLICATE_ENTRY);
    }

    #[test]
    fn add_missing_directory_maps_to_target_not_found() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join("seq_data.log");

        let err = cmd_add(
            AddArgs {
                log_file: log_path.clone(),
                directory: temp.path().join("no-such-run"),
                description: String::new(),
            },
            None,
        )
        .unwrap_err();

        assert_eq!(err.exit_code(), exit_codes::TARGET_NOT_FOUND);
        assert!(!log_path.exists());
    }

    #[test]
    fn update_then_delete_flow() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join("seq_data.log");
        let run1 = make_dir(&temp, "run1");

        // Update on an empty log inserts.
        cmd_update(
            UpdateArgs {
                log_file: log_path.clone(),
                directory: run1.clone(),
                description: "rerun".to_string(),
            },
            None,
        )
        .unwrap();

        let log = SeqDataLog::load(&log_path).unwrap();
        assert_eq!(log.len(), 1);

        cmd_delete(
            DeleteArgs {
                log_file: log_path.clone(),
                directory: run1.clone(),
            },
            None,
        )
        .unwrap();

        let log = SeqDataLog::load(&log_path).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn delete_works_after_directory_vanished() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join("seq_data.log");
        let run1 = make_dir(&temp, "run1");
        let canonical = run1.canonicalize().unwrap();

        cmd_add(
            AddArgs {
                log_file: log_path.clone(),
                directory: run1.clone(),
                description: String::new(),
            },
            None,
        )
        .unwrap();

        // The data directory is removed out from under the log.
        fs::remove_dir(&run1).unwrap();

        cmd_delete(
            DeleteArgs {
                log_file: log_path.clone(),
                directory: canonical,
            },
            None,
        )
        .unwrap();

        let log = SeqDataLog::load(&log_path).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn list_tolerates_missing_log() {
        let temp = TempDir::new().unwrap();
        let result = cmd_list(ListArgs {
            log_file: temp.path().join("seq_data.log"),
        });
        assert!(result.is_ok());
    }

    #[test]
    fn lock_show_without_lock() {
        let temp = TempDir::new().unwrap();
        let result = cmd_lock_show(
            LockShowArgs {
                log_file: temp.path().join("seq_data.log"),
            },
            None,
        );
        assert!(result.is_ok());
    }

    #[test]
    fn lock_clear_refuses_without_force() {
        let temp = TempDir::new().unwrap();
        let err = cmd_lock_clear(
            LockClearArgs {
                log_file: temp.path().join("seq_data.log"),
                force: false,
            },
            None,
        )
        .unwrap_err();

        assert_eq!(err.exit_code(), exit_codes::USER_ERROR);
        assert!(err.to_string().contains("--force"));
    }

    #[test]
    fn lock_clear_with_force_removes_lock() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join("seq_data.log");
        let lock_path = locks::lock_path_for(&log_path).unwrap();

        fs::write(
            &lock_path,
            locks::LockMetadata::new("add").to_json().unwrap(),
        )
        .unwrap();

        cmd_lock_clear(
            LockClearArgs {
                log_file: log_path.clone(),
                force: true,
            },
            None,
        )
        .unwrap();

        assert!(!lock_path.exists());
    }

    #[test]
    fn explicit_config_governs_lock_retries() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join("seq_data.log");
        let run1 = make_dir(&temp, "run1");

        let config_path = temp.path().join("custom.yaml");
        fs::write(&config_path, "lock_retries: 0\nlock_wait_ms: 10\n").unwrap();

        // Hold the lock so the add must fail fast.
        let config = Config::load(&config_path).unwrap();
        let _guard = locks::acquire_log_lock(&log_path, "add", &config).unwrap();

        let err = cmd_add(
            AddArgs {
                log_file: log_path.clone(),
                directory: run1,
                description: String::new(),
            },
            Some(&config_path),
        )
        .unwrap_err();

        assert_eq!(err.exit_code(), exit_codes::LOCK_FAILURE);
        assert!(!log_path.exists());
    }
}
