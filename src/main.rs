//! # tgvault CLI
//!
//! Command-line driver for the tgvault library. Processes each backup
//! folder independently: one folder failing to load is reported and the
//! remaining folders are still processed.

use std::path::Path;
use std::process;

use clap::Parser;

use tgvault::cli::Args;
use tgvault::{Backup, Result};

fn main() {
    let args = Args::parse();

    let mut failed = 0usize;
    for backup_dir in &args.backups {
        if let Err(e) = process_backup(Path::new(backup_dir), &args) {
            eprintln!("Error in {backup_dir}: {e}");
            failed += 1;
        }
    }

    if failed > 0 {
        eprintln!("{failed} of {} backup folder(s) failed", args.backups.len());
        process::exit(1);
    }
}

fn process_backup(root: &Path, args: &Args) -> Result<()> {
    let backup = Backup::load(root)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&backup.chat)?);
        return Ok(());
    }

    println!("{}", root.display());
    println!("  {}", backup.chat);
    println!(
        "  Media: {} files, {} photos, {} video files, {} voice messages",
        backup.files.len(),
        backup.photos.len(),
        backup.video_files.len(),
        backup.voice_messages.len()
    );

    if !args.quiet {
        for event in &backup.chat.messages {
            println!("  {event}");
        }
    }

    Ok(())
}
