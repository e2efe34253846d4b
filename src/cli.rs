//! Command-line interface definition using clap.

use clap::Parser;

/// Inspect Telegram chat-export backup folders: parse the chat data,
/// inventory the media files, and print the records.
#[derive(Parser, Debug, Clone)]
#[command(name = "tgvault")]
#[command(version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    tgvault ChatExport_2023-06-28
    tgvault ChatExport_2023-02-27 ChatExport_2023-03-18 --quiet
    tgvault ChatExport_2023-06-28 --json")]
pub struct Args {
    /// One or more backup root folders
    #[arg(required = true, value_name = "BACKUP_DIR")]
    pub backups: Vec<String>,

    /// Dump each parsed chat as JSON instead of record lines
    #[arg(long)]
    pub json: bool,

    /// Only print per-folder summaries, not individual records
    #[arg(short, long)]
    pub quiet: bool,
}
