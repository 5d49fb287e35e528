use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "sheet-sleuth")]
#[command(about = "Finds spreadsheet files across the machine and reports their authors", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan the filesystem roots and list every spreadsheet file found
    Scan,
    /// Delete discovered files by id (as printed by `scan`), then rescan
    Delete {
        /// Ids of the files to delete
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Print configuration values
    PrintConfig,
}
