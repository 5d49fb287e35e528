mod cli;
mod logging;
mod report;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use cli::{Cli, Commands};
use colored::*;
use dotenv::dotenv;
use report::CliReporter;
use sheet_sleuth::{AppConfig, DeleteRequest, ScanEngine};
use std::io::{self, Write};
use std::process;
use tracing::{error, info};

fn main() -> Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = sheet_sleuth::config::load_configuration()
        .context("Error loading configuration")?;

    let args = Cli::parse();

    match args.command {
        Some(Commands::Scan) => {
            if let Err(err) = run_scan(config) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::Delete { ids }) => {
            if let Err(err) = run_delete(config, ids) {
                error!("Error: {}", err);
            }
        }
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:?}", config);
        }
        None => {
            let _ = Cli::command().print_long_help();
        }
    }

    Ok(())
}

fn run_scan(config: AppConfig) -> Result<()> {
    let engine = ScanEngine::new(config);
    let reporter = CliReporter::new();
    let records = engine.results(&reporter)?;

    println!();
    for record in records.iter() {
        println!(
            "  {}  {}  {}",
            record.name().green(),
            record.display_author().cyan(),
            record.id().dimmed(),
        );
    }
    info!(
        "{} spreadsheet files found",
        format!("{}", records.len()).green(),
    );
    Ok(())
}

fn run_delete(config: AppConfig, ids: Vec<String>) -> Result<()> {
    match prompt_confirm(
        &format!("Delete {} file(s) from disk?", ids.len()),
        Some(false),
    ) {
        Ok(true) => {}
        _ => {
            process::exit(0);
        }
    }

    let engine = ScanEngine::new(config);
    let reporter = CliReporter::new();
    let requests: Vec<DeleteRequest> = ids.into_iter().map(DeleteRequest::Id).collect();
    let outcome = engine.delete_files(&requests, &reporter)?;

    println!();
    for path in &outcome.deleted {
        println!("  {} {}", "deleted".green(), path.display());
    }
    for failure in &outcome.failed {
        println!("  {} {}: {}", "failed".red(), failure.request, failure.reason);
    }

    let records = engine.results(&reporter)?;
    info!(
        "{} deleted, {} failed, {} spreadsheet files remain",
        format!("{}", outcome.deleted.len()).green(),
        format!("{}", outcome.failed.len()).red(),
        records.len(),
    );
    Ok(())
}

fn prompt_confirm(prompt: &str, default: Option<bool>) -> io::Result<bool> {
    let mut input = String::new();

    loop {
        input.clear();

        match default {
            Some(true) => print!("{} (Y/n): ", prompt),
            Some(false) | None => print!("{} (y/N): ", prompt),
        }
        io::stdout().flush()?;

        io::stdin().read_line(&mut input)?;

        match input.trim().to_uppercase().as_str() {
            "Y" => return Ok(true),
            "N" => return Ok(false),
            "" => match default {
                Some(default) => return Ok(default),
                None => continue,
            },
            _ => continue,
        }
    }
}
