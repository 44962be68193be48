//! `gogarden history` subcommands

use super::CommandContext;
use crate::output::{JsonFormatter, OutputFormat};
use anyhow::Result;
use clap::Subcommand;
use colored::*;
use gogarden_core::NewIdentification;

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List recorded identifications, newest first
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Record an identification
    Add {
        /// Common plant name
        #[arg(short, long)]
        name: Option<String>,

        /// Scientific name
        #[arg(long)]
        scientific: Option<String>,

        /// Confidence percentage (0-100)
        #[arg(short, long, default_value_t = 0.0)]
        confidence: f64,

        /// Image the identification was made from
        #[arg(long)]
        image: Option<String>,

        /// The plant matched an entry in the local database
        #[arg(long)]
        matched: bool,
    },

    /// Delete all recorded identifications
    Clear,
}

pub async fn execute(context: &CommandContext, command: HistoryCommand) -> Result<()> {
    let history = context.open_history();

    match command {
        HistoryCommand::List { format } => {
            let entries = history.load().await;
            match format {
                OutputFormat::Text => print!("{}", context.text().history(&entries)),
                OutputFormat::Json => println!("{}", JsonFormatter::new(true).history(&entries)?),
            }
        }
        HistoryCommand::Add {
            name,
            scientific,
            confidence,
            image,
            matched,
        } => {
            let identification = NewIdentification {
                plant_name: name,
                scientific_name: scientific,
                confidence,
                image_uri: image,
                matched_in_database: matched,
            };
            let Some(entry) = history.record(identification).await else {
                anyhow::bail!("Failed to write {}", history.path().display());
            };
            println!("{}", entry.id);
            eprintln!("{}", format!("Recorded {}", entry.plant_name).green());
        }
        HistoryCommand::Clear => {
            if !history.clear().await {
                anyhow::bail!("Failed to clear {}", history.path().display());
            }
            eprintln!("{}", "History cleared".green());
        }
    }

    Ok(())
}
