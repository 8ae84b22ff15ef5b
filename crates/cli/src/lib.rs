pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::commands::import::ImportArgs;

#[derive(Debug, Parser)]
#[command(
    name = "dropshop",
    about = "Dropshop operator CLI",
    long_about = "Operate the Dropshop store: migrations, config inspection, readiness checks, offline scoring and supplier imports.",
    after_help = "Examples:\n  dropshop doctor --json\n  dropshop analyze candidates.json\n  dropshop import --supplier cj --keyword \"desk lamp\" --dry-run"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations")]
    Migrate,
    #[command(about = "Inspect effective configuration values with source attribution and redaction")]
    Config,
    #[command(about = "Validate config, database connectivity, supplier and payment credentials")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Score a JSON file of candidate products without touching the database")]
    Analyze {
        #[arg(help = "Path to a JSON array of candidate products")]
        file: PathBuf,
    },
    #[command(about = "Search a supplier and import approved products into the catalog")]
    Import {
        #[arg(long, help = "Supplier to search: cj, zendrop or appscenic")]
        supplier: String,
        #[arg(long = "keyword", required = true, help = "Search keyword; repeat for more")]
        keywords: Vec<String>,
        #[arg(long, help = "Score the results without writing to the catalog")]
        dry_run: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Analyze { file } => commands::analyze::run(&file),
        Command::Import { supplier, keywords, dry_run } => {
            commands::import::run(ImportArgs { supplier, keywords, dry_run })
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
