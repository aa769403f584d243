//! worklog CLI
//!
//! Command-line interface for the worklog query engine:
//! - Run a query against a CSV file of time entries
//! - Check a query without executing it
//! - Generate a default config file

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use worklog::{CsvImporter, Executor, MemorySource, Report, Settings};

#[derive(Parser)]
#[command(name = "worklog")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query language and aggregation engine for time-tracking records")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Settings file (default: standard locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    format: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a query against a CSV file of entries
    Run {
        /// Query text, e.g. 'WHERE year = 2024 VIEW table'
        query: String,
        /// CSV file with date,hours[,rate,project,client,category,notes] columns
        #[arg(short = 'e', long)]
        entries: PathBuf,
        /// Date format of the CSV date column (strftime)
        #[arg(long, default_value = "%Y-%m-%d")]
        date_format: String,
        /// Resolve relative periods against this date instead of today
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },

    /// Compile a query and print its normalized form
    Check {
        /// Query text
        query: String,
    },

    /// Generate a default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "worklog=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            query,
            entries,
            date_format,
            as_of,
        } => {
            let settings = match &cli.config {
                Some(path) => Settings::load_with_env(path)?,
                None => Settings::load_default(),
            };

            let import = CsvImporter::new()
                .with_date_format(&date_format)
                .import(&entries)
                .with_context(|| format!("importing {:?}", entries))?;

            if import.rows_failed > 0 {
                eprintln!(
                    "{} of {} rows skipped:",
                    import.rows_failed, import.rows_processed
                );
                for error in import.errors.iter().take(10) {
                    eprintln!("  {error}");
                }
            }

            let source = Arc::new(MemorySource::new(import.entries));
            let executor = Executor::new(source, settings.clone());

            let compiled = match worklog::compile(&query, executor.registry()) {
                Ok(q) => q,
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            };

            let report = match as_of {
                Some(today) => executor.execute_as_of(&compiled, today).await?,
                None => executor.execute(&compiled).await?,
            };

            match cli.format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&report)?),
                _ => print_report(&report, &settings),
            }
        }

        Commands::Check { query } => {
            let registry = worklog::HandlerRegistry::builtin();
            match worklog::compile(&query, &registry) {
                Ok(compiled) => {
                    println!("{}", serde_json::to_string_pretty(&compiled)?);
                }
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Config { output } => {
            let config = worklog::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{config}");
                }
            }
        }
    }

    Ok(())
}

fn print_report(report: &Report, settings: &Settings) {
    let symbol = &settings.currency_symbol;

    if report.monthly.is_empty() {
        println!("No entries matched the query");
        return;
    }

    println!(
        "{:<16} {:>8} {:>12} {:>7} {:>8}",
        "Month", "Hours", "Invoiced", "Util", "Rate"
    );
    println!("{}", "-".repeat(56));
    for point in &report.monthly {
        println!(
            "{:<16} {:>8.1} {:>11.2}{} {:>6.0}% {:>8.2}",
            point.label,
            point.hours,
            point.invoiced,
            symbol,
            point.utilization * 100.0,
            point.rate,
        );
    }

    println!();
    print_summary("Period", &report.summary, symbol);
    print_summary("Year", &report.year_summary, symbol);
    print_summary("All time", &report.all_time_summary, symbol);
}

fn print_summary(label: &str, summary: &worklog::SummaryData, symbol: &str) {
    let mut line = format!(
        "{label}: {:.1} h, {:.2}{symbol} ({:.0}% utilization)",
        summary.total_hours,
        summary.total_invoiced,
        summary.utilization * 100.0,
    );
    if let (Some(progress), Some(remaining)) = (summary.budget_progress, summary.budget_remaining)
    {
        line.push_str(&format!(
            ", budget {:.0}% used, {:.1} h remaining",
            progress * 100.0,
            remaining
        ));
    }
    println!("{line}");
}
