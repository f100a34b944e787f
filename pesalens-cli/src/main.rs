use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use pesalens_core::{Transaction, UNCATEGORIZED};
use pesalens_finance::{
    CategoryAnalysis, Categorizer, StatementFilter, analyze_statement, available_months,
    transaction_months,
};
use pesalens_ingest::{RawTable, StatementSummary, normalize};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;
mod report;
mod state;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "pesalens", version, about = "M-Pesa statement categorizer and analyzer")]
struct Cli {
    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: ~/.pesalens/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone)]
struct CategoryArgs {
    /// Category definitions YAML
    #[arg(long)]
    categories: Option<PathBuf>,

    /// Extra definitions evaluated before the main file
    #[arg(long)]
    custom: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalize, categorize and analyze a statement
    Analyze {
        /// Extracted statement table (CSV)
        #[arg(long)]
        statement: PathBuf,

        #[command(flatten)]
        categories: CategoryArgs,

        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Month to include, e.g. January_2024 (repeatable)
        #[arg(long = "month")]
        months: Vec<String>,

        /// Counterparties per category (default from config)
        #[arg(long)]
        top: Option<usize>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List loaded category definitions
    Categories {
        #[command(flatten)]
        categories: CategoryArgs,
    },

    /// List transactions no category matched
    Uncategorized {
        #[arg(long)]
        statement: PathBuf,

        #[command(flatten)]
        categories: CategoryArgs,
    },

    /// List months present in a statement
    Months {
        #[arg(long)]
        statement: PathBuf,
    },

    /// Manage ~/.pesalens/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a StatementSummary,
    months: Vec<String>,
    categories: &'a [CategoryAnalysis],
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;

    // Priority: RUST_LOG env var > --verbose flag > config log_level
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(&cfg.log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    match cli.command {
        Command::Analyze {
            statement,
            categories,
            from,
            to,
            months,
            top,
            json,
        } => {
            if from.is_some() != to.is_some() {
                bail!("--from and --to must be given together");
            }
            let txns = load_statement(&statement)?;
            let categorizer = build_categorizer(&cfg, &categories)?;

            let categorized = categorizer.categorize_all(&txns);
            let filter = StatementFilter::from_options(from, to, months);
            let filtered = filter.apply(&categorized);
            let analyses = analyze_statement(&filtered, categorizer.categories());
            let summary = StatementSummary::from_transactions(&txns);

            if json {
                let out = JsonReport {
                    summary: &summary,
                    months: available_months(&categorized),
                    categories: &analyses,
                };
                println!("{}", serde_json::to_string_pretty(&out).context("serialize report")?);
            } else {
                report::print_summary(&summary);
                if filter != StatementFilter::All {
                    println!("Filter:       {filter:?}");
                }
                report::print_analyses(&analyses, top.unwrap_or(cfg.top_n));
            }
        }

        Command::Categories { categories } => {
            let categorizer = build_categorizer(&cfg, &categories)?;
            report::print_categories(categorizer.definitions());
        }

        Command::Uncategorized {
            statement,
            categories,
        } => {
            let txns = load_statement(&statement)?;
            let categorizer = build_categorizer(&cfg, &categories)?;
            let categorized = categorizer.categorize_all(&txns);
            report::print_uncategorized(categorized.get(UNCATEGORIZED));
        }

        Command::Months { statement } => {
            let txns = load_statement(&statement)?;
            for month in transaction_months(&txns) {
                println!("{month}");
            }
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config(&cfg, cli.config.as_deref())?,
        },
    }

    Ok(())
}

fn load_statement(path: &Path) -> Result<Vec<Transaction>> {
    if !path.exists() {
        bail!("statement not found: {}", path.display());
    }
    let table = RawTable::from_csv_path(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let txns = normalize(&table).with_context(|| format!("normalizing {}", path.display()))?;
    info!("Loaded {} transactions from {}", txns.len(), path.display());
    Ok(txns)
}

fn build_categorizer(cfg: &Config, args: &CategoryArgs) -> Result<Categorizer> {
    let path = cfg.categories_path(args.categories.clone());
    let custom = cfg.custom_categories_path(args.custom.clone());
    Categorizer::from_path(&path, custom.as_deref())
        .with_context(|| format!("loading categories from {}", path.display()))
}
