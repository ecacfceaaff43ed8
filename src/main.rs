use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tally::cli::{handle_add, handle_query, handle_total};
use tally::config::{Settings, TallyPaths};
use tally::models::Category;
use tally::storage::EntryRepository;

#[derive(Parser)]
#[command(
    name = "tally",
    version,
    about = "Command-line personal ledger for income and expense tracking",
    long_about = "Tally is a command-line personal ledger. It records dated \
                  income and expense entries, keeps them in a plain JSON file \
                  with a backup copy on every write, and answers filtered \
                  queries and running totals."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a new entry
    Add {
        /// Amount (positive)
        amount: f64,
        /// Entry category (income or expense)
        #[arg(short, long)]
        category: Category,
        /// Entry date (YYYY-MM-DD), defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Free-text description
        #[arg(long)]
        description: Option<String>,
    },

    /// List entries, optionally filtered by date range and category
    #[command(alias = "list")]
    Query {
        /// Start date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        from: Option<String>,
        /// End date (YYYY-MM-DD, inclusive)
        #[arg(long)]
        to: Option<String>,
        /// Filter by category
        #[arg(short, long)]
        category: Option<Category>,
    },

    /// Show the net total (income minus expenses)
    Total {
        /// Restrict the total to one category
        #[arg(short, long)]
        category: Option<Category>,
    },

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Initialize paths and settings
    let paths = TallyPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;

    // Hydrate the store from disk
    let mut repo = EntryRepository::open(paths.records_file());

    match cli.command {
        Commands::Add {
            amount,
            category,
            date,
            description,
        } => {
            handle_add(&mut repo, &settings, date, category, amount, description)?;
        }
        Commands::Query { from, to, category } => {
            handle_query(&repo, &settings, from, to, category)?;
        }
        Commands::Total { category } => {
            handle_total(&repo, &settings, category)?;
        }
        Commands::Config => {
            println!("Tally Configuration");
            println!("===================");
            println!("Config directory: {}", paths.config_dir().display());
            println!("Data directory:   {}", paths.data_dir().display());
            println!("Records file:     {}", paths.records_file().display());
            println!();
            println!("Settings:");
            println!("  Currency symbol: {}", settings.currency_symbol);
            println!("  Date format:     {}", settings.date_format);
            println!("  Entries on file: {}", repo.len());
        }
    }

    Ok(())
}
