//! # Atelier Ledger CLI
//!
//! Command-line front end for the workshop's components, products and
//! sales.
//!
//! ## Module Organization
//! ```text
//! atelier (bin)
//! ├── main.rs         ◄─── You are here (arguments, startup, dispatch)
//! ├── commands/       ◄─── One module per noun
//! └── error.rs        ◄─── CLI error type and exit codes
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Application Startup                               │
//! │                                                                         │
//! │  1. Parse arguments (clap)                                             │
//! │  2. Initialize logging                                                 │
//! │     • tracing-subscriber with env filter, to stderr                    │
//! │     • Default: info,atelier=debug,sqlx=warn; RUST_LOG overrides        │
//! │  3. Load pricing.toml + ATELIER_* environment overrides                │
//! │  4. Determine database path                                            │
//! │     --db > ATELIER_DB_PATH > [database] path > platform data dir       │
//! │  5. Connect (WAL, migrations) and run the subcommand                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use atelier_core::stats::RankBy;
use atelier_db::{Database, DbConfig};
use atelier_pricing::PricingConfig;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use commands::Context;
use error::CliResult;

// =============================================================================
// Arguments
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "atelier")]
#[command(about = "Inventory, costing and sales ledger for a sewing workshop")]
#[command(version)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = "ATELIER_DB_PATH")]
    db: Option<PathBuf>,

    /// pricing.toml to use instead of the platform config dir
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Raw materials
    #[command(subcommand)]
    Components(ComponentCommands),

    /// Products and their costs
    #[command(subcommand)]
    Products(ProductCommands),

    /// Sales and payments
    #[command(subcommand)]
    Sales(SaleCommands),

    /// Fetch current vendor prices for components with a link
    RefreshPrices {
        /// Only this category ("Sin categoría" for uncategorized)
        #[arg(long)]
        category: Option<String>,
    },

    /// Profit report over paid sales
    Stats {
        /// First day included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day included (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Ranking used for the top products
        #[arg(long, value_enum, default_value_t = RankArg::Profit)]
        rank_by: RankArg,
    },
}

#[derive(Debug, Subcommand)]
enum ComponentCommands {
    /// List components
    List {
        #[arg(long)]
        category: Option<String>,
    },

    /// Set a component's purchase price
    SetPrice { id: String, price: Decimal },
}

#[derive(Debug, Subcommand)]
enum ProductCommands {
    /// List products with cost and display price
    List,

    /// Cost breakdown of one product
    Cost { id: String },

    /// Add the default price adjustments to products that lack them
    MigrateAdjustments,
}

#[derive(Debug, Subcommand)]
enum SaleCommands {
    /// List sales
    List(commands::sales::ListArgs),

    /// Show one sale with its payment figures
    Show { id: String },

    /// Record a sale and take it out of stock
    New(commands::sales::NewArgs),

    /// Change quantity, value or payment of a sale
    Edit {
        id: String,
        #[command(flatten)]
        fields: commands::sales::EditArgs,
    },

    /// Mark a sale as fully paid
    Pay { id: String },

    /// Delete a sale and put it back in stock
    Delete { id: String },

    /// Re-run payment reconciliation over every stored sale
    Reconcile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RankArg {
    Profit,
    Cost,
}

impl From<RankArg> for RankBy {
    fn from(arg: RankArg) -> Self {
        match arg {
            RankArg::Profit => RankBy::Profit,
            RankArg::Cost => RankBy::Cost,
        }
    }
}

// =============================================================================
// Entry Point
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(code = ?err.code, "{}", err.message);
            eprintln!("error: {err}");
            ExitCode::from(err.code.exit_code())
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = PricingConfig::load_or_default(cli.config.clone());
    let db_path = cli.db.clone().unwrap_or_else(|| config.database_path());
    let db = open_database(db_path).await?;

    let ctx = Context {
        db,
        config,
        json: cli.json,
    };

    let result = dispatch(&ctx, cli.command).await;
    ctx.db.close().await;
    result
}

async fn dispatch(ctx: &Context, command: Commands) -> CliResult<()> {
    use commands::{components, pricing, products, sales, stats};

    match command {
        Commands::Components(cmd) => match cmd {
            ComponentCommands::List { category } => components::list(ctx, category.as_deref()).await,
            ComponentCommands::SetPrice { id, price } => components::set_price(ctx, &id, price).await,
        },
        Commands::Products(cmd) => match cmd {
            ProductCommands::List => products::list(ctx).await,
            ProductCommands::Cost { id } => products::cost(ctx, &id).await,
            ProductCommands::MigrateAdjustments => products::migrate_adjustments(ctx).await,
        },
        Commands::Sales(cmd) => match cmd {
            SaleCommands::List(args) => sales::list(ctx, args).await,
            SaleCommands::Show { id } => sales::show(ctx, &id).await,
            SaleCommands::New(args) => sales::create(ctx, args).await,
            SaleCommands::Edit { id, fields } => sales::edit(ctx, &id, fields).await,
            SaleCommands::Pay { id } => sales::pay(ctx, &id).await,
            SaleCommands::Delete { id } => sales::delete(ctx, &id).await,
            SaleCommands::Reconcile => sales::reconcile(ctx).await,
        },
        Commands::RefreshPrices { category } => {
            pricing::refresh_prices(ctx, category.as_deref()).await
        }
        Commands::Stats { from, to, rank_by } => {
            stats::report(ctx, from, to, rank_by.into()).await
        }
    }
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=atelier_pricing=trace` - Trace the refresh only
/// - Default: `info,atelier=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,atelier=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Opens the database, creating its directory when needed.
async fn open_database(path: PathBuf) -> CliResult<Database> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    info!(path = %path.display(), "Opening database");
    let db = Database::new(DbConfig::new(&path)).await?;
    debug!("Database ready");
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CliError;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sale_edit() {
        let cli = Cli::try_parse_from([
            "atelier", "sales", "edit", "abc", "--pending", "150.5", "--quantity", "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Sales(SaleCommands::Edit { id, fields }) => {
                assert_eq!(id, "abc");
                assert_eq!(fields.pending, Some(Decimal::new(1505, 1)));
                assert_eq!(fields.quantity, Some(Decimal::from(2)));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_received_conflicts_with_pending() {
        let result = Cli::try_parse_from([
            "atelier", "sales", "edit", "abc", "--received", "1", "--pending", "2",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_stats_range() {
        let cli = Cli::try_parse_from([
            "atelier", "--json", "stats", "--from", "2024-06-30", "--to", "2024-06-01", "--rank-by", "cost",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Stats { from, to, rank_by } => {
                assert_eq!(from, NaiveDate::from_ymd_opt(2024, 6, 30));
                assert_eq!(to, NaiveDate::from_ymd_opt(2024, 6, 1));
                assert_eq!(RankBy::from(rank_by), RankBy::Cost);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_error_codes_render() {
        let err = CliError::not_found("Sale", "x");
        assert_eq!(serde_json::to_value(err.code).unwrap(), "NOT_FOUND");
    }
}
