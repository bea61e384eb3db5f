use anyhow::Result;
use clap::{Parser, Subcommand};
use inventory_etl::loader::{self, LoadOutcome};
use inventory_etl::output::{self, OutputFormat};
use inventory_etl::{db, reports, staging};
use shared::ReportKind;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "inventory-etl", about = "Load staged inventory data and report on stock")]
struct Args {
    #[arg(long, env = "DATABASE_URL", default_value = "inventory.db")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create or upgrade the final tables.
    Migrate,
    /// Append CSV files to the staging tables.
    Stage {
        #[arg(long)]
        products: Option<PathBuf>,
        #[arg(long)]
        suppliers: Option<PathBuf>,
        #[arg(long)]
        shipments: Option<PathBuf>,
        #[arg(long)]
        inventory_log: Option<PathBuf>,
    },
    /// Copy staged rows into the final tables and drop staging.
    Load,
    /// Drop the staging tables if they exist.
    DropStaging,
    /// Run reports; all of them when none are named.
    Report {
        reports: Vec<ReportKind>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut conn = db::connect_and_migrate(&args.database_url)?;

    match args.command {
        Command::Migrate => {
            info!("Database {} is up to date", args.database_url);
        }
        Command::Stage {
            products,
            suppliers,
            shipments,
            inventory_log,
        } => {
            let sources = staging::StagingSources {
                products,
                suppliers,
                shipments,
                inventory_log,
            };
            staging::import(&mut conn, &sources)?;
        }
        Command::Load => match loader::load(&mut conn)? {
            LoadOutcome::Loaded(summary) => {
                info!(
                    "Loaded {} products, {} suppliers, {} shipments, {} log entries",
                    summary.products, summary.suppliers, summary.shipments, summary.inventory_log
                );
            }
            LoadOutcome::NothingStaged => {}
        },
        Command::DropStaging => {
            staging::drop_tables(&mut conn)?;
            info!("Staging tables dropped");
        }
        Command::Report { reports: kinds, format } => {
            let kinds = if kinds.is_empty() {
                ReportKind::ALL.to_vec()
            } else {
                kinds
            };
            let results = kinds
                .into_iter()
                .map(|kind| reports::run(&mut conn, kind))
                .collect::<Result<Vec<_>, _>>()?;
            output::write_reports(&results, format, std::io::stdout().lock())?;
        }
    }

    Ok(())
}
