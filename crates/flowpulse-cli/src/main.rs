use std::str::FromStr;

use clap::{Parser, Subcommand};

use flowpulse_core::Platform;
use flowpulse_ingest::{Orchestrator, UnitStatus};

#[derive(Debug, Parser)]
#[command(name = "flowpulse-cli")]
#[command(about = "Workflow popularity collection CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a collection sweep now
    Collect {
        /// Platforms to collect, comma-separated (defaults to all with a
        /// working collector)
        #[arg(long, value_delimiter = ',')]
        platforms: Vec<String>,

        /// Countries to collect for, comma-separated (defaults to the
        /// configured list)
        #[arg(long, value_delimiter = ',')]
        countries: Vec<String>,

        /// Maximum items per platform and country
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show recent collection runs
    Runs {
        /// How many runs to show
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = flowpulse_core::load_app_config()?;

    let pool_config = flowpulse_db::PoolConfig::from_app_config(&config);
    let pool = flowpulse_db::connect_pool(&config.database_url, pool_config).await?;
    flowpulse_db::run_migrations(&pool).await?;

    match cli.command {
        Commands::Collect {
            platforms,
            countries,
            limit,
        } => run_collect(pool, &config, &platforms, countries, limit).await,
        Commands::Runs { limit } => show_runs(&pool, limit).await,
    }
}

/// Run a full collection sweep and print a per-unit report.
///
/// Exits non-zero if every unit failed; partial failure is reported but
/// still counts as success, matching the server's trigger semantics.
async fn run_collect(
    pool: sqlx::PgPool,
    config: &flowpulse_core::AppConfig,
    platform_names: &[String],
    countries: Vec<String>,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let orchestrator = Orchestrator::from_config(pool, config);

    let platforms = if platform_names.is_empty() {
        orchestrator.available_platforms()
    } else {
        platform_names
            .iter()
            .map(|name| Platform::from_str(name))
            .collect::<Result<Vec<_>, _>>()?
    };
    if platforms.is_empty() {
        anyhow::bail!("no collectors available; check credentials in the environment");
    }

    let countries = if countries.is_empty() {
        config.countries.clone()
    } else {
        countries
    };
    let limit = limit.unwrap_or(config.items_per_platform);

    let results = orchestrator
        .run_all(&platforms, &countries, limit, config.collect_deadline())
        .await;

    let mut failed = 0usize;
    for unit in &results {
        match unit.status {
            UnitStatus::Succeeded => {
                println!(
                    "{:<8} {:<4} ok      {} items",
                    unit.platform, unit.country, unit.items_collected
                );
            }
            UnitStatus::Failed => {
                failed += 1;
                println!(
                    "{:<8} {:<4} failed  {} items: {}",
                    unit.platform,
                    unit.country,
                    unit.items_collected,
                    unit.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    if !results.is_empty() && failed == results.len() {
        anyhow::bail!("all {failed} units failed");
    }
    Ok(())
}

async fn show_runs(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = flowpulse_db::list_collection_runs(pool, limit.clamp(1, 200)).await?;

    if runs.is_empty() {
        println!("no collection runs recorded yet");
        return Ok(());
    }

    for run in runs {
        let ended = run
            .completed_at
            .map_or_else(|| "-".to_owned(), |t| t.to_rfc3339());
        println!(
            "#{:<6} {:<8} {:<9} {:>4} items  ended {}{}",
            run.id,
            run.platform,
            run.status,
            run.items_collected,
            ended,
            run.error_message
                .map_or_else(String::new, |m| format!("  ({m})"))
        );
    }
    Ok(())
}
