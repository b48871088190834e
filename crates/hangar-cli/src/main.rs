mod backends;

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use hangar_client::{HtmdCleaner, HtmlListingStrategy};
use hangar_core::ats;
use hangar_core::harvest::HarvestService;
use hangar_core::models::ScrapeRun;
use hangar_core::normalize::Normalizer;
use hangar_core::scheduler::{Scheduler, TracingSchedulerReporter};
use hangar_core::target::{Target, TargetStatus, Tier};
use hangar_core::traits::{RunLog, TargetRegistry};
use hangar_core::SchedulerConfig;
use hangar_db::{Database, DatabaseConfig, JobRepository, RunRepository, TargetRepository};

use crate::backends::{Classifier, Fetcher};

type HangarScheduler = Scheduler<
    TargetRepository,
    HtmlListingStrategy<Fetcher, HtmdCleaner>,
    Classifier,
    JobRepository,
    RunRepository,
>;

#[derive(Parser)]
#[command(name = "hangar", version, about = "Pilot job harvester")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scheduler loop until ctrl-c
    Run {
        /// Process a single batch and exit
        #[arg(long, default_value_t = false)]
        once: bool,

        #[command(flatten)]
        harvest: HarvestArgs,
    },

    /// Retry degraded targets whose backoff has elapsed
    Retry {
        #[command(flatten)]
        harvest: HarvestArgs,
    },

    /// Show queue statistics
    Stats,

    /// Show the most recent target runs
    Runs {
        /// Number of runs to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// List registered targets
    Targets {
        /// Filter by status (active, degraded, disabled)
        #[arg(short, long)]
        status: Option<TargetStatus>,
    },

    /// Register a new target
    AddTarget {
        /// Airline or agency display name
        name: String,

        /// Careers page URL
        url: String,

        /// Priority tier (1, 2 or 3)
        #[arg(short, long, default_value_t = 2)]
        tier: u8,

        #[arg(short, long)]
        region: Option<String>,

        /// Vendor hint used when the URL alone is inconclusive
        #[arg(long)]
        hint: Option<String>,
    },

    /// Print the extraction strategy detected for a URL
    Classify {
        url: String,

        /// Vendor hint used when the URL alone is inconclusive
        #[arg(long)]
        hint: Option<String>,
    },
}

/// Options shared by the commands that harvest targets.
#[derive(Args)]
struct HarvestArgs {
    /// Classifier model
    #[arg(long, env = "HANGAR_CLASSIFIER_MODEL", default_value = "gpt-4o-mini")]
    model: String,

    /// OpenAI-compatible API base URL
    #[arg(long, env = "HANGAR_CLASSIFIER_URL")]
    classifier_url: Option<String>,

    /// Classifier API key; rule-based extraction only when unset
    #[arg(long, env = "HANGAR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Detail pages fetched per target to fill posting bodies
    #[arg(long, env = "HANGAR_DETAIL_PAGES", default_value_t = 0)]
    detail_pages: usize,

    /// Delay between detail page requests, in seconds
    #[arg(long, default_value_t = 2)]
    detail_delay_secs: u64,

    /// Render pages in a headless browser
    #[arg(long, default_value_t = false)]
    browser: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hangar=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { once, harvest } => {
            let db = connect_db().await?;
            let scheduler = build_scheduler(&db, &harvest).await?;
            if once {
                cmd_run_once(&scheduler).await?;
            } else {
                cmd_run(&scheduler).await?;
            }
        }
        Commands::Retry { harvest } => {
            let db = connect_db().await?;
            let scheduler = build_scheduler(&db, &harvest).await?;
            cmd_retry(&scheduler).await?;
        }
        Commands::Stats => {
            let db = connect_db().await?;
            cmd_stats(&db).await?;
        }
        Commands::Runs { limit } => {
            let db = connect_db().await?;
            cmd_runs(&db, limit).await?;
        }
        Commands::Targets { status } => {
            let db = connect_db().await?;
            cmd_targets(&db, status).await?;
        }
        Commands::AddTarget {
            name,
            url,
            tier,
            region,
            hint,
        } => {
            let db = connect_db().await?;
            let tier = Tier::try_from(tier).map_err(|e| anyhow::anyhow!(e))?;
            let mut target = Target::new(name, url, tier);
            if let Some(region) = region {
                target = target.with_region(region);
            }
            if let Some(hint) = hint {
                target = target.with_category_hint(hint);
            }
            cmd_add_target(&db, &target).await?;
        }
        Commands::Classify { url, hint } => {
            println!("{}", ats::resolve(&url, hint.as_deref()));
        }
    }

    Ok(())
}

/// Connect to PostgreSQL using DATABASE_URL and apply pending migrations.
async fn connect_db() -> Result<Database> {
    let config = DatabaseConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    let db = Database::connect(&config)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.map_err(|e| anyhow::anyhow!(e))?;
    Ok(db)
}

async fn build_scheduler(db: &Database, args: &HarvestArgs) -> Result<HangarScheduler> {
    let config = SchedulerConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;

    let fetcher = Fetcher::build(args.browser)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    let strategy = HtmlListingStrategy::new(fetcher, HtmdCleaner::new()).with_detail_pages(
        args.detail_pages,
        Duration::from_secs(args.detail_delay_secs),
    );

    let classifier = Classifier::from_args(
        args.api_key.as_deref(),
        &args.model,
        args.classifier_url.as_deref(),
    )
    .map_err(|e| anyhow::anyhow!(e))?;

    let harvest = HarvestService::new(
        strategy,
        Normalizer::with_classifier(classifier),
        db.job_repo(),
    );
    Ok(Scheduler::new(db.target_repo(), harvest, db.run_repo(), config))
}

/// Cancel the returned token on ctrl-c.
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received ctrl-c, finishing in-flight targets");
            on_signal.cancel();
        }
    });
    token
}

async fn cmd_run(scheduler: &HangarScheduler) -> Result<()> {
    let cancel_token = shutdown_token();
    scheduler
        .run(cancel_token, &TracingSchedulerReporter)
        .await
        .map_err(|e| anyhow::anyhow!(e))
}

async fn cmd_run_once(scheduler: &HangarScheduler) -> Result<()> {
    let cancel_token = shutdown_token();
    let runs = scheduler
        .run_once(&cancel_token, &TracingSchedulerReporter)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    print_runs(&runs);
    Ok(())
}

async fn cmd_retry(scheduler: &HangarScheduler) -> Result<()> {
    let cancel_token = shutdown_token();
    let runs = scheduler
        .retry_degraded(&cancel_token, &TracingSchedulerReporter)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    if runs.is_empty() {
        println!("No degraded targets ready for retry");
    }
    print_runs(&runs);
    Ok(())
}

async fn cmd_stats(db: &Database) -> Result<()> {
    let config = SchedulerConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;
    let stats = db
        .target_repo()
        .queue_stats(Utc::now(), &config.schedule)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    let active_jobs = db
        .job_repo()
        .count_active()
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    println!("Targets: {} total, {} due", stats.total, stats.due);
    for (tier, count) in &stats.by_tier {
        println!("  tier {tier}: {count}");
    }
    for (status, count) in &stats.by_status {
        println!("  {status}: {count}");
    }
    println!("Active jobs: {active_jobs}");
    Ok(())
}

async fn cmd_runs(db: &Database, limit: usize) -> Result<()> {
    let runs = db
        .run_repo()
        .recent(limit)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    if runs.is_empty() {
        println!("No runs recorded yet");
        return Ok(());
    }
    print_runs(&runs);
    println!("\nTotal: {} runs", runs.len());
    Ok(())
}

async fn cmd_targets(db: &Database, status: Option<TargetStatus>) -> Result<()> {
    let targets = db
        .target_repo()
        .list_targets(status)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    for target in &targets {
        let checked = target
            .last_checked_at
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "  [tier {}] {:<9} {} ({}) failures={} checked={}",
            target.tier,
            target.status,
            target.name,
            target.url,
            target.consecutive_failures,
            checked,
        );
    }
    println!("\nTotal: {} targets", targets.len());
    Ok(())
}

async fn cmd_add_target(db: &Database, target: &Target) -> Result<()> {
    let inserted = db
        .target_repo()
        .insert(target)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    if inserted {
        println!(
            "{}",
            serde_json::to_string_pretty(target).context("Failed to serialize target")?
        );
    } else {
        println!("A target with URL {} is already registered", target.url);
    }
    Ok(())
}

fn print_runs(runs: &[ScrapeRun]) {
    for run in runs {
        let error = run.error.as_deref().unwrap_or("");
        println!(
            "  [{}] {} {} strategy={} postings={} saved={} rejected={} {}ms {}",
            run.status.as_str(),
            run.completed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            run.target_name,
            run.detected_strategy,
            run.postings_found,
            run.jobs_saved,
            run.rejected,
            run.duration_ms,
            error,
        );
    }
}
