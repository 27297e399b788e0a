use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tyche_client::{CommandVisionBridge, DirCaptureSource, load_rules};
use tyche_core::output::write_dataset;
use tyche_core::traits::{CaptureSource, VisionBridge};
use tyche_core::{AdapterRegistry, Pipeline, PipelineConfig, TracingPipelineReporter};

#[derive(Parser)]
#[command(name = "tyche", version, about = "Lottery draw extraction pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract canonical draw records from a directory of captures
    Extract {
        /// Directory of `.meta.json` sidecars and body files
        #[arg(short, long, env = "TYCHE_CAPTURES")]
        captures: PathBuf,

        /// Adapter rule file or directory (JSON/YAML)
        #[arg(short, long, env = "TYCHE_RULES")]
        rules: Option<PathBuf>,

        /// Output directory for the dataset and manifest
        #[arg(short, long, env = "TYCHE_OUT", default_value = "datasets")]
        out: PathBuf,

        /// Reference date for the recency window (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        as_of: Option<NaiveDate>,

        /// Recency window in days (overrides TYCHE_RECENCY_DAYS)
        #[arg(long)]
        recency_days: Option<i64>,

        /// OCR program invoked as `PROG <image>`
        #[arg(long, env = "TYCHE_VISION_CMD")]
        vision_cmd: Option<PathBuf>,

        /// Process captures one at a time
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },

    /// Show the lane order used for a host
    Route {
        /// Host name, e.g. www.powerball.com
        #[arg(long)]
        host: String,

        /// Adapter rule file or directory (JSON/YAML)
        #[arg(short, long, env = "TYCHE_RULES")]
        rules: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tyche=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            captures,
            rules,
            out,
            as_of,
            recency_days,
            vision_cmd,
            sequential,
        } => {
            cmd_extract(
                captures,
                rules,
                out,
                as_of,
                recency_days,
                vision_cmd,
                sequential,
            )
            .await?;
        }
        Commands::Route { host, rules } => {
            cmd_route(&host, rules).await?;
        }
    }

    Ok(())
}

async fn registry(rules: Option<PathBuf>) -> Result<AdapterRegistry> {
    match rules {
        Some(path) => load_rules(&path)
            .await
            .with_context(|| format!("Failed to load adapter rules from {}", path.display())),
        None => Ok(AdapterRegistry::empty()),
    }
}

/// End of the given day, so draws dated that day are inside the window.
fn reference_instant(as_of: Option<NaiveDate>) -> Result<DateTime<Utc>> {
    match as_of {
        Some(date) => Ok(date
            .and_hms_opt(23, 59, 59)
            .context("Invalid --as-of date")?
            .and_utc()),
        None => Ok(Utc::now()),
    }
}

#[allow(clippy::too_many_arguments)]
async fn cmd_extract(
    captures: PathBuf,
    rules: Option<PathBuf>,
    out: PathBuf,
    as_of: Option<NaiveDate>,
    recency_days: Option<i64>,
    vision_cmd: Option<PathBuf>,
    sequential: bool,
) -> Result<()> {
    let as_of = reference_instant(as_of)?;
    let mut config = PipelineConfig::from_env()
        .context("Invalid pipeline configuration")?
        .with_as_of(as_of)
        .with_sequential(sequential);
    if let Some(days) = recency_days {
        config = config
            .with_recency_window(days)
            .context("Invalid --recency-days")?;
    }

    let adapters = registry(rules).await?;
    let vision = vision_cmd
        .map(|cmd| Arc::new(CommandVisionBridge::new(cmd)) as Arc<dyn VisionBridge>);

    let source = DirCaptureSource::new(&captures);
    let loaded = source
        .load()
        .await
        .with_context(|| format!("Failed to load captures from {}", captures.display()))?;

    let pipeline = Pipeline::new(config, adapters, vision).context("Failed to build pipeline")?;
    let dataset = tokio::task::spawn_blocking(move || {
        pipeline.run(&loaded, &TracingPipelineReporter)
    })
    .await
    .context("Extraction task panicked")?;

    let files = write_dataset(&out, &dataset, as_of).context("Failed to write dataset")?;

    println!("Records: {}", dataset.records.len());
    println!(
        "Captures: {} (skipped {}, soft 404 {}, unresolved {}, aborted {})",
        dataset.stats.captures,
        dataset.stats.skipped_status,
        dataset.stats.soft_404,
        dataset.stats.unresolved,
        dataset.stats.aborted
    );
    println!("Rejected candidates: {}", dataset.stats.rejected);
    for (lane, count) in &dataset.stats.per_lane {
        println!("  {lane:<14} {count}");
    }
    println!("JSON: {}", files.json.display());
    println!("CSV: {}", files.csv.display());
    println!("Manifest: {}", files.manifest.display());

    Ok(())
}

async fn cmd_route(host: &str, rules: Option<PathBuf>) -> Result<()> {
    let adapters = registry(rules).await?;
    let pipeline = Pipeline::new(PipelineConfig::default(), adapters, None)
        .context("Failed to build pipeline")?;

    let lanes = pipeline.route(host);
    let names: Vec<&str> = lanes.iter().map(|l| l.as_str()).collect();
    println!("{host}: {}", names.join(" -> "));
    println!(
        "{}",
        serde_json::to_string(&lanes).context("Failed to serialize lane order")?
    );

    Ok(())
}
