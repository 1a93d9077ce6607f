//! Repsignal CLI - entity monitoring and threat classification.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use intel::{EntityMemoryClient, RemoteProvider, ThreatClassifier, DEFAULT_MODEL};
use monitor::{
    HealthConfig, HealthMap, HealthPoller, IngestClient, IngestConfig, MonitoringTracker,
    NoopScanner, Pipeline, Platform, SourceRegistry, Ticker, DEFAULT_HEALTH_PERIOD,
};
use notify::Notifier;

#[derive(Parser)]
#[command(name = "repsignal")]
#[command(about = "Entity monitoring, threat classification, and alerting", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the monitoring pipeline and health poller until interrupted
    Run {
        /// Entity to monitor
        #[arg(short, long)]
        entity: String,

        /// Seconds between scan cycles
        #[arg(long, default_value = "3600")]
        interval_secs: u64,

        /// JSON file with the scraping source registry
        #[arg(long)]
        sources: Option<PathBuf>,

        /// Base URL for backend health probes
        #[arg(long, env = "REPSIGNAL_HEALTH_URL")]
        health_url: Option<String>,
    },

    /// Run a single scan cycle and print the result
    Scan {
        /// Entity to monitor
        #[arg(short, long)]
        entity: String,

        /// JSON file with the scraping source registry
        #[arg(long)]
        sources: Option<PathBuf>,
    },

    /// Probe backend services once and print their statuses
    Health {
        /// Base URL for backend health probes
        #[arg(long, env = "REPSIGNAL_HEALTH_URL")]
        base_url: Option<String>,
    },

    /// Classify a piece of content against a monitored entity
    Analyze {
        /// Content to classify
        content: String,

        /// Platform the content was observed on
        #[arg(short, long, default_value = "web")]
        platform: String,

        /// Entity the content concerns
        #[arg(short, long)]
        entity: String,

        /// Skip entity memory context
        #[arg(long)]
        no_memory: bool,
    },

    /// Search remembered observations for an entity
    Memories {
        /// Search query
        query: String,

        /// Entity to search under
        #[arg(short, long)]
        entity: String,

        /// Narrow the search (e.g. "sentiment", "threat")
        #[arg(long)]
        search_type: Option<String>,
    },

    /// Submit content to the ingestion endpoint
    Submit {
        /// Content to submit
        content: String,

        /// Platform the content was observed on
        #[arg(short, long, default_value = "web")]
        platform: String,

        /// Source URL of the content
        #[arg(long)]
        url: Option<String>,

        /// Mark the submission as a test
        #[arg(long)]
        test: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("monitor=debug,intel=debug,notify=debug,info")
    } else {
        EnvFilter::new("monitor=info,intel=info,notify=info,warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Run {
            entity,
            interval_secs,
            sources,
            health_url,
        } => run_pipeline(entity, interval_secs, sources, health_url).await,
        Commands::Scan { entity, sources } => scan_once(entity, sources).await,
        Commands::Health { base_url } => health_once(base_url).await,
        Commands::Analyze {
            content,
            platform,
            entity,
            no_memory,
        } => analyze(content, &platform, entity, no_memory).await,
        Commands::Memories {
            query,
            entity,
            search_type,
        } => memories(query, entity, search_type).await,
        Commands::Submit {
            content,
            platform,
            url,
            test,
        } => submit(content, &platform, url, test).await,
    }
}

fn load_sources(path: Option<PathBuf>) -> Result<SourceRegistry> {
    match path {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read sources file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Invalid sources file {}", path.display()))
        }
        None => {
            warn!("No sources file given, starting with an empty registry");
            Ok(SourceRegistry::new())
        }
    }
}

fn parse_platform(s: &str) -> Result<Platform> {
    s.parse().map_err(|e: String| anyhow::anyhow!(e))
}

fn build_pipeline(entity: String, sources: SourceRegistry) -> Arc<Pipeline> {
    let notifier = Arc::new(Notifier::from_env());
    Arc::new(Pipeline::new(
        entity,
        MonitoringTracker::new(),
        sources,
        Arc::new(NoopScanner),
        notifier,
    ))
}

async fn run_pipeline(
    entity: String,
    interval_secs: u64,
    sources: Option<PathBuf>,
    health_url: Option<String>,
) -> Result<()> {
    let registry = load_sources(sources)?;
    let pipeline = build_pipeline(entity, registry);
    pipeline.start();

    let scan_ticker = Arc::new(Ticker::new(Duration::from_secs(interval_secs)));
    let scan_task = {
        let pipeline = Arc::clone(&pipeline);
        let ticker = Arc::clone(&scan_ticker);
        tokio::spawn(async move {
            pipeline.run(&ticker).await;
        })
    };

    let health_config = HealthConfig {
        base_url: health_url.unwrap_or_else(|| HealthConfig::default().base_url),
        ..HealthConfig::default()
    };
    let health_ticker = Arc::new(Ticker::new(DEFAULT_HEALTH_PERIOD));
    let (health_tx, mut health_rx) = watch::channel(HealthMap::new());
    let health_task = {
        let ticker = Arc::clone(&health_ticker);
        tokio::spawn(async move {
            HealthPoller::new(health_config).run(&ticker, &health_tx).await;
        })
    };

    let health_log = tokio::spawn(async move {
        while health_rx.changed().await.is_ok() {
            let map = health_rx.borrow().clone();
            let unhealthy: Vec<&str> = map
                .iter()
                .filter(|(_, s)| **s != monitor::ServiceStatus::Active)
                .map(|(name, _)| name.as_str())
                .collect();
            if unhealthy.is_empty() {
                info!(services = map.len(), "All backend services healthy");
            } else {
                warn!(?unhealthy, "Backend services degraded");
            }
        }
    });

    info!("Monitoring running, press ctrl-c to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutting down");
    pipeline.stop();
    scan_ticker.cancel();
    health_ticker.cancel();
    let _ = tokio::join!(scan_task, health_task);
    health_log.abort();

    Ok(())
}

async fn scan_once(entity: String, sources: Option<PathBuf>) -> Result<()> {
    let registry = load_sources(sources)?;
    let pipeline = build_pipeline(entity, registry);
    pipeline.start();

    let result = pipeline.scan_cycle().await;
    println!(
        "fetched: {}, stored: {}, notified: {}, errors: {}",
        result.fetched,
        result.stored,
        result.notified,
        result.errors.len()
    );
    for error in &result.errors {
        println!("  error: {error}");
    }
    Ok(())
}

async fn health_once(base_url: Option<String>) -> Result<()> {
    let config = HealthConfig {
        base_url: base_url.unwrap_or_else(|| HealthConfig::default().base_url),
        ..HealthConfig::default()
    };
    let map = HealthPoller::new(config).probe_all().await;

    let mut services: Vec<_> = map.iter().collect();
    services.sort_by_key(|(name, _)| name.as_str());
    for (name, status) in services {
        println!("{name}: {status:?}");
    }
    Ok(())
}

fn build_classifier() -> Result<ThreatClassifier> {
    let provider = RemoteProvider::from_env()
        .context("INTEL_API_URL is not set")?;
    let memory = EntityMemoryClient::from_env();
    if memory.is_none() {
        warn!("MEMORY_API_URL not set, classifying without entity memory");
    }
    ThreatClassifier::new(Arc::new(provider), memory, DEFAULT_MODEL.to_string())
        .context("Failed to initialize threat classifier")
}

async fn analyze(content: String, platform: &str, entity: String, no_memory: bool) -> Result<()> {
    let platform = parse_platform(platform)?;
    let classifier = build_classifier()?;

    let analysis = classifier
        .analyze(&content, platform.as_str(), &entity, !no_memory)
        .await
        .context("Classification failed")?;

    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

async fn memories(query: String, entity: String, search_type: Option<String>) -> Result<()> {
    let classifier = build_classifier()?;
    let entries = classifier
        .search_memories(&query, &entity, search_type.as_deref())
        .await;

    if entries.is_empty() {
        println!("No memories matched");
        return Ok(());
    }
    for entry in entries {
        println!("{}", entry.context_line());
    }
    Ok(())
}

async fn submit(content: String, platform: &str, url: Option<String>, test: bool) -> Result<()> {
    let platform = parse_platform(platform)?;
    let client = IngestClient::new(IngestConfig::from_env()?);

    let response = client
        .submit(&content, platform, url.as_deref(), test)
        .await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
