use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use vacancy_client::{
    ExtractorKind, FsSink, ReqwestFetcher, SourceSpec, StdoutSink, build_sources,
    default_sources, load_sources,
};
use vacancy_core::models::{Aggregate, BlobTarget, Page, Source};
use vacancy_core::traits::Sink;
use vacancy_core::{Dispatcher, PipelineConfig, run_once};

#[derive(Parser)]
#[command(name = "vacancy", version, about = "Job board aggregator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every source, extract listings and write the snapshot
    Run {
        /// JSON sources file (defaults to the built-in registry)
        #[arg(short, long, env = "VACANCY_SOURCES")]
        sources: Option<PathBuf>,

        /// Root directory for the snapshot file
        #[arg(short, long, env = "VACANCY_OUT_DIR", default_value = "./snapshots")]
        out: PathBuf,

        /// Print the snapshot to stdout instead of writing a file
        #[arg(long, default_value_t = false)]
        stdout: bool,

        /// Maximum number of fetches in flight
        #[arg(long)]
        concurrency: Option<usize>,

        /// Per-attempt fetch timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Extra attempts after a transient fetch failure
        #[arg(long)]
        retries: Option<u32>,

        /// Snapshot container name
        #[arg(long, default_value = "scrapeddata")]
        container: String,

        /// Snapshot blob name
        #[arg(long, default_value = "raw-output")]
        blob: String,
    },

    /// List the configured sources
    Sources {
        /// JSON sources file (defaults to the built-in registry)
        #[arg(short, long, env = "VACANCY_SOURCES")]
        sources: Option<PathBuf>,

        /// Print as JSON, in sources-file format
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Run one extractor over a local HTML file
    Extract {
        /// Extractor kind (see `vacancy kinds`)
        #[arg(short, long)]
        kind: ExtractorKind,

        /// HTML file to read
        #[arg(short, long)]
        file: PathBuf,

        /// URL the page was saved from, used to resolve relative links
        #[arg(short, long, default_value = "http://localhost/")]
        url: String,

        /// Host label for single-organization pages
        #[arg(long, default_value = "Local file")]
        host: String,
    },

    /// List the available extractor kinds
    Kinds,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("vacancy_core=info".parse()?)
                .add_directive("vacancy_client=info".parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            sources,
            out,
            stdout,
            concurrency,
            timeout_secs,
            retries,
            container,
            blob,
        } => {
            let mut config =
                PipelineConfig::from_env().context("Invalid pipeline configuration")?;
            if let Some(n) = concurrency {
                anyhow::ensure!(n >= 1, "--concurrency must be at least 1");
                config.max_concurrency = n;
            }
            if let Some(secs) = timeout_secs {
                anyhow::ensure!(secs >= 1, "--timeout-secs must be at least 1");
                config.fetch_timeout = Duration::from_secs(secs);
            }
            if let Some(r) = retries {
                config.max_retries = r;
            }

            let sources = resolve_sources(sources.as_deref())?;
            let target = BlobTarget { container, blob };
            if stdout {
                cmd_run(sources, config, &StdoutSink, &target).await?;
            } else {
                let sink = FsSink::new(&out);
                cmd_run(sources, config, &sink, &target).await?;
                println!("Snapshot written to {}", sink.path_for(&target).display());
            }
        }
        Commands::Sources { sources, json } => {
            cmd_sources(sources.as_deref(), json)?;
        }
        Commands::Extract {
            kind,
            file,
            url,
            host,
        } => {
            cmd_extract(kind, &file, &url, &host)?;
        }
        Commands::Kinds => {
            for kind in ExtractorKind::ALL {
                println!("{kind}");
            }
        }
    }

    Ok(())
}

/// Source specs from a file, or the built-in registry.
fn load_specs(path: Option<&Path>) -> Result<Vec<SourceSpec>> {
    match path {
        Some(path) => load_sources(path).map_err(|e| anyhow::anyhow!(e)),
        None => Ok(default_sources()),
    }
}

fn resolve_sources(path: Option<&Path>) -> Result<Arc<[Source]>> {
    let specs = load_specs(path)?;
    build_sources(&specs).map_err(|e| anyhow::anyhow!(e))
}

async fn cmd_run<S: Sink>(
    sources: Arc<[Source]>,
    config: PipelineConfig,
    sink: &S,
    target: &BlobTarget,
) -> Result<()> {
    let fetcher =
        ReqwestFetcher::with_timeout(config.fetch_timeout).context("Failed to create HTTP client")?;
    let dispatcher = Dispatcher::new(fetcher, sources, config);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling in-flight fetches");
            trigger.cancel();
        }
    });

    let report = run_once(&dispatcher, sink, target, &cancel)
        .await
        .map_err(|e| anyhow::anyhow!(e))?;

    if report.failed_sources > 0 {
        tracing::warn!(
            run_id = %report.run_id,
            failed_sources = report.failed_sources,
            "Some sources could not be processed; see Processing Error entries"
        );
    }
    tracing::info!(report = %serde_json::to_string(&report)?, "Run report");

    Ok(())
}

fn cmd_sources(path: Option<&Path>, json: bool) -> Result<()> {
    let specs = load_specs(path)?;
    // Validate the same way `run` does, so problems show up here first.
    build_sources(&specs).map_err(|e| anyhow::anyhow!(e))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&specs)?);
        return Ok(());
    }

    for spec in &specs {
        println!(
            "{:<24} {:<20} {} ({})",
            spec.id,
            spec.extractor.as_str(),
            spec.url,
            spec.host
        );
    }
    println!("\nTotal: {} sources", specs.len());
    Ok(())
}

fn cmd_extract(kind: ExtractorKind, file: &Path, url: &str, host: &str) -> Result<()> {
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read HTML file: {}", file.display()))?;

    let page = Page { url, host, html: &html };
    let hosts = kind
        .extractor()
        .extract(&page)
        .map_err(|e| anyhow::anyhow!(e))
        .with_context(|| format!("{kind} extractor failed on {}", file.display()))?;

    let details: usize = hosts.iter().map(|l| l.details.len()).sum();
    tracing::info!(listings = hosts.len(), details, "Extraction complete");

    let aggregate = Aggregate { hosts };
    println!("{}", serde_json::to_string_pretty(&aggregate)?);
    Ok(())
}
