use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use timeline_sync::prelude::*;
use timeline_sync::sync::{Banner, NoopView};
use tracing_subscriber::EnvFilter;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "timeline-sync")]
#[command(about = "Follow the step-by-step status of a running workflow", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a workflow timeline live
    Watch {
        /// Path to the timeline.yaml config file
        #[arg(short, long, default_value = "timeline.yaml")]
        config: PathBuf,

        /// Task ID of the workflow instance (overrides config)
        #[arg(short, long)]
        task_id: Option<String>,

        /// Dashboard server URL (overrides config)
        #[arg(short, long)]
        server: Option<String>,

        /// Initial state snapshot, file path or URL (overrides config)
        #[arg(long)]
        snapshot: Option<String>,

        /// Stop once the workflow succeeds or fails
        #[arg(short, long)]
        exit_on_finish: bool,
    },

    /// Render a timeline offline from a snapshot and an event log
    Render {
        /// Path to the timeline.yaml config file
        #[arg(short, long, default_value = "timeline.yaml")]
        config: PathBuf,

        /// Task ID of the workflow instance (overrides config)
        #[arg(short, long)]
        task_id: Option<String>,

        /// Initial state snapshot, file path or URL (overrides config)
        #[arg(long)]
        snapshot: Option<String>,

        /// JSON-lines file of status_update payloads
        #[arg(long)]
        events: Option<PathBuf>,
    },

    /// Validate a timeline config without connecting
    Validate {
        /// Path to the timeline.yaml config file
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
}

#[cfg(feature = "otel")]
fn init_otel_tracing(verbose: bool) {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::runtime::Tokio;
    use opentelemetry_sdk::trace::TracerProvider;

    let filter = if verbose {
        "timeline_sync=debug"
    } else {
        "timeline_sync=info"
    };

    let otlp_endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4317".to_string());

    let exporter = match opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&otlp_endpoint)
        .build()
    {
        Ok(exporter) => exporter,
        Err(e) => {
            eprintln!("Failed to create OTLP exporter: {}", e);
            init_tracing(verbose);
            return;
        }
    };

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, Tokio)
        .build();

    let tracer = provider.tracer("timeline-sync");
    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .init();

    opentelemetry::global::set_tracer_provider(provider);
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "timeline_sync=debug"
    } else {
        "timeline_sync=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    #[cfg(feature = "otel")]
    init_otel_tracing(cli.verbose);

    #[cfg(not(feature = "otel"))]
    init_tracing(cli.verbose);

    let result = run(cli).await;

    #[cfg(feature = "otel")]
    opentelemetry::global::shutdown_tracer_provider();

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!(error = %e, "Timeline watch failed");
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    match cli.command {
        Commands::Watch {
            config,
            task_id,
            server,
            snapshot,
            exit_on_finish,
        } => watch(config, task_id, server, snapshot, exit_on_finish).await,
        Commands::Render {
            config,
            task_id,
            snapshot,
            events,
        } => render(config, task_id, snapshot, events).await,
        Commands::Validate { path } => validate(path),
    }
}

fn load_config(path: &Path) -> anyhow::Result<TimelineConfig> {
    if !path.exists() {
        anyhow::bail!("Config file not found: {}", path.display());
    }
    Ok(TimelineConfig::load(path)?)
}

/// Apply the snapshot if one is configured. A snapshot that cannot be
/// loaded is not fatal: live updates still arrive.
async fn apply_snapshot<V: TimelineView>(
    sync: &mut TimelineSynchronizer<V>,
    snapshot: Option<&str>,
) -> anyhow::Result<()> {
    let Some(source) = snapshot else {
        return Ok(());
    };

    match sync.load_initial_state(&SnapshotSource::parse(source)).await {
        Ok(()) => Ok(()),
        Err(SyncError::Snapshot(e)) => {
            tracing::warn!(source = %source, error = %e, "Initial state unavailable, waiting for live updates");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[tracing::instrument(skip_all, fields(config = %config_path.display()))]
async fn watch(
    config_path: PathBuf,
    task_id: Option<String>,
    server: Option<String>,
    snapshot: Option<String>,
    exit_on_finish: bool,
) -> anyhow::Result<bool> {
    let mut config = load_config(&config_path)?;
    if let Some(server) = server {
        config.server = server;
    }
    let task_id = task_id.or(config.task_id.clone()).unwrap_or_default();
    let snapshot = snapshot.or(config.snapshot.clone());

    let view = TerminalView::new(std::io::stdout().is_terminal());
    let mut sync = TimelineSynchronizer::new(&task_id, config.timeline.clone(), view)?;
    apply_snapshot(&mut sync, snapshot.as_deref()).await?;

    let transport = WebSocketTransport::new(&config.server, &config.socket_path);
    tracing::info!(url = %transport.url(), task_id = %task_id, "Watching workflow");
    let session = TimelineSession::start(sync, transport, config.reconnect.clone());

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
            }
            tracing::info!("Interrupted, leaving task room");
        }
        overall = session.wait_for_finish(), if exit_on_finish => {
            tracing::info!(overall = %overall, "Workflow finished");
        }
    }

    let sync = session.stop().await?;
    print_summary(sync.timeline());
    Ok(sync.overall() != OverallState::Fail)
}

#[tracing::instrument(skip_all, fields(config = %config_path.display()))]
async fn render(
    config_path: PathBuf,
    task_id: Option<String>,
    snapshot: Option<String>,
    events: Option<PathBuf>,
) -> anyhow::Result<bool> {
    let config = load_config(&config_path)?;
    let task_id = task_id.or(config.task_id.clone()).unwrap_or_default();
    let snapshot = snapshot.or(config.snapshot.clone());

    let view = TerminalView::new(std::io::stdout().is_terminal());
    let mut sync = match TimelineSynchronizer::new(&task_id, config.timeline.clone(), NoopView) {
        Ok(sync) => sync,
        Err(e) => {
            if matches!(e, SyncError::MissingTaskId) {
                println!("{}", view.format_banner(&Banner::missing_task_id()));
            }
            return Err(e.into());
        }
    };
    apply_snapshot(&mut sync, snapshot.as_deref()).await?;

    if let Some(events_path) = events {
        let content = tokio::fs::read_to_string(&events_path).await?;
        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match StatusUpdate::from_json_str(line) {
                Ok(update) => sync.on_status_event(update),
                Err(e) => tracing::warn!(line = i + 1, error = %e, "Skipping malformed event"),
            }
        }
    }

    println!("Task: {}\n", sync.task_id());
    for step in &sync.timeline().steps {
        println!("{}", view.format_step(step));
    }
    print_summary(sync.timeline());

    Ok(sync.overall() != OverallState::Fail)
}

fn validate(path: PathBuf) -> anyhow::Result<bool> {
    let config = load_config(&path)?;
    let timeline = &config.timeline;

    println!(
        "✓ {} is valid ({} steps, last step: {}, finish step: {})",
        path.display(),
        timeline.steps.len(),
        timeline.last_step().map(|s| s.id.as_str()).unwrap_or("-"),
        if timeline.has_finish_step() {
            timeline.finish_step.as_str()
        } else {
            "-"
        }
    );
    Ok(true)
}

fn print_summary(timeline: &Timeline) {
    let overall = timeline.overall();
    println!("\n=== Timeline ===\n");
    println!("Overall: {}", overall);
    if let Some(status) = overall.task_status() {
        println!("Task status: {}", status);
    }
    for step in &timeline.steps {
        println!("  {} {} ({})", step.presentation.icon, step.step_id, step.status);
    }
}
