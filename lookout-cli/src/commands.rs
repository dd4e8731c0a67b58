use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};

use lookout_api::ApiState;
use lookout_config::LookoutConfig;
use lookout_detection::{CommandPipeline, PipelineInvoker};
use lookout_engine::{packet_source, CaptureSupervisor, LiveSettings};
use lookout_telemetry::{EventLogger, MetricsRecorder};

#[derive(Parser)]
#[command(name = "lookout", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the HTTP API (live capture control and one-shot analysis)
    Serve(ServeArgs),
    /// Run detection on a single .pcap/.pcapng/.csv file
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Configuration file; defaults to config/lookout.yaml plus LOOKOUT_* overrides.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Listen address, overriding `api.bind`.
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,
    /// Start the live capture loop immediately.
    #[arg(long)]
    pub live: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Capture or feature file to analyze.
    pub file: PathBuf,
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Where the prediction table is written, overriding `api.output_dir`.
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<LookoutConfig> {
    let config = match path {
        Some(path) => LookoutConfig::load_from_path(path),
        None => LookoutConfig::load(),
    };
    config.context("failed to load configuration")
}

fn init_logging(config: &LookoutConfig) {
    if let Err(e) = EventLogger::init(&config.telemetry.log_level, config.telemetry.thread_names) {
        eprintln!("logging already initialised: {e}");
    }
}

pub async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_ref())?;
    init_logging(&config);

    let bind = match args.bind {
        Some(bind) => bind,
        None => config
            .api
            .bind
            .parse()
            .with_context(|| format!("invalid api.bind `{}`", config.api.bind))?,
    };

    let metrics = Arc::new(MetricsRecorder::new().context("failed to register metrics")?);
    let pipeline: Arc<dyn PipelineInvoker> = Arc::new(CommandPipeline::from_config(&config.pipeline));
    let supervisor = Arc::new(
        CaptureSupervisor::new(
            packet_source(&config.capture),
            pipeline.clone(),
            LiveSettings::from_config(&config),
        )
        .with_metrics(metrics.clone()),
    );

    info!(
        interface = %config.capture.interface,
        mode = %config.capture.mode,
        window = ?config.capture.window(),
        "Lookout starting"
    );

    if args.live {
        supervisor.start()?;
    }

    let state = ApiState::new(supervisor.clone(), pipeline, metrics, &config.api);
    lookout_api::serve(state, bind, shutdown_signal())
        .await
        .context("HTTP server failed")?;

    supervisor.stop().await;
    info!("Lookout stopped");
    Ok(())
}

pub async fn analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_ref())?;
    init_logging(&config);

    let output_dir = args.output_dir.unwrap_or_else(|| config.api.output_dir.clone());
    let pipeline = CommandPipeline::from_config(&config.pipeline);
    let input = args.file.clone();

    let analysis = tokio::task::spawn_blocking(move || {
        lookout_engine::analyze(&pipeline, &input, &output_dir)
    })
    .await?
    .with_context(|| format!("analysis of {} failed", args.file.display()))?;

    let report = json!({
        "input": analysis.input.display().to_string(),
        "file_type": analysis.kind.as_str(),
        "output": analysis.output.display().to_string(),
        "total_flows": analysis.summary.flows,
        "summary": analysis.summary.summary,
        "attack_types": analysis.summary.attack_types,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
