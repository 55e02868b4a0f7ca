//! svgforge command-line interface
//!
//! Runs the HTTP service, converts single files, or sweeps storage once.

use super::config::CliConfigBuilder;
use crate::{
    processor::ConversionPipeline,
    services::Janitor,
    tracing_config::{TracingConfig, TracingFormat},
    types::{ProcessingMode, ProcessingRequest},
};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

#[cfg(feature = "tracing-files")]
use crate::tracing_config::TracingOutput;

/// Raster to SVG conversion service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "svgforge")]
pub struct Cli {
    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log without colors (for CI and containers)
    #[arg(long, global = true)]
    pub plain_logs: bool,

    /// Log as JSON lines
    #[cfg(feature = "tracing-json")]
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Write logs to this file instead of stderr
    #[cfg(feature = "tracing-files")]
    #[arg(long, global = true, env = "SVGFORGE_LOG_FILE", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// JSON configuration file; flags override its values
    #[arg(long, global = true, env = "SVGFORGE_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the input/, output/ and temp/ storage folders
    #[arg(long, global = true, env = "SVGFORGE_STORAGE_ROOT", value_name = "DIR")]
    pub storage_root: Option<PathBuf>,

    #[command(flatten)]
    pub tools: ToolArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// External tool command lines (split on whitespace)
#[derive(Args, Debug, Default)]
pub struct ToolArgs {
    /// potrace command
    #[arg(long, global = true, env = "SVGFORGE_POTRACE", value_name = "CMD")]
    pub potrace: Option<String>,

    /// vtracer command
    #[arg(long, global = true, env = "SVGFORGE_VTRACER", value_name = "CMD")]
    pub vtracer: Option<String>,

    /// rembg command, e.g. "python3 -m rembg"
    #[arg(long, global = true, env = "SVGFORGE_REMBG", value_name = "CMD")]
    pub rembg: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP service
    Serve(ServeArgs),
    /// Convert one image file to SVG
    Convert(ConvertArgs),
    /// Delete stored files older than the maximum age, once
    Sweep,
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "SVGFORGE_BIND")]
    pub bind: Option<String>,

    /// Age in seconds after which stored files are deleted
    #[arg(long)]
    pub max_age_secs: Option<u64>,

    /// Seconds between storage sweeps
    #[arg(long)]
    pub sweep_interval_secs: Option<u64>,

    /// Maximum upload size in bytes
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input image (png, jpg, jpeg, webp)
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Where to write the SVG [default: the storage output directory]
    #[arg(short, long, value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Conversion mode
    #[arg(short, long, value_enum, default_value_t = CliMode::Color)]
    pub mode: CliMode,

    /// Number of colors (2-32, color mode)
    #[arg(long, default_value_t = 8)]
    pub colors: i64,

    /// Detail level (1-10, color mode)
    #[arg(long, default_value_t = 5)]
    pub detail: i64,

    /// Threshold (0-100): binarization cut in bw mode, background removal
    /// aggressiveness in color mode [default: 50 bw, 20 color]
    #[arg(long)]
    pub threshold: Option<i64>,

    /// Remove the background before tracing
    #[arg(long)]
    pub remove_bg: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum CliMode {
    Bw,
    Color,
}

impl From<CliMode> for ProcessingMode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Bw => Self::BlackWhite,
            CliMode::Color => Self::Color,
        }
    }
}

impl ConvertArgs {
    /// Processing request for these arguments
    #[must_use]
    pub fn to_request(&self) -> ProcessingRequest {
        let mode = ProcessingMode::from(self.mode);
        let mut request = ProcessingRequest::new(mode)
            .with_colors(self.colors)
            .with_detail(self.detail)
            .with_background_removal(self.remove_bg);
        if let Some(threshold) = self.threshold {
            request = request.with_threshold(threshold);
        }
        request
    }
}

pub async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(&cli).context("Failed to initialize tracing")?;

    let config = CliConfigBuilder::from_cli(&cli).context("Invalid configuration")?;
    debug!(?config, "Resolved configuration");

    match &cli.command {
        Command::Serve(_) => {
            info!("Starting svgforge on {}", config.server.bind);
            crate::server::serve(config).await.context("Server failed")?;
        },
        Command::Convert(args) => {
            let request = args.to_request();
            let input = args.input.clone();
            let output = args.output.clone();
            let written = tokio::task::spawn_blocking(move || -> Result<PathBuf> {
                let pipeline =
                    ConversionPipeline::new(&config).context("Failed to set up pipeline")?;
                let artifact = pipeline
                    .convert_file(&input, &request)
                    .with_context(|| format!("Failed to convert {}", input.display()))?;
                match output {
                    Some(target) => move_artifact(&artifact.path, &target),
                    None => Ok(artifact.path),
                }
            })
            .await
            .context("Conversion task panicked")??;
            println!("{}", written.display());
        },
        Command::Sweep => {
            let janitor = Arc::new(Janitor::new(&config.storage));
            let report = tokio::task::spawn_blocking(move || janitor.sweep())
                .await
                .context("Sweep task panicked")?;
            info!(
                deleted = report.deleted,
                skipped = report.skipped,
                failed = report.failed,
                "Sweep finished"
            );
            println!(
                "deleted {} file(s), {} skipped, {} failed",
                report.deleted, report.skipped, report.failed
            );
        },
    }

    Ok(())
}

/// Move a finished SVG out of the output directory
fn move_artifact(from: &Path, to: &Path) -> Result<PathBuf> {
    if let Some(parent) = to.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    if std::fs::rename(from, to).is_err() {
        // rename fails across filesystems
        std::fs::copy(from, to)
            .with_context(|| format!("Failed to write {}", to.display()))?;
        std::fs::remove_file(from)
            .with_context(|| format!("Failed to remove {}", from.display()))?;
    }
    Ok(to.to_path_buf())
}

fn init_tracing(cli: &Cli) -> Result<crate::tracing_config::TracingGuard> {
    tracing_config_for(cli).init()
}

/// Subscriber settings derived from the global logging flags
fn tracing_config_for(cli: &Cli) -> TracingConfig {
    let format = if cli.plain_logs {
        TracingFormat::Compact
    } else {
        TracingFormat::Console
    };
    #[cfg(feature = "tracing-json")]
    let format = if cli.json_logs {
        TracingFormat::Json
    } else {
        format
    };

    let mut config = TracingConfig::new()
        .with_verbosity(cli.verbose)
        .with_format(format);
    if let Ok(filter) = std::env::var("RUST_LOG") {
        if !filter.trim().is_empty() {
            config = config.with_env_filter(filter);
        }
    }
    #[cfg(feature = "tracing-files")]
    let config = match &cli.log_file {
        Some(path) => config.with_output(TracingOutput::File(path.clone())),
        None => config,
    };
    config
}
