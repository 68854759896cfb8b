//! epflux CLI - Command-line interface for episode-flux
//!
//! Commands:
//! - plot: Render the 3x2 metrics chart for a record file
//! - summary: Print the headline numbers of a run
//! - export: Write the aligned and smoothed series as JSON or CSV

use clap::{Parser, Subcommand, ValueEnum};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tracing::info;
use tracing_subscriber::EnvFilter;

use episode_flux::render::base_name_for;
use episode_flux::{
    BundleEncoder, ChartRenderer, Config, ImageFormat, MetricsBundle, MetricsError,
    MetricsPipeline, RecordReader, RunSummary, FLUX_VERSION,
};

/// epflux - Smoothed training curves from per-episode metrics
#[derive(Parser)]
#[command(name = "epflux")]
#[command(author = "Synheart AI Inc")]
#[command(version = FLUX_VERSION)]
#[command(about = "Align, smooth and plot per-episode training metrics", long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the metrics chart grid
    Plot {
        /// Metrics CSV (episode,reward,cumulative_goals,success_rate,training_loss,steps)
        input: PathBuf,

        /// Directory for the chart image
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Image format
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Smoothing window in episodes
        #[arg(long)]
        window: Option<usize>,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the headline numbers of a run
    Summary {
        /// Metrics CSV
        input: PathBuf,

        /// Smoothing window in episodes
        #[arg(long)]
        window: Option<usize>,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Export aligned and smoothed series
    Export {
        /// Metrics CSV
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long)]
        output: PathBuf,

        /// Export format
        #[arg(long, default_value = "json")]
        format: ExportFormat,

        /// Smoothing window in episodes
        #[arg(long)]
        window: Option<usize>,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Raster image
    Png,
    /// Vector image
    Svg,
}

impl From<FormatArg> for ImageFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Png => ImageFormat::Png,
            FormatArg::Svg => ImageFormat::Svg,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum ExportFormat {
    /// Pretty-printed JSON with summary and metadata
    Json,
    /// One row per episode
    Csv,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), EpfluxCliError> {
    match cli.command {
        Commands::Plot {
            input,
            output_dir,
            format,
            window,
            config,
        } => {
            let mut config = load_config(config.as_deref(), window)?;
            if let Some(dir) = output_dir {
                config.render.output_dir = dir;
            }
            if let Some(format) = format {
                config.render.format = format.into();
            }
            cmd_plot(&input, &config)
        }

        Commands::Summary {
            input,
            window,
            config,
            json,
        } => {
            let config = load_config(config.as_deref(), window)?;
            cmd_summary(&input, &config, json)
        }

        Commands::Export {
            input,
            output,
            format,
            window,
            config,
        } => {
            let config = load_config(config.as_deref(), window)?;
            cmd_export(&input, &output, format, &config)
        }
    }
}

/// Configuration file (or defaults) with the CLI window override applied
fn load_config(path: Option<&Path>, window: Option<usize>) -> Result<Config, EpfluxCliError> {
    let mut config = match path {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    if let Some(window) = window {
        config.pipeline.window = window;
    }
    config.validate()?;
    Ok(config)
}

fn build_bundle(input: &Path, config: &Config) -> Result<MetricsBundle, EpfluxCliError> {
    let records = RecordReader::from_path(input)?;
    Ok(MetricsPipeline::new(config.pipeline.clone()).build(&records))
}

fn cmd_plot(input: &Path, config: &Config) -> Result<(), EpfluxCliError> {
    let bundle = build_bundle(input, config)?;
    let renderer = ChartRenderer::new(config.render.clone());
    let path = renderer.render(&bundle, &base_name_for(input))?;

    println!("[INFO] Saved plot: {}", path.display());
    Ok(())
}

fn cmd_summary(input: &Path, config: &Config, json: bool) -> Result<(), EpfluxCliError> {
    let bundle = build_bundle(input, config)?;
    let summary = RunSummary::from_bundle(&bundle);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Run Summary: {}", input.display());
        println!("=============");
        println!("{}", summary.to_text());
    }
    Ok(())
}

fn cmd_export(
    input: &Path,
    output: &Path,
    format: ExportFormat,
    config: &Config,
) -> Result<(), EpfluxCliError> {
    let bundle = build_bundle(input, config)?;
    let to_stdout = output.to_string_lossy() == "-";

    match format {
        ExportFormat::Json => {
            let json = BundleEncoder::encode_to_json(&bundle)?;
            if to_stdout {
                println!("{}", json);
            } else {
                fs::write(output, json)?;
            }
        }
        ExportFormat::Csv => {
            if to_stdout {
                let stdout = io::stdout();
                BundleEncoder::write_csv(&bundle, stdout.lock())?;
            } else {
                BundleEncoder::write_csv(&bundle, File::create(output)?)?;
            }
        }
    }

    if !to_stdout {
        info!(path = %output.display(), episodes = bundle.len(), "wrote export");
    }
    io::stdout().flush()?;
    Ok(())
}

// Error types

#[derive(Debug)]
enum EpfluxCliError {
    Io(io::Error),
    Metrics(MetricsError),
    Json(serde_json::Error),
}

impl From<io::Error> for EpfluxCliError {
    fn from(e: io::Error) -> Self {
        EpfluxCliError::Io(e)
    }
}

impl From<MetricsError> for EpfluxCliError {
    fn from(e: MetricsError) -> Self {
        EpfluxCliError::Metrics(e)
    }
}

impl From<serde_json::Error> for EpfluxCliError {
    fn from(e: serde_json::Error) -> Self {
        EpfluxCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<EpfluxCliError> for CliError {
    fn from(e: EpfluxCliError) -> Self {
        match e {
            EpfluxCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            EpfluxCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            EpfluxCliError::Metrics(e) => {
                let (code, hint) = match &e {
                    MetricsError::NotFound(_) => ("NOT_FOUND", "Check the input path"),
                    MetricsError::MalformedRecord { .. } => (
                        "MALFORMED_RECORD",
                        "Input must be CSV with a header row",
                    ),
                    MetricsError::Io(_) => ("IO_ERROR", "Check file paths and permissions"),
                    MetricsError::JsonError(_) => ("JSON_ERROR", "Check configuration JSON syntax"),
                    MetricsError::InvalidConfig(_) => ("INVALID_CONFIG", "Fix the configuration value"),
                    MetricsError::RenderError(_) => ("RENDER_ERROR", "Try --format svg"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
        }
    }
}
