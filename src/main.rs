use clap::{Parser, Subcommand};
use receipt_press::capability::{
    CapabilityLevel, CapabilityProvider, FixedCapability, SystemCapability,
};
use receipt_press::compress::{
    CompressionOutcome, CompressionReport, CompressionResult, Compressor,
};
use receipt_press::config::{self, ConfigError};
use receipt_press::imaging::codec::OUTPUT_SUFFIX;
use receipt_press::plan::CompressionPlan;
use receipt_press::progress::progress_stage_text;
use receipt_press::types::RawImage;
use receipt_press::validation::ValidationError;
use receipt_press::{output, validation};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

#[derive(Error, Debug)]
enum CliError {
    #[error("{}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Rejected(#[from] ValidationError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser)]
#[command(name = "receipt-press")]
#[command(about = "Adaptive receipt image compression")]
#[command(long_about = "\
Adaptive receipt image compression

Shrinks a receipt photo so it uploads quickly while staying legible. The
resolution bound and quality are picked from the file size and how capable
this machine is; files of 50 MB and more are compressed in two stages.

Size tiers (first match wins):
  >= 80 MB   600x900    quality 0.3   staged
  >= 50 MB   700x1000   quality 0.4   staged
  >= 20 MB   800x1200   quality 0.5
  otherwise  800x1200   quality 0.7

Low-capability machines get at most 600x900 and 0.2 lower quality;
high-capability machines get 0.1 higher quality.

If an image cannot be decoded or encoded, the original is written unchanged
and a notice is printed.

Run 'receipt-press gen-config' to generate a documented policy file.")]
#[command(version)]
struct Cli {
    /// Policy file (missing file = stock defaults)
    #[arg(long, default_value = "receipt-press.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Input file plus an optional MIME override.
#[derive(clap::Args, Clone)]
struct InputArgs {
    /// Receipt image (.jpg .jpeg .png .webp .heic .heif)
    input: PathBuf,

    /// Declared MIME type; inferred from the extension when omitted
    #[arg(long)]
    mime: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Validate and compress an image
    Compress {
        #[command(flatten)]
        input: InputArgs,

        /// Output file (default: derived name next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Force a capability level instead of probing this machine
        #[arg(long)]
        capability: Option<CapabilityLevel>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Do not print progress to stderr
        #[arg(long)]
        no_progress: bool,
    },
    /// Run the validation gate only
    Check {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Print detected hardware hints and the capability level
    Capability,
    /// Print a stock receipt-press.toml with all options documented
    GenConfig,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    input: &'a str,
    output: String,
    capability: CapabilityLevel,
    plan: &'a CompressionPlan,
    passes: usize,
    result: &'a CompressionResult,
    fallback: bool,
    advisory: Option<String>,
    warnings: Vec<String>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Errors are printed by `main`. A check that rejects its input has already
/// said so and returns a failure code instead.
fn run(cli: Cli) -> Result<ExitCode, CliError> {
    match cli.command {
        Command::Compress {
            input,
            output,
            capability,
            json,
            no_progress,
        } => {
            let policy = config::load_config(&cli.config)?;
            let raw = read_input(&input)?;
            let compressor = match capability {
                Some(level) => Compressor::with_provider(policy, &FixedCapability::Level(level)),
                None => Compressor::with_provider(policy, &SystemCapability),
            };

            let report = if no_progress || json {
                compressor.compress(&raw, None)?
            } else {
                let (tx, rx) = std::sync::mpsc::channel();
                let printer = std::thread::spawn(move || {
                    for percent in rx {
                        eprintln!("{percent:>3}% {}", progress_stage_text(percent));
                    }
                });
                let report = compressor.compress(&raw, Some(tx));
                printer.join().ok();
                report?
            };

            let dest = output.unwrap_or_else(|| {
                default_destination(&input.input, &default_output_name(&raw, &report))
            });
            std::fs::write(&dest, report.outcome.payload()).map_err(|source| {
                CliError::Write {
                    path: dest.clone(),
                    source,
                }
            })?;

            if json {
                print_json(&raw, &report, &dest)?;
            } else {
                output::print_report(&raw, &report);
                println!("    Output: {}", dest.display());
            }
        }
        Command::Check { input } => {
            let policy = config::load_config(&cli.config)?;
            let raw = read_input(&input)?;
            let outcome = validation::validate(&raw, &policy.validation);
            output::print_validation(&raw, &outcome);
            if outcome.error.is_some() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Capability => {
            let policy = config::load_config(&cli.config)?;
            let provider = SystemCapability;
            output::print_capability(provider.hints(), provider.level(&policy.capability));
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn read_input(args: &InputArgs) -> Result<RawImage, CliError> {
    RawImage::from_path(&args.input, args.mime.as_deref()).map_err(|source| CliError::Read {
        path: args.input.clone(),
        source,
    })
}

/// The encoded name, or `<stem>_compressed.<ext>` when the original is kept.
fn default_output_name(raw: &RawImage, report: &CompressionReport) -> String {
    match &report.outcome {
        CompressionOutcome::Compressed { image, .. } => image.name.clone(),
        CompressionOutcome::Fallback { .. } => match raw.name.rsplit_once('.') {
            Some((_, ext)) if !ext.is_empty() => format!("{}{OUTPUT_SUFFIX}.{ext}", raw.stem()),
            _ => format!("{}{OUTPUT_SUFFIX}", raw.stem()),
        },
    }
}

/// `name` in the same directory as `input`.
fn sibling(input: &Path, name: &str) -> PathBuf {
    input
        .parent()
        .map_or_else(|| PathBuf::from(name), |dir| dir.join(name))
}

/// `name` next to `input`, numbered (`_1`, `_2`, ...) while it would land on
/// the input itself. Compared ignoring ASCII case for case-insensitive disks.
fn default_destination(input: &Path, name: &str) -> PathBuf {
    let is_input = |p: &Path| {
        p.to_string_lossy()
            .eq_ignore_ascii_case(&input.to_string_lossy())
    };
    let dest = sibling(input, name);
    if !is_input(&dest) {
        return dest;
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{ext}")),
        None => (name, String::new()),
    };
    (1u32..)
        .map(|n| sibling(input, &format!("{stem}_{n}{ext}")))
        .find(|p| !is_input(p))
        .unwrap_or(dest)
}

fn print_json(raw: &RawImage, report: &CompressionReport, dest: &Path) -> Result<(), CliError> {
    let json = JsonReport {
        input: &raw.name,
        output: dest.display().to_string(),
        capability: report.capability,
        plan: &report.plan,
        passes: report.passes,
        result: report.outcome.result(),
        fallback: report.outcome.is_fallback(),
        advisory: report.outcome.advisory(),
        warnings: report.warnings.iter().map(ToString::to_string).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
