use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};

use ridelens::analysis::summary::format_one_decimal;
use ridelens::config::AppConfig;
use ridelens::export::{self, ExportFormat};
use ridelens::import::parallel::{ParallelAnalysisConfig, ParallelAnalyzer};
use ridelens::import::{LengthUnit, SpeedUnit, TemperatureUnit};
use ridelens::logging::{init_logging, LogFormat, LogLevel};
use ridelens::{DecodeConfig, RideAnalyzer};

/// ridelens - FIT ride analysis CLI
///
/// Decodes cycling FIT files and reports device metadata, session and lap
/// summaries, and heart rate zones and drift.
#[derive(Parser)]
#[command(name = "ridelens")]
#[command(version)]
#[command(about = "FIT ride analysis CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Log output format (pretty, json, compact)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single FIT file
    Analyze {
        /// FIT file to analyze
        file: PathBuf,

        /// Output format (json, text)
        #[arg(short = 'f', long)]
        format: Option<String>,

        /// Write the result to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Speed unit (m/s, km/h, mph)
        #[arg(long)]
        speed_unit: Option<SpeedUnit>,

        /// Length unit (m, km, mi)
        #[arg(long)]
        length_unit: Option<LengthUnit>,

        /// Temperature unit (celsius, fahrenheit, kelvin)
        #[arg(long)]
        temperature_unit: Option<TemperatureUnit>,

        /// Reject files whose CRCs do not match
        #[arg(long)]
        strict: bool,
    },

    /// Analyze every FIT file in a directory
    Batch {
        /// Directory containing FIT files
        dir: PathBuf,

        /// Number of worker threads
        #[arg(short, long)]
        threads: Option<usize>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Show or create the configuration file
    Config {
        /// Print the effective configuration
        #[arg(long, conflicts_with = "init")]
        show: bool,

        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;

    if cli.verbose > 0 {
        config.logging.level = LogLevel::from_verbosity(cli.verbose);
    }
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }
    init_logging(&config.logging)?;

    match cli.command {
        Commands::Analyze {
            file,
            format,
            output,
            speed_unit,
            length_unit,
            temperature_unit,
            strict,
        } => {
            let mut decode = config.decode;
            if let Some(unit) = speed_unit {
                decode.speed_unit = unit;
            }
            if let Some(unit) = length_unit {
                decode.length_unit = unit;
            }
            if let Some(unit) = temperature_unit {
                decode.temperature_unit = unit;
            }
            if strict {
                decode.force = false;
            }

            let format = match format {
                Some(name) => ExportFormat::from_str(&name)?,
                None => output
                    .as_deref()
                    .and_then(ExportFormat::from_path)
                    .unwrap_or(config.export.default_format),
            };

            run_analyze(&file, format, output.as_deref(), decode)?;
        }

        Commands::Batch {
            dir,
            threads,
            no_progress,
        } => {
            let parallel = ParallelAnalysisConfig {
                num_threads: threads.or(config.batch.num_threads),
                show_progress: config.batch.show_progress && !no_progress,
            };
            run_batch(&dir, config.decode, parallel)?;
        }

        Commands::Config { show, init } => {
            let path = cli.config.clone().unwrap_or_else(AppConfig::default_config_path);
            if init {
                if path.exists() {
                    anyhow::bail!("Config file already exists: {}", path.display());
                }
                AppConfig::default().save_to_file(&path)?;
                println!("{} {}", "✓ Wrote default configuration to".green(), path.display());
            } else {
                if show {
                    println!("{}", format!("# {}", path.display()).dimmed());
                }
                print!("{}", config.to_toml_string()?);
            }
        }
    }

    Ok(())
}

fn run_analyze(file: &Path, format: ExportFormat, output: Option<&Path>, decode: DecodeConfig) -> Result<()> {
    let analyzer = RideAnalyzer::new(decode);
    let analysis = match analyzer.analyze_file(file) {
        Ok(analysis) => analysis,
        Err(e) => {
            if e.severity().to_tracing_level() == tracing::Level::WARN {
                tracing::warn!(error = %e, "Analysis failed");
            } else {
                tracing::error!(error = %e, severity = ?e.severity(), "Analysis failed");
            }
            if e.is_decode_failure() && !decode.force {
                anyhow::bail!("{} CRC checks are on; rerun without --strict to skip them.", e.user_message());
            }
            anyhow::bail!(e.user_message());
        }
    };

    match output {
        Some(path) => {
            export::export_analysis(&analysis, format, &decode, path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("{} {}", "✓ Analysis written to".green(), path.display());
        }
        None => println!("{}", export::render_analysis(&analysis, format, &decode)?),
    }

    Ok(())
}

fn run_batch(dir: &Path, decode: DecodeConfig, parallel: ParallelAnalysisConfig) -> Result<()> {
    let analyzer = ParallelAnalyzer::with_config(decode, parallel);
    let summary = analyzer
        .analyze_directory(dir)
        .with_context(|| format!("Failed to analyze directory {}", dir.display()))?;

    for result in &summary.results {
        let name = result
            .file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| result.file_path.display().to_string());

        match (&result.analysis, &result.error) {
            (Some(analysis), _) => {
                let distance = analysis.session.as_ref().and_then(|s| s.total_distance);
                let heart_rate = analysis
                    .heart_rate
                    .as_ref()
                    .map(|hr| format!("avg {} bpm, drift {}%", hr.avg, hr.drift))
                    .unwrap_or_else(|| "no heart rate".to_string());
                println!(
                    "{} {}: {} {}, {}",
                    "✓".green(),
                    name,
                    format_one_decimal(distance),
                    decode.length_unit.label(),
                    heart_rate
                );
            }
            (None, error) => {
                println!("{} {}: {}", "✗".red(), name, error.as_deref().unwrap_or("unknown error"));
            }
        }
    }

    println!();
    println!("{}", summary.to_string_pretty().bold());

    if !summary.is_fully_successful() {
        eprintln!(
            "{}",
            format!("{} of {} files failed", summary.failed_files, summary.total_files).yellow()
        );
    }

    Ok(())
}
