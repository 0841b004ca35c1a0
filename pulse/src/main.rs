//! Casting Pulse CLI - Build a privacy-safe daily rollup from breakdown views
//!
//! # Main Commands
//!
//! ```bash
//! casting-pulse build --input views.csv --output pulse.csv   # Run the pipeline
//! casting-pulse build -i views.csv --format json --seed 7    # Reproducible JSON output
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! casting-pulse normalize --input views.csv     # Show normalized rows and drops
//! casting-pulse check-config pulse.json         # Validate a config file
//! casting-pulse example-config                  # Print the default config
//! casting-pulse score "A warm, funny lead"      # Score one description
//! ```
//!
//! Every flag can also come from a `PULSE_*` environment variable, and a
//! `.env` file in the working directory is loaded first.

use casting_pulse::{
    build_pulse_file, build_scorer, read_input_file, BuildOptions, Normalizer, OutputFormat,
    PulseConfig, SentimentScorer,
};
use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "casting-pulse")]
#[command(
    about = "Build the daily Casting Pulse table from breakdown view events",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: CSV → buckets → privacy filter → pulse table
    Build {
        /// Input CSV file
        #[arg(short, long, env = "PULSE_INPUT")]
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long, env = "PULSE_OUTPUT")]
        output: Option<PathBuf>,

        /// JSON config file
        #[arg(short, long, env = "PULSE_CONFIG")]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Csv, env = "PULSE_FORMAT")]
        format: OutputFormat,

        /// Override minimum_bucket_size
        #[arg(long, env = "PULSE_MIN_BUCKET_SIZE")]
        min_bucket_size: Option<i64>,

        /// Override laplace_noise_scale (0 disables noise)
        #[arg(long, env = "PULSE_NOISE_SCALE")]
        noise_scale: Option<f64>,

        /// Override noise_seed for a reproducible run
        #[arg(long, env = "PULSE_SEED")]
        seed: Option<u64>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,
    },

    /// Normalize a CSV and print rows with their bucket keys plus drop tallies
    Normalize {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON config file
        #[arg(short, long, env = "PULSE_CONFIG")]
        config: Option<PathBuf>,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,
    },

    /// Validate a config file and print the effective configuration
    CheckConfig {
        /// JSON config file
        config: PathBuf,
    },

    /// Show the default configuration
    ExampleConfig,

    /// Score one description with the configured scorer
    Score {
        /// Text to score
        text: String,

        /// JSON config file
        #[arg(short, long, env = "PULSE_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Build {
            input,
            output,
            config,
            format,
            min_bucket_size,
            noise_scale,
            seed,
            delimiter,
        } => {
            let overrides = Overrides {
                min_bucket_size,
                noise_scale,
                seed,
            };
            cmd_build(
                &input,
                output.as_deref(),
                config.as_deref(),
                overrides,
                BuildOptions { format, delimiter },
            )
        }

        Commands::Normalize {
            input,
            output,
            config,
            delimiter,
        } => cmd_normalize(&input, output.as_deref(), config.as_deref(), delimiter),

        Commands::CheckConfig { config } => cmd_check_config(&config),

        Commands::ExampleConfig => cmd_example_config(),

        Commands::Score { text, config } => cmd_score(&text, config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {}", cause);
            source = cause.source();
        }
        std::process::exit(1);
    }
}

/// Log to stderr so stdout stays free for the pulse table.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// CLI values that take precedence over the config file.
struct Overrides {
    min_bucket_size: Option<i64>,
    noise_scale: Option<f64>,
    seed: Option<u64>,
}

fn load_config(path: Option<&Path>) -> Result<PulseConfig, Box<dyn Error>> {
    match path {
        Some(p) => {
            tracing::info!(config = %p.display(), "loading config");
            Ok(PulseConfig::from_file(p)?)
        }
        None => Ok(PulseConfig::default()),
    }
}

fn cmd_build(
    input: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
    overrides: Overrides,
    options: BuildOptions,
) -> Result<(), Box<dyn Error>> {
    let mut config = load_config(config_path)?;
    if let Some(min) = overrides.min_bucket_size {
        config.minimum_bucket_size = min;
    }
    if let Some(scale) = overrides.noise_scale {
        config.laplace_noise_scale = scale;
    }
    if let Some(seed) = overrides.seed {
        config.noise_seed = Some(seed);
    }

    let report = build_pulse_file(input, output, &config, &options)?;
    let stats = &report.stats;

    eprintln!("   Input rows: {}", stats.input_rows);
    eprintln!(
        "   Dropped: {} (invalid date {}, unmapped region {}, malformed {})",
        stats.drops.total(),
        stats.drops.invalid_date,
        stats.drops.unmapped_region,
        stats.drops.malformed
    );
    eprintln!("   Buckets: {} ({} suppressed)", stats.buckets, stats.suppressed);
    if stats.scorer_failures > 0 {
        eprintln!("   Scorer failures: {}", stats.scorer_failures);
    }
    eprintln!("   Output rows: {}", report.records.len());
    if let Some(p) = output {
        eprintln!("   Written to: {}", p.display());
    }

    Ok(())
}

fn cmd_normalize(
    input: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
    delimiter: Option<char>,
) -> Result<(), Box<dyn Error>> {
    let config = load_config(config_path)?;
    let parsed = read_input_file(input, delimiter)?;

    let mut normalized = Normalizer::from_config(&config).normalize_all(&parsed.rows);
    normalized.drops.malformed = parsed.malformed;

    eprintln!("   Encoding: {}", parsed.encoding);
    eprintln!("   Columns: {}", parsed.headers.join(", "));
    eprintln!(
        "   Kept {} of {} rows",
        normalized.rows.len(),
        parsed.rows.len() + parsed.malformed
    );

    let json = serde_json::to_string_pretty(&normalized)?;
    write_output(&json, output)?;
    Ok(())
}

fn cmd_check_config(path: &Path) -> Result<(), Box<dyn Error>> {
    let config = PulseConfig::from_file(path)?;
    eprintln!("Config is valid: {}", path.display());
    println!("{}", config.to_json()?);
    Ok(())
}

fn cmd_example_config() -> Result<(), Box<dyn Error>> {
    println!("{}", PulseConfig::default().to_json()?);
    Ok(())
}

fn cmd_score(text: &str, config_path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let config = load_config(config_path)?;
    let scorer = build_scorer(&config.sentiment_scorer)?;
    let score = scorer.score(text)?;
    println!("{:.3}", score);
    Ok(())
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    match path {
        Some(p) => {
            std::fs::write(p, content)?;
            eprintln!("Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
