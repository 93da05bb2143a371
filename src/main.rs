// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use app_controller::Controller;

mod app_config;
mod app_controller;
mod errors;
mod file_utils;
mod glossary;
mod language_utils;
mod providers;
mod qa;
mod splitting;

/// CLI wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn to_level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split a manuscript into episode records
    Split {
        /// Manuscript text file
        #[arg(value_name = "INPUT_FILE")]
        input_file: PathBuf,

        /// Series directory for pipeline artifacts
        #[arg(short, long, value_name = "SERIES_DIR")]
        series_dir: PathBuf,
    },

    /// Build per-language glossaries from split episodes
    Glossary {
        /// Series directory
        #[arg(value_name = "SERIES_DIR")]
        series_dir: PathBuf,
    },

    /// Translate split episodes into every configured target language
    Translate {
        /// Series directory
        #[arg(value_name = "SERIES_DIR")]
        series_dir: PathBuf,
    },

    /// Validate translated episodes and write the QA report
    Qa {
        /// Series directory
        #[arg(value_name = "SERIES_DIR")]
        series_dir: PathBuf,
    },

    /// Run the full pipeline: split, glossary, translate, QA
    Run {
        /// Manuscript text file
        #[arg(value_name = "INPUT_FILE")]
        input_file: PathBuf,

        /// Series directory for pipeline artifacts
        #[arg(short, long, value_name = "SERIES_DIR")]
        series_dir: PathBuf,
    },

    /// Generate shell completions for seriloc
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// SeriLoc - web-novel localization pipeline
///
/// Splits merged manuscripts into episodes, builds glossaries for
/// terminology consistency, translates with an LLM backend and validates
/// the result.
#[derive(Parser, Debug)]
#[command(name = "seriloc")]
#[command(version = "0.3.0")]
#[command(about = "AI-powered web-novel localization pipeline")]
#[command(long_about = "SeriLoc splits merged web-novel manuscripts into episodes, builds
per-language glossaries for terminology consistency, translates episode
bodies and validates the translations.

EXAMPLES:
    seriloc split novel.txt -s ./my-series       # Split into episodes
    seriloc glossary ./my-series                 # Build glossaries
    seriloc translate ./my-series                # Translate episodes
    seriloc qa ./my-series                       # Validate translations
    seriloc run novel.txt -s ./my-series         # Full pipeline
    seriloc completions bash > seriloc.bash      # Shell completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a
    different config file with --config. If the config file doesn't exist,
    a default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color code for log level
    fn color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S%.3f");
            let color = Self::color_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Load the config file, creating a default one when missing
fn load_config(config_path: &str, log_level: Option<CliLogLevel>) -> Result<Config> {
    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    if let Some(level) = log_level {
        config.log_level = level.into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default; the level is
    // updated after loading the config
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "seriloc", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli.config_path, cli.log_level)?;
    log::set_max_level(to_level_filter(&config.log_level));

    let controller = Controller::with_config(config)?;

    match cli.command {
        Commands::Split { input_file, series_dir } => {
            if !input_file.is_file() {
                return Err(anyhow!("Input file does not exist: {:?}", input_file));
            }
            let count = controller.run_split(&input_file, &series_dir).await?;
            log::info!("Done: {} episodes written", count);
        }
        Commands::Glossary { series_dir } => {
            controller.run_glossary(&series_dir).await?;
        }
        Commands::Translate { series_dir } => {
            controller.run_translate(&series_dir).await?;
        }
        Commands::Qa { series_dir } => {
            let report = controller.run_qa(&series_dir).await?;
            println!("{}", report.to_text_summary());
            if !report.passed() {
                std::process::exit(1);
            }
        }
        Commands::Run { input_file, series_dir } => {
            if !input_file.is_file() {
                return Err(anyhow!("Input file does not exist: {:?}", input_file));
            }
            let report = controller.run_pipeline(&input_file, &series_dir).await?;
            println!("{}", report.to_text_summary());
            if !report.passed() {
                std::process::exit(1);
            }
        }
        Commands::Completions { .. } => unreachable!(),
    }

    Ok(())
}
