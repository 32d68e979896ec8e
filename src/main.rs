// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use hansard::app_config::{Config, LogLevel};
use hansard::database::{DatabaseConnection, HansardStore, Repository};
use hansard::events::EventBus;
use hansard::file_utils::FileManager;
use hansard::hansard::{
    House, ParsedTranscript, PartKind, StructuralErrorPolicy, TalkerList, extract_talkers, parse_transcript,
};
use hansard::ingest::Ingestor;

/// CLI Wrapper for House to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliHouse {
    Hor,
    Senate,
}

impl From<CliHouse> for House {
    fn from(cli_house: CliHouse) -> Self {
        match cli_house {
            CliHouse::Hor => House::Hor,
            CliHouse::Senate => House::Senate,
        }
    }
}

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse a transcript and print the segmentation without storing it
    Parse {
        /// Transcript XML file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print every part as JSON
        #[arg(long)]
        json: bool,

        /// Skip structurally broken speeches instead of failing
        #[arg(long)]
        skip_broken: bool,

        /// Write the output to a file instead of stdout
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Ingest a transcript file or every transcript in a folder
    Ingest {
        /// Transcript XML file or directory
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Re-ingest documents even if their content is unchanged
        #[arg(short, long)]
        force: bool,
    },

    /// Print a stored speech as a plain transcript
    Speech {
        /// Speech id, e.g. 2025-10-09_hor_main_3_1_none_0
        #[arg(value_name = "SPEECH_ID")]
        speech_id: String,
    },

    /// Show database statistics
    Stats,

    /// Generate shell completions for hansard
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// hansard - parliamentary transcript segmentation
///
/// Splits Hansard XML transcripts into speaker-attributed parts and stores
/// them in a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "hansard")]
#[command(version = "0.1.0")]
#[command(about = "Hansard transcript segmentation and ingestion")]
#[command(long_about = "hansard splits Hansard XML transcripts into speaker-attributed parts.

EXAMPLES:
    hansard parse hansard-2025-10-09.xml            # Summarise the segmentation
    hansard parse --json hansard-2025-10-09.xml     # Dump every part as JSON
    hansard parse --json -o parts.json hansard-2025-10-09.xml  # Write the parts to a file
    hansard --house senate ingest ./transcripts/    # Ingest a folder of Senate transcripts
    hansard speech 2025-10-09_hor_main_3_1_none_0   # Render a stored speech
    hansard stats                                   # Show what is stored
    hansard completions bash > hansard.bash         # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
    log_level: Option<CliLogLevel>,

    /// House the transcripts belong to
    #[arg(long, value_enum, global = true)]
    house: Option<CliHouse>,

    /// SQLite database path
    #[arg(short, long, global = true, env = "HANSARD_DATABASE")]
    database: Option<PathBuf>,
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

    // @returns: Emoji for log level
    fn get_emoji_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "❌ ",
            Level::Warn => "🚧 ",
            Level::Info => " ",
            Level::Debug => "🔍 ",
            Level::Trace => "📋 ",
        }
    }

    // @returns: ANSI colour for log level
    fn get_color_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "1;31",
            Level::Warn => "1;33",
            Level::Info => "1;32",
            Level::Debug => "1;36",
            Level::Trace => "1;35",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let level = record.level();

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                Self::get_color_for_level(level),
                now,
                Self::get_emoji_for_level(level),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Everything is allowed through the logger; the max level does the filtering
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "hansard", &mut std::io::stdout());
        return Ok(());
    }

    if let Some(level) = &cli.log_level {
        log::set_max_level(LogLevel::from(level.clone()).to_level_filter());
    }

    let config = load_config(&cli)?;

    if cli.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    match cli.command {
        Commands::Parse {
            file,
            json,
            skip_broken,
            output,
        } => run_parse(&config, file, json, skip_broken, output),
        Commands::Ingest { path, force } => run_ingest(config, path, force).await,
        Commands::Speech { speech_id } => run_speech(&config, &speech_id).await,
        Commands::Stats => run_stats(&config),
        Commands::Completions { .. } => Ok(()),
    }
}

/// Load or create the configuration file and apply command line overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config_path)?;

    if let Some(house) = &cli.house {
        config.house = house.clone().into();
    }
    if let Some(database) = &cli.database {
        config.storage.database_path = Some(database.to_string_lossy().to_string());
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

fn open_repository(config: &Config) -> Result<Repository> {
    let db_path = config.storage.resolved_database_path()?;
    let db = DatabaseConnection::new(&db_path)?;
    Ok(Repository::new(db))
}

fn run_parse(config: &Config, file: PathBuf, json: bool, skip_broken: bool, output: Option<PathBuf>) -> Result<()> {
    let content = FileManager::read_to_string(&file)?;
    let policy = if skip_broken {
        StructuralErrorPolicy::SkipSpeech
    } else {
        config.ingest.on_structural_error
    };

    let transcript = parse_transcript(&content, config.house, policy)
        .with_context(|| format!("Failed to parse transcript {:?}", file))?;

    let rendered = if json {
        serde_json::to_string_pretty(&transcript.parts).context("Failed to serialize parts to JSON")?
    } else {
        let document = roxmltree::Document::parse(&content)?;
        let talkers = TalkerList::new(extract_talkers(&document));
        summarize(&transcript, &talkers)
    };

    match output {
        Some(path) => {
            FileManager::write_to_file(&path, &rendered)?;
            info!("Wrote {} parts to {:?}", transcript.parts.len(), path);
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn summarize(transcript: &ParsedTranscript, talkers: &TalkerList) -> String {
    let procedural = transcript
        .parts
        .iter()
        .filter(|p| p.kind() == PartKind::FirstReading)
        .count();

    let mut lines = vec![
        format!("Sitting:           {} ({})", transcript.date, transcript.house),
        format!("Parts:             {}", transcript.parts.len()),
        format!("  speech parts:    {}", transcript.speech_part_count()),
        format!("  first readings:  {}", procedural),
        format!("Speeches:          {}", transcript.speech_ids.len()),
        format!("Talkers:           {}", talkers.len()),
    ];
    if !transcript.rejected_speeches.is_empty() {
        lines.push(format!("Rejected speeches: {}", transcript.rejected_speeches.len()));
        for rejected in &transcript.rejected_speeches {
            lines.push(format!("  {}: {}", rejected.location, rejected.reason));
        }
    }
    lines.join("\n")
}

async fn run_ingest(config: Config, path: PathBuf, force: bool) -> Result<()> {
    let store: Arc<dyn HansardStore> = Arc::new(open_repository(&config)?);
    let events = EventBus::new(config.ingest.event_capacity);

    let mut ingest_config = config.ingest.clone();
    if force {
        ingest_config.skip_unchanged = false;
    }
    let ingestor = Ingestor::new(store, events, ingest_config);

    if path.is_file() {
        let report = ingestor.ingest_many(config.house, std::slice::from_ref(&path)).await?;
        if let Some((_, e)) = report.failed.first() {
            return Err(anyhow!("Failed to ingest {:?}: {}", path, e));
        }
        info!("Success: {} parts across {} speeches", report.part_count, report.speech_ids.len());
    } else if path.is_dir() {
        let report = ingestor.ingest_folder(config.house, &path).await?;
        if !report.failed.is_empty() {
            warn!("{} transcript(s) failed to ingest", report.failed.len());
        }
    } else {
        return Err(anyhow!("Input path does not exist: {:?}", path));
    }

    Ok(())
}

async fn run_speech(config: &Config, speech_id: &str) -> Result<()> {
    let repo = open_repository(config)?;

    let Some(speech) = repo.load_speech(speech_id).await? else {
        return Err(anyhow!("No speech found with id {}", speech_id));
    };
    let talkers = repo.list_talkers().await?;

    print!("{}", speech.to_transcript(&talkers));
    Ok(())
}

fn run_stats(config: &Config) -> Result<()> {
    let repo = open_repository(config)?;
    let stats = repo.stats()?;
    println!("{}", stats);
    Ok(())
}
