// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]
// Add other lints specific to this module that you want to allow but not auto-fix

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, warn};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use crate::app_config::{Config, SynthesisProvider};
use app_controller::Controller;
use playback::PlayScope;

mod app_config;
mod app_controller;
mod audio;
mod cancellation;
mod errors;
mod markup;
mod playback;
mod render;
mod synth;
mod timeline;
mod timing;
mod voice;

/// CLI Wrapper for SynthesisProvider to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliSynthesisProvider {
    Http,
    Mock,
}

impl From<CliSynthesisProvider> for SynthesisProvider {
    fn from(cli_provider: CliSynthesisProvider) -> Self {
        match cli_provider {
            CliSynthesisProvider::Http => SynthesisProvider::Http,
            CliSynthesisProvider::Mock => SynthesisProvider::Mock,
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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Preview a timeline with synthesized voiceover (default command)
    #[command(alias = "play")]
    Preview(PreviewArgs),

    /// Fill the voice cache without playing anything
    Synthesize(SynthesizeArgs),

    /// Print the timing table for a timeline
    Inspect(InspectArgs),

    /// Generate shell completions for scenecast
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    /// Timeline JSON document to preview
    #[arg(value_name = "TIMELINE")]
    timeline_path: PathBuf,

    /// Play a single scene by index
    #[arg(short = 'n', long, conflicts_with = "group")]
    scene: Option<usize>,

    /// Play the first contiguous run of this group id
    #[arg(short, long)]
    group: Option<u32>,

    /// Start offset in seconds
    #[arg(long, default_value_t = 0.0)]
    from: f64,

    /// Synthesis provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliSynthesisProvider>,

    /// Model name to use for synthesis
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Parser, Debug)]
struct SynthesizeArgs {
    /// Timeline JSON document to synthesize voices for
    #[arg(value_name = "TIMELINE")]
    timeline_path: PathBuf,

    /// Regenerate audio for parts that are already cached
    #[arg(short, long)]
    force: bool,

    /// Synthesis provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliSynthesisProvider>,

    /// Model name to use for synthesis
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Timeline JSON document to inspect
    #[arg(value_name = "TIMELINE")]
    timeline_path: PathBuf,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Scenecast - scene timeline preview with AI voiceover
///
/// A timeline playback tool that synthesizes voiceover for scene scripts
/// and previews them with synchronized subtitles, transitions and audio.
#[derive(Parser, Debug)]
#[command(name = "scenecast")]
#[command(author = "Scenecast Team")]
#[command(version = "1.0.0")]
#[command(about = "Scene timeline preview with AI voiceover")]
#[command(long_about = "Scenecast synthesizes voiceover for scene timelines and plays them back
with synchronized subtitles, images and transitions.

EXAMPLES:
    scenecast timeline.json                      # Preview the full timeline
    scenecast -n 3 timeline.json                 # Preview scene 3 only
    scenecast -g 2 timeline.json                 # Preview one scene group
    scenecast --from 12.5 timeline.json          # Start 12.5 seconds in
    scenecast synthesize timeline.json           # Fill the voice cache only
    scenecast synthesize -f timeline.json        # Regenerate all voice audio
    scenecast inspect timeline.json              # Print the timing table
    scenecast --log-level debug timeline.json    # Preview with debug logging
    scenecast completions bash > scenecast.bash  # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config. If the config file doesn't exist, a default one
    will be created automatically.

SUPPORTED PROVIDERS:
    http - OpenAI-compatible speech endpoint (API key optional)
    mock - Deterministic in-process synthesizer, no network needed")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Timeline JSON document to preview
    #[arg(value_name = "TIMELINE")]
    timeline_path: Option<PathBuf>,

    /// Play a single scene by index
    #[arg(short = 'n', long, conflicts_with = "group")]
    scene: Option<usize>,

    /// Play the first contiguous run of this group id
    #[arg(short, long)]
    group: Option<u32>,

    /// Start offset in seconds
    #[arg(long, default_value_t = 0.0)]
    from: f64,

    /// Synthesis provider to use
    #[arg(short, long, value_enum)]
    provider: Option<CliSynthesisProvider>,

    /// Model name to use for synthesis
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
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
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");

            let mut stderr = std::io::stderr();
            let _ = match record.level() {
                Level::Error => {
                    let emoji = Self::get_emoji_for_level(record.level());
                    writeln!(
                        stderr,
                        "\x1B[1;31m{} {} {}\x1B[0m",
                        now, emoji, record.args()
                    )
                },
                Level::Warn => {
                    let emoji = Self::get_emoji_for_level(record.level());
                    writeln!(
                        stderr,
                        "\x1B[1;33m{} {} {}\x1B[0m",
                        now, emoji, record.args()
                    )
                },
                Level::Info => {
                    let emoji = Self::get_emoji_for_level(record.level());
                    writeln!(
                        stderr,
                        "\x1B[1;32m{} {} {}\x1B[0m",
                        now, emoji, record.args()
                    )
                },
                Level::Debug => {
                    let emoji = Self::get_emoji_for_level(record.level());
                    writeln!(
                        stderr,
                        "\x1B[1;36m{} {} {}\x1B[0m",
                        now, emoji, record.args()
                    )
                },
                Level::Trace => {
                    let emoji = Self::get_emoji_for_level(record.level());
                    writeln!(
                        stderr,
                        "\x1B[1;35m{} {} {}\x1B[0m",
                        now, emoji, record.args()
                    )
                },
            };
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    // Parse command line arguments using clap
    let cli = CommandLineOptions::parse();

    // Handle subcommands
    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "scenecast", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Preview(args)) => run_preview(args).await,
        Some(Commands::Synthesize(args)) => run_synthesize(args).await,
        Some(Commands::Inspect(args)) => run_inspect(args).await,
        None => {
            // Default behavior - use top-level args for backwards compatibility
            let timeline_path = cli
                .timeline_path
                .ok_or_else(|| anyhow!("TIMELINE is required when no subcommand is specified"))?;

            let preview_args = PreviewArgs {
                timeline_path,
                scene: cli.scene,
                group: cli.group,
                from: cli.from,
                provider: cli.provider,
                model: cli.model,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_preview(preview_args).await
        }
    }
}

/// Load the config file, creating a default one when missing, and apply
/// CLI overrides on top.
fn load_config(
    config_path: &str,
    provider: &Option<CliSynthesisProvider>,
    model: &Option<String>,
    log_level: &Option<CliLogLevel>,
) -> Result<Config> {
    let config = if Path::new(config_path).exists() {
        // Load existing configuration
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;

        let reader = BufReader::new(file);
        let mut config: Config = serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?;

        // Override config with CLI options if provided
        if let Some(provider) = provider {
            config.synthesis.provider = provider.clone().into();
        }

        if let Some(model) = model {
            config.synthesis.model = model.clone();
        }

        // Update log level in config if specified via command line
        if let Some(log_level) = log_level {
            config.log_level = log_level.clone().into();
        }

        config
    } else {
        // Create default configuration if not exists
        warn!("Config file not found at '{}', creating default config.", config_path);

        let mut config = Config::default();

        if let Some(provider) = provider {
            config.synthesis.provider = provider.clone().into();
        }

        if let Some(model) = model {
            config.synthesis.model = model.clone();
        }

        if let Some(log_level) = log_level {
            config.log_level = log_level.clone().into();
        }

        // Save default config
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;

        std::fs::write(config_path, config_json)
            .context(format!("Failed to write default config to file: {}", config_path))?;

        config
    };

    // Validate the configuration after loading and overriding
    config.validate().context("Configuration validation failed")?;

    Ok(config)
}

/// Apply the log level from config unless the CLI already set one.
fn apply_log_level(config: &Config, cli_level: &Option<CliLogLevel>) {
    if cli_level.is_none() {
        let log_level = match config.log_level {
            app_config::LogLevel::Error => LevelFilter::Error,
            app_config::LogLevel::Warn => LevelFilter::Warn,
            app_config::LogLevel::Info => LevelFilter::Info,
            app_config::LogLevel::Debug => LevelFilter::Debug,
            app_config::LogLevel::Trace => LevelFilter::Trace,
        };
        log::set_max_level(log_level);
    }
}

async fn run_preview(options: PreviewArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        let log_level = match config_log_level {
            app_config::LogLevel::Error => LevelFilter::Error,
            app_config::LogLevel::Warn => LevelFilter::Warn,
            app_config::LogLevel::Info => LevelFilter::Info,
            app_config::LogLevel::Debug => LevelFilter::Debug,
            app_config::LogLevel::Trace => LevelFilter::Trace,
        };
        log::set_max_level(log_level);
    }

    let config = load_config(
        &options.config_path,
        &options.provider,
        &options.model,
        &options.log_level,
    )?;
    apply_log_level(&config, &options.log_level);

    let controller = Controller::with_config(config)?;
    let timeline = controller.load_timeline(&options.timeline_path)?;

    let scope = match (options.scene, options.group) {
        (Some(index), _) => PlayScope::Scene(index),
        (None, Some(group)) => PlayScope::Group(group),
        (None, None) => PlayScope::Timeline,
    };

    controller.preview(&timeline, scope, options.from).await?;

    Ok(())
}

async fn run_synthesize(options: SynthesizeArgs) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        let log_level = match config_log_level {
            app_config::LogLevel::Error => LevelFilter::Error,
            app_config::LogLevel::Warn => LevelFilter::Warn,
            app_config::LogLevel::Info => LevelFilter::Info,
            app_config::LogLevel::Debug => LevelFilter::Debug,
            app_config::LogLevel::Trace => LevelFilter::Trace,
        };
        log::set_max_level(log_level);
    }

    let config = load_config(
        &options.config_path,
        &options.provider,
        &options.model,
        &options.log_level,
    )?;
    apply_log_level(&config, &options.log_level);

    let controller = Controller::with_config(config)?;
    let timeline = controller.load_timeline(&options.timeline_path)?;

    controller.synthesize(&timeline, options.force).await?;

    Ok(())
}

async fn run_inspect(options: InspectArgs) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        let config_log_level: app_config::LogLevel = cmd_log_level.clone().into();
        let log_level = match config_log_level {
            app_config::LogLevel::Error => LevelFilter::Error,
            app_config::LogLevel::Warn => LevelFilter::Warn,
            app_config::LogLevel::Info => LevelFilter::Info,
            app_config::LogLevel::Debug => LevelFilter::Debug,
            app_config::LogLevel::Trace => LevelFilter::Trace,
        };
        log::set_max_level(log_level);
    }

    let config = load_config(&options.config_path, &None, &None, &options.log_level)?;
    apply_log_level(&config, &options.log_level);

    let controller = Controller::with_config(config)?;
    let timeline = controller.load_timeline(&options.timeline_path)?;

    controller.inspect(&timeline)?;

    Ok(())
}
