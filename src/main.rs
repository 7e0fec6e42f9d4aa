// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{debug, info, warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;

use langie::app_config::{self, Config};
use langie::translation::{CacheStore, LanguageOptions, TranslationEngine};

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
    /// Translate texts through the batching engine
    Translate {
        /// Texts to translate
        #[arg(value_name = "TEXT", required = true)]
        texts: Vec<String>,

        /// Target language code (e.g., 'fr', 'sr-latn')
        #[arg(short, long)]
        to: String,

        /// Source language code, auto-detected when omitted
        #[arg(short, long)]
        from: Option<String>,

        /// Context tag of the texts
        #[arg(short = 'x', long)]
        context: Option<String>,
    },

    /// List the languages offered by the service
    Languages {
        /// Country hint (e.g., 'RS')
        #[arg(long)]
        country: Option<String>,

        /// Browser-style locale used to pick an interface language (e.g., 'sr-Latn-RS')
        #[arg(long)]
        locale: Option<String>,

        /// Ignore cached language lists
        #[arg(long)]
        force: bool,
    },

    /// Remove persisted translations and language lists
    ClearCache,

    /// Generate shell completions for langie
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Langie - batching translation client
///
/// Sends texts to a Langie translation service, coalescing them into as few
/// requests as possible and caching the results.
#[derive(Parser, Debug)]
#[command(name = "langie")]
#[command(version)]
#[command(about = "Batching and caching client for the Langie translation service")]
#[command(long_about = "Langie sends texts to a Langie translation service, coalescing them into as few requests as possible and caching the results.

EXAMPLES:
    langie translate -t fr Hello World          # Translate two texts into French
    langie translate -t de -f en -x article Hi  # Pin source language and context
    langie languages --country RS               # List languages with a country hint
    langie languages --locale sr-Latn-RS        # Show the language picked for a locale
    langie clear-cache                          # Drop persisted translations
    langie completions bash > langie.bash       # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. TRANSLATOR_HOST, TRANSLATOR_API_KEY and
    MIN_LANGUAGE_POPULARITY override the file.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json", global = true)]
    config_path: String,

    /// Translation service base URL
    #[arg(long, global = true)]
    host: Option<String>,

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

    // @returns: Marker and ANSI colour for a level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌", "1;31"),
            Level::Warn => ("🚧", "1;33"),
            Level::Info => ("", "1;32"),
            Level::Debug => ("🔍", "1;36"),
            Level::Trace => ("📋", "1;35"),
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
            let (marker, colour) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", colour, now, marker, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger admits everything; the max level is adjusted once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "langie", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;
    log::set_max_level(config.log_level.to_level_filter());
    debug!("Using translator at {}", config.translator_host);

    match cli.command {
        Commands::Translate { texts, to, from, context } => {
            run_translate(config, &texts, &to, from.as_deref(), context.as_deref()).await
        }
        Commands::Languages { country, locale, force } => run_languages(config, country, locale, force).await,
        Commands::ClearCache => run_clear_cache(&config),
        Commands::Completions { .. } => Ok(()),
    }
}

fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config_path)?;
    config.apply_env_overrides();

    if let Some(host) = &cli.host {
        config.translator_host = host.clone();
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    Ok(config)
}

async fn run_translate(
    config: Config,
    texts: &[String],
    to: &str,
    from: Option<&str>,
    context: Option<&str>,
) -> Result<()> {
    let engine = TranslationEngine::from_config(config)?;
    engine.restore_language();
    engine.set_language(to);

    // Queue everything first so the engine can coalesce it
    for text in texts {
        engine.lookup(text, context, from, None);
    }

    match engine.flush_now().await {
        Ok(report) => info!(
            "{} texts sent in {} requests, {} translated",
            report.requests, report.calls, report.cached
        ),
        Err(e) => warn!("Some translations failed: {}", e),
    }

    let mut stdout = std::io::stdout();
    for text in texts {
        writeln!(stdout, "{}", engine.lookup(text, context, from, None))?;
    }

    Ok(())
}

async fn run_languages(config: Config, country: Option<String>, locale: Option<String>, force: bool) -> Result<()> {
    let engine = TranslationEngine::from_config(config)?;
    let country = country.or_else(|| locale.as_deref().and_then(|l| engine.country_hint_from_locale(l)));

    let languages = engine
        .fetch_languages(LanguageOptions {
            force,
            country,
            ..Default::default()
        })
        .await;

    let mut stdout = std::io::stdout();
    for language in &languages {
        writeln!(
            stdout,
            "{:<10} {:<4} {:<24} {}",
            language.code,
            language.flag_country.to_uppercase(),
            language.name,
            language.native_name
        )?;
    }

    if let Some(locale) = locale {
        match engine.auto_select_language(&locale).await {
            Some(code) => info!("Locale {} selects {}", locale, code),
            None => info!("No interface language selected for locale {}", locale),
        }
    }

    Ok(())
}

fn run_clear_cache(config: &Config) -> Result<()> {
    let store = CacheStore::open(&config.cache)?;
    let removed = store.clear()?;
    info!("Removed {} persisted items", removed);
    Ok(())
}
