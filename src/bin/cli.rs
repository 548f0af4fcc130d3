//! Outage sync CLI
//!
//! Local execution entry point.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use outage_sync::{
    error::{AppError, Result, Stage},
    models::{API_KEY_ENV, Config},
    pipeline::{self, SyncOptions, SyncOutcome},
    services::OutageApi,
};

/// outage-sync - posts a site's recent device outages back to the outages API
#[derive(Parser, Debug)]
#[command(name = "outage-sync", version, about = "Device outage sync")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "outage-sync.toml")]
    config: PathBuf,

    /// API key (overrides the config file)
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// API base URL (overrides the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch outages, filter them for a site and post the result
    Sync {
        /// Site to sync (default: sync.site_id from the config)
        #[arg(long)]
        site_id: Option<String>,

        /// Print the outages that would be posted instead of posting
        #[arg(long)]
        dry_run: bool,
    },

    /// Print all outages known to the API
    Outages,

    /// Print a site's device list
    SiteInfo {
        /// Site to show (default: sync.site_id from the config)
        #[arg(long)]
        site_id: Option<String>,
    },

    /// Validate the configuration
    Validate,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Initialize logging based on verbosity flag and configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Print a value as pretty JSON on stdout.
fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}

/// Load the config file, falling back to defaults, then apply CLI overrides.
///
/// A load failure is returned alongside the defaults so it can be logged
/// once logging is up.
fn load_config(cli: &Cli) -> (Config, Option<AppError>) {
    let (mut config, load_error) = if cli.config.exists() {
        match Config::load(&cli.config) {
            Ok(config) => (config, None),
            Err(e) => (Config::default(), Some(e)),
        }
    } else {
        (Config::default(), None)
    };

    if let Some(key) = cli.api_key.as_ref().filter(|key| !key.trim().is_empty()) {
        config.api.api_key = key.clone();
    }
    if let Some(url) = &cli.base_url {
        config.api.base_url = url.clone();
    }
    (config, load_error)
}

async fn run(cli: Cli, mut config: Config) -> Result<()> {
    match cli.command {
        Command::Init { force } => {
            if cli.config.exists() && !force {
                log::warn!(
                    "Config already exists at {}. Use --force to overwrite.",
                    cli.config.display()
                );
                return Ok(());
            }
            Config::default().save(&cli.config)?;
            log::info!("Default configuration written to {}", cli.config.display());
        }

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");
        }

        Command::Outages => {
            config.validate()?;
            let api = OutageApi::from_config(&config)?;
            let outages = api
                .get_all_outages()
                .await
                .map_err(|e| AppError::stage(Stage::FetchOutages, e))?;
            log::info!("Fetched {} outages.", outages.len());
            print_json(&outages)?;
        }

        Command::SiteInfo { site_id } => {
            if let Some(site_id) = site_id {
                config.sync.site_id = site_id;
            }
            config.validate()?;
            let api = OutageApi::from_config(&config)?;
            let site = api
                .get_site_info(&config.sync.site_id)
                .await
                .map_err(|e| AppError::stage(Stage::FetchSiteInfo, e))?;
            print_json(&site)?;
        }

        Command::Sync { site_id, dry_run } => {
            if let Some(site_id) = site_id {
                config.sync.site_id = site_id;
            }
            config.validate()?;

            let api = OutageApi::from_config(&config)?;
            let options = SyncOptions { dry_run };
            match pipeline::run_sync(&api, &config.sync.site_id, &options).await? {
                SyncOutcome::Posted { count, response } => {
                    log::info!("Successfully posted {} outages.", count);
                    log::debug!("Post response: {}", response);
                }
                SyncOutcome::NothingToPost => {
                    log::warn!("No outages matched site '{}'; nothing posted.", config.sync.site_id);
                }
                SyncOutcome::DryRun { outages } => print_json(&outages)?,
            }
        }
    }

    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let (config, load_error) = load_config(&cli);
    init_logging(cli.verbose, &config.logging.level);

    log::info!("outage-sync starting...");
    if let Some(e) = load_error {
        log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        );
    }

    match run(cli, config).await {
        Ok(()) => {
            log::info!("Done!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
