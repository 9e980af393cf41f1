//! Waypoint CLI - Binary entry point.
//!
//! Loads `~/.waypoint/config.toml`, wires the routing stack through
//! [`waypoint_router::Waypoint`] and prints the decision.
//!
//! ```text
//! main() -> load config -> ResolvedConfig -> Waypoint::from_config()
//!                                                 |
//!                          resolve | status | reset | check
//! ```
//!
//! `resolve` (the default) runs the decision concurrently with the launch
//! screen delay, so the route is printed no sooner than the splash would have
//! been dismissed.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use waypoint_config::{ResolvedConfig, WaypointConfig};
use waypoint_router::{RoutingDecider, Waypoint};
use waypoint_types::{DecisionState, Route};

#[derive(Parser)]
#[command(name = "waypoint")]
#[command(about = "Decide once whether this installation shows web or native content")]
struct Cli {
    /// Config file to use instead of ~/.waypoint/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide the route for this launch (default)
    Resolve {
        /// Probe a web location before using it
        #[arg(long)]
        verify: bool,
        /// Skip the launch screen delay
        #[arg(long)]
        no_delay: bool,
    },
    /// Print the stored decision without contacting the server
    Status,
    /// Forget the stored decision so the next launch registers again
    Reset,
    /// Probe a content location (defaults to the cached one)
    Check {
        location: Option<String>,
    },
}

const LOG_FILE_NAME: &str = "waypoint.log";

/// Log files tried in order: beside the config file, then under `./.waypoint`.
fn log_file_candidates() -> Vec<PathBuf> {
    let beside_config = waypoint_config::config_path()
        .and_then(|path| path.parent().map(|dir| dir.join("logs")));
    beside_config
        .into_iter()
        .chain([PathBuf::from(".waypoint").join("logs")])
        .map(|dir| dir.join(LOG_FILE_NAME))
        .collect()
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let mut warnings = Vec::new();
    let log_file = log_file_candidates()
        .into_iter()
        .find_map(|path| match open_log_file(&path) {
            Ok(file) => Some((path, file)),
            Err(e) => {
                warnings.push(format!("Failed to open log file {}: {e}", path.display()));
                None
            }
        });

    let registry = tracing_subscriber::registry().with(env_filter);
    match log_file {
        Some((path, file)) => {
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
                .init();
            tracing::info!(path = %path.display(), "Logging initialized");
        }
        // stdout carries the decision.
        None => registry.with(fmt::layer().with_writer(io::stderr)).init(),
    }

    for warning in warnings {
        tracing::warn!("{warning}");
    }
}

fn load_config(path: Option<PathBuf>) -> Result<ResolvedConfig> {
    let config = match path {
        Some(path) => {
            let display = path.display().to_string();
            match WaypointConfig::load_from(path)? {
                Some(config) => config,
                None => bail!("config file {display} does not exist"),
            }
        }
        None => WaypointConfig::load()?.unwrap_or_default(),
    };
    ResolvedConfig::from_config(&config).context("invalid configuration")
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    let decider = Waypoint::from_config(&config)?.into_decider();

    let command = cli.command.unwrap_or(Commands::Resolve {
        verify: false,
        no_delay: false,
    });

    match command {
        Commands::Resolve { verify, no_delay } => {
            let delay = if no_delay {
                std::time::Duration::ZERO
            } else {
                config.launch_screen_delay
            };
            let route = resolve_with_launch_screen(&decider, verify, delay).await;
            println!("{route}");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Status => {
            match decider.state() {
                DecisionState::Undecided => println!("undecided"),
                DecisionState::Decided(route) => println!("{route}"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Reset => {
            decider.reset().context("failed to reset routing decision")?;
            println!("reset");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { location } => check(&decider, location).await,
    }
}

async fn resolve_with_launch_screen(
    decider: &RoutingDecider,
    verify: bool,
    delay: std::time::Duration,
) -> Route {
    let decide = async {
        if verify {
            decider.resolve_verified().await
        } else {
            decider.resolve().await
        }
    };
    let (route, ()) = tokio::join!(decide, tokio::time::sleep(delay));
    route
}

async fn check(decider: &RoutingDecider, location: Option<String>) -> Result<ExitCode> {
    let location = match location {
        Some(location) => location,
        None => match decider.store().outcome().content_location {
            Some(location) => location.into_inner(),
            None => bail!("no location given and no cached content location"),
        },
    };

    if decider.client().check_reachability(&location).await {
        println!("available {location}");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("unavailable {location}");
        Ok(ExitCode::FAILURE)
    }
}
