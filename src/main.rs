//! # viewstack
//!
//! Headless driver for the view stack: loads a configuration, replays a
//! scenario script against the manager and prints the stack and mask
//! after every step.

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::path::PathBuf;

use viewstack::scenario::{Scenario, ScenarioRunner};
use viewstack::ViewConfig;

#[derive(Parser)]
#[command(name = "viewstack")]
#[command(about = "Replay window stack scenarios and inspect occlusion and mask placement")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.config/viewstack/viewstack.toml")]
    config: String,

    /// Scenario script to replay
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    dump_config: bool,

    /// Disable entrance tweens
    #[arg(long)]
    no_tween: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    info!("Starting viewstack {}", viewstack::VERSION);
    info!("Built {} for {}", env!("BUILD_DATE"), env!("TARGET_TRIPLE"));
    if let Some(commit) = option_env!("GIT_COMMIT") {
        info!("Commit {}", commit);
    }

    let mut config = match ViewConfig::load(&cli.config) {
        Ok(config) => {
            info!("Configuration loaded from: {}", cli.config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            info!("Using default configuration");
            ViewConfig::default()
        }
    };

    if cli.no_tween {
        config.tween.enabled = false;
        info!("Entrance tweens disabled via CLI flag");
    }

    if cli.dump_config {
        let contents = toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
        print!("{}", contents);
        return Ok(());
    }

    let Some(script) = cli.script else {
        info!("No scenario given; pass --script <file> to replay one");
        return Ok(());
    };

    let scenario = Scenario::load(&script)?;
    info!(
        "Replaying {} step(s) from {}",
        scenario.steps.len(),
        script.display()
    );

    let mut runner = ScenarioRunner::new(config, &scenario)?;
    for step in &scenario.steps {
        print!("{}", runner.apply(step));
    }

    info!(
        "Scenario finished: {} window(s) live, {} package reference(s) held",
        runner.manager().len(),
        runner.loader().held()
    );

    Ok(())
}
