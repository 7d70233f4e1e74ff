//! Configuration CLI commands.
//!
//! Provides `config path`, `config show` and `config init`.

use std::path::{Path, PathBuf};

use clap::Subcommand;
use waymark::config::{config_file_path, OverlayConfig};

use super::display_path;
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration as INI
    Show {
        /// Read this file instead of the default path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a default configuration file if none exists
    Init,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show { config } => run_show(config.as_deref()),
        ConfigCommands::Init => run_init(),
    }
}

/// Load the configuration from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<OverlayConfig, CliError> {
    let config = match path {
        Some(path) => OverlayConfig::load_from(path)?,
        None => OverlayConfig::load()?,
    };
    Ok(config)
}

fn run_path() -> Result<(), CliError> {
    let path = config_file_path();
    println!("{}", display_path(&path));
    if !path.exists() {
        println!("(file does not exist, defaults are in effect)");
    }
    Ok(())
}

fn run_show(path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(path)?;
    print!("{}", config.to_ini_string());
    Ok(())
}

fn run_init() -> Result<(), CliError> {
    let existed = config_file_path().exists();
    let path = OverlayConfig::ensure_exists()?;
    if existed {
        println!("Configuration already exists at {}", display_path(&path));
    } else {
        println!("Wrote default configuration to {}", display_path(&path));
    }
    Ok(())
}
