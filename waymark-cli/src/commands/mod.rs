//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration inspection (path, show, init)
//! - [`simulate`] - Scripted walk against a headless overlay

pub mod config;
pub mod simulate;

use std::path::Path;

/// Render a path with the home directory shortened to `~`.
pub fn display_path(path: &Path) -> String {
    match dirs::home_dir() {
        Some(home) => match path.strip_prefix(&home) {
            Ok(rest) => format!("~/{}", rest.display()),
            Err(_) => path.display().to_string(),
        },
        None => path.display().to_string(),
    }
}
