//! Cross-Platform Path Utilities
//!
//! Functions for resolving application directories across platforms.
//! Handles ~/.covenant/ and its config/report subpaths.

use std::path::PathBuf;

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the covenant data directory (~/.covenant/)
pub fn covenant_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".covenant"))
}

/// Get the config file path (~/.covenant/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(covenant_dir()?.join("config.json"))
}

/// Get the report output directory (~/.covenant/reports/)
pub fn reports_dir() -> AppResult<PathBuf> {
    Ok(covenant_dir()?.join("reports"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &PathBuf) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Get the covenant directory, creating if it doesn't exist
pub fn ensure_covenant_dir() -> AppResult<PathBuf> {
    let path = covenant_dir()?;
    ensure_dir(&path)?;
    Ok(path)
}

/// Get the report output directory, creating if it doesn't exist
pub fn ensure_reports_dir() -> AppResult<PathBuf> {
    let path = reports_dir()?;
    ensure_dir(&path)?;
    Ok(path)
}
