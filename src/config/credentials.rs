// src/config/credentials.rs

use crate::{
    config::ExternalConfig,
    constants,
    error::{AppError, AppResult},
};
use anyhow::{Context, anyhow};
use log::{debug, info};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub(super) fn get_config_path() -> AppResult<PathBuf> {
    let path = dirs::home_dir()
        .ok_or_else(|| AppError::Other(anyhow!("Unable to determine the home directory")))?
        .join(constants::CONFIG_DIR_NAME)
        .join(constants::CONFIG_FILE_NAME);
    Ok(path)
}

pub(crate) fn load_or_create_external_config() -> AppResult<ExternalConfig> {
    let config_path = get_config_path()?;
    if config_path.is_file() {
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file '{}'", config_path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file '{}'", config_path.display()))
            .map_err(AppError::from)
    } else {
        info!("Config file {:?} not found, writing defaults.", config_path);
        let config = ExternalConfig::default_app_config();
        write_external_config(&config_path, &config)?;
        Ok(config)
    }
}

fn write_external_config(config_path: &Path, config: &ExternalConfig) -> AppResult<()> {
    if let Some(dir) = config_path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json_content = serde_json::to_string_pretty(config)?;
    fs::write(config_path, json_content)
        .with_context(|| format!("Failed to write config file '{}'", config_path.display()))?;
    Ok(())
}

fn update_external_config(update: impl FnOnce(&mut ExternalConfig)) -> AppResult<()> {
    let config_path = get_config_path()?;
    let mut config = load_or_create_external_config()?;
    update(&mut config);
    write_external_config(&config_path, &config)
}

pub fn save_username(username: &str) -> AppResult<()> {
    if username.is_empty() {
        return Ok(());
    }
    update_external_config(|config| config.username = Some(username.to_string()))?;
    info!("Saved username to the config file");
    Ok(())
}

pub fn save_last_destination(destination: &Path) -> AppResult<()> {
    update_external_config(|config| config.last_destination = Some(destination.to_path_buf()))?;
    debug!("Remembered destination {:?}", destination);
    Ok(())
}

/// Username from CLI, then environment, then the config file. Returns the source for display.
pub fn resolve_username(
    cli_username: Option<&str>,
    saved_username: Option<&str>,
) -> (Option<String>, String) {
    if let Some(username) = cli_username && !username.is_empty() {
        debug!("Using username from command line");
        return (Some(username.to_string()), "command line".to_string());
    }
    if let Ok(username) = std::env::var(constants::ENV_USERNAME) && !username.is_empty() {
        debug!("Using username from {}", constants::ENV_USERNAME);
        return (
            Some(username),
            format!("environment ({})", constants::ENV_USERNAME),
        );
    }
    if let Some(username) = saved_username && !username.is_empty() {
        debug!("Using username from the config file");
        return (Some(username.to_string()), "config file".to_string());
    }
    debug!("No username found");
    (None, "not found".to_string())
}

/// Password from CLI, then environment. Passwords are never written to the config file.
pub fn resolve_password(cli_password: Option<&str>) -> Option<String> {
    if let Some(password) = cli_password && !password.is_empty() {
        return Some(password.to_string());
    }
    std::env::var(constants::ENV_PASSWORD)
        .ok()
        .filter(|p| !p.is_empty())
}
