// src/config.rs

pub mod credentials;

use self::credentials::load_or_create_external_config;
use crate::{
    cli::Cli,
    constants,
    error::{AppError, AppResult},
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PortalConfig {
    pub login_url: Option<String>,
    pub home_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NetworkConfig {
    pub connect_timeout_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

/// Contents of `~/.moodle-dl/config.json`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExternalConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Destination root chosen on the previous run, offered as the prompt default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_destination: Option<PathBuf>,
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

impl ExternalConfig {
    pub(crate) fn default_app_config() -> Self {
        Self {
            username: None,
            last_destination: None,
            portal: PortalConfig {
                login_url: Some(constants::DEFAULT_LOGIN_URL.into()),
                home_url: Some(constants::DEFAULT_HOME_URL.into()),
            },
            network: NetworkConfig {
                connect_timeout_secs: Some(10),
                timeout_secs: Some(60),
                max_retries: Some(3),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub max_workers: usize,
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub max_retries: u32,
    pub login_url: Url,
    pub home_url: Url,
    pub saved_username: Option<String>,
    pub last_destination: Option<PathBuf>,
}

impl AppConfig {
    pub fn new(args: &Cli) -> AppResult<Self> {
        let external_config = load_or_create_external_config()?;
        Self::from_parts(args, external_config)
    }

    /// Merges the config file with command-line overrides.
    pub fn from_parts(args: &Cli, external_config: ExternalConfig) -> AppResult<Self> {
        let login_url = args
            .login_url
            .clone()
            .or(external_config.portal.login_url)
            .unwrap_or_else(|| constants::DEFAULT_LOGIN_URL.to_string());
        let home_url = args
            .home_url
            .clone()
            .or(external_config.portal.home_url)
            .unwrap_or_else(|| constants::DEFAULT_HOME_URL.to_string());

        Ok(Self {
            max_workers: args
                .workers
                .map(usize::from)
                .unwrap_or(constants::DEFAULT_WORKERS),
            user_agent: constants::USER_AGENT.into(),
            connect_timeout: Duration::from_secs(
                external_config.network.connect_timeout_secs.unwrap_or(10),
            ),
            timeout: Duration::from_secs(external_config.network.timeout_secs.unwrap_or(60)),
            max_retries: external_config.network.max_retries.unwrap_or(3),
            login_url: parse_portal_url(&login_url)?,
            home_url: parse_portal_url(&home_url)?,
            saved_username: external_config.username,
            last_destination: external_config.last_destination,
        })
    }
}

fn parse_portal_url(raw: &str) -> AppResult<Url> {
    Url::parse(raw)
        .map_err(|e| AppError::UserInputError(format!("Invalid portal URL '{}': {}", raw, e)))
}

#[cfg(feature = "testing")]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            max_workers: 1,
            user_agent: "test-agent/1.0".to_string(),
            connect_timeout: Duration::from_secs(5),
            timeout: Duration::from_secs(15),
            max_retries: 0,
            login_url: Url::parse("http://127.0.0.1/login/index.php").unwrap(),
            home_url: Url::parse("http://127.0.0.1/my/").unwrap(),
            saved_username: None,
            last_destination: None,
        }
    }
}
