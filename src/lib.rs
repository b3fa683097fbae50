// src/lib.rs

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod constants;
pub mod downloader;
pub mod error;
pub mod extractor;
pub mod logger;
pub mod models;
pub mod store;
pub mod symbols;
pub mod ui;
pub mod utils;
mod workflows;

use crate::{
    auth::Credentials,
    cli::Cli,
    client::RobustClient,
    config::{AppConfig, credentials},
    downloader::DownloadManager,
    error::{AppError, AppResult},
    extractor::{DocumentFetcher, StructureNavigator},
    ui::{ConsoleReporter, ProgressReporter},
};
use log::{debug, info, warn};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Everything a crawl needs, cheap to clone and shared by all download passes of a run.
#[derive(Clone)]
pub struct CrawlContext {
    pub manager: DownloadManager,
    pub config: Arc<AppConfig>,
    pub http_client: Arc<RobustClient>,
    pub fetcher: DocumentFetcher,
    pub reporter: Arc<dyn ProgressReporter>,
    pub args: Arc<Cli>,
    pub cancellation_token: Arc<AtomicBool>,
}

impl CrawlContext {
    pub fn new(
        config: Arc<AppConfig>,
        args: Arc<Cli>,
        reporter: Arc<dyn ProgressReporter>,
        cancellation_token: Arc<AtomicBool>,
    ) -> AppResult<Self> {
        let http_client = Arc::new(RobustClient::new(config.clone())?);
        Ok(Self {
            manager: DownloadManager::new(),
            fetcher: DocumentFetcher::new(http_client.clone()),
            http_client,
            config,
            reporter,
            args,
            cancellation_token,
        })
    }

    pub fn navigator(&self) -> StructureNavigator {
        StructureNavigator::new(self.fetcher.clone())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation_token.load(Ordering::Relaxed)
    }
}

/// Library entry point used by `main.rs`.
pub async fn run_from_cli(args: Arc<Cli>, cancellation_token: Arc<AtomicBool>) -> AppResult<()> {
    debug!(
        "Options: select={:?}, output={:?}, workers={:?}, force={}, list={}",
        args.select, args.output, args.workers, args.force_redownload, args.list
    );
    let config = Arc::new(AppConfig::new(&args)?);
    debug!("Portal: login={}, home={}", config.login_url, config.home_url);

    let context = CrawlContext::new(
        config.clone(),
        args.clone(),
        Arc::new(ConsoleReporter),
        cancellation_token,
    )?;

    ui::print_header(&format!("{} v{}", clap::crate_name!(), clap::crate_version!()));
    let (login, prompted) = resolve_credentials(&args, &config)?;
    auth::login(&context.http_client, &config.login_url, &login).await?;
    println!("{} Logged in as {}.", *symbols::OK, login.username);

    if prompted
        && config.saved_username.as_deref() != Some(login.username.as_str())
        && ui::confirm("Remember this username for next time?", true)
        && let Err(e) = credentials::save_username(&login.username)
    {
        warn!("Saving the username failed: {}", e);
        ui::warn(&format!("Could not save the username: {}", e));
    }

    workflows::run_session(context).await
}

/// Returns the credentials and whether the username had to be typed in.
fn resolve_credentials(args: &Cli, config: &AppConfig) -> AppResult<(Credentials, bool)> {
    let (username, source) =
        credentials::resolve_username(args.username.as_deref(), config.saved_username.as_deref());
    let (username, prompted) = match username {
        Some(username) => {
            info!("Username taken from {}", source);
            (username, false)
        }
        None if args.non_interactive() => {
            return Err(AppError::UserInputError(format!(
                "No username given. Use --username or set {}.",
                constants::ENV_USERNAME
            )));
        }
        None => {
            let username = ui::prompt("Username", None).map_err(|_| AppError::UserInterrupt)?;
            if username.is_empty() {
                return Err(AppError::UserInputError("Username must not be empty.".to_string()));
            }
            (username, true)
        }
    };

    let password = match credentials::resolve_password(args.password.as_deref()) {
        Some(password) => password,
        None if args.non_interactive() => {
            return Err(AppError::UserInputError(format!(
                "No password given. Use --password or set {}.",
                constants::ENV_PASSWORD
            )));
        }
        None => ui::prompt_hidden("Password (input hidden)").map_err(|_| AppError::UserInterrupt)?,
    };

    Ok((Credentials { username, password }, prompted))
}
