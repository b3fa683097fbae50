// src/cli.rs

use clap::{Parser, ValueEnum, crate_version};
use std::path::PathBuf;

/// Log file verbosity
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Parser, Debug, Clone)]
#[command(
    version = crate_version!(),
    about,
    long_about = None,
    disable_help_flag = true,
    disable_version_flag = true,
)]
pub struct Cli {
    // --- Account ---
    /// Portal username (falls back to MOODLE_USERNAME, then the config file)
    #[arg(short, long, help_heading = "Account")]
    pub username: Option<String>,
    /// Portal password (falls back to MOODLE_PASSWORD, then a hidden prompt)
    #[arg(short, long, help_heading = "Account")]
    pub password: Option<String>,
    /// Override the login page URL from the config file
    #[arg(long, value_name = "URL", help_heading = "Account")]
    pub login_url: Option<String>,
    /// Override the portal home page URL from the config file
    #[arg(long, value_name = "URL", help_heading = "Account")]
    pub home_url: Option<String>,

    // --- Options ---
    /// Courses to download without prompting (e.g. '1,3,5-7', 'all')
    #[arg(short, long, value_name = "SELECTION", help_heading = "Options")]
    pub select: Option<String>,
    /// Destination root directory (prompted for when omitted)
    #[arg(short, long, value_name = "DIR", help_heading = "Options")]
    pub output: Option<PathBuf>,
    /// Number of files of one lecture page downloaded at the same time
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..=32), help_heading = "Options")]
    pub workers: Option<u16>,
    /// Download every file again, ignoring stored fingerprints and existing files
    #[arg(short, long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub force_redownload: bool,
    /// Print the discovered courses and exit
    #[arg(short, long, action = clap::ArgAction::SetTrue, conflicts_with = "select", help_heading = "Options")]
    pub list: bool,
    /// Do not ask for confirmation before downloading
    #[arg(short = 'y', long, action = clap::ArgAction::SetTrue, help_heading = "Options")]
    pub yes: bool,

    // --- General ---
    /// Print help and exit
    #[arg(short = 'h', long, action = clap::ArgAction::Help, global = true, help_heading = "General")]
    _help: Option<bool>,
    /// Print version and exit
    #[arg(short = 'V', long, action = clap::ArgAction::Version, global = true, help_heading = "General")]
    _version: Option<bool>,
    /// (hidden) Log file verbosity, for debugging
    #[arg(long, value_enum, default_value_t = LogLevel::Off, global = true, hide = true)]
    pub log_level: LogLevel,
}

impl Cli {
    /// Selection given on the command line switches off every prompt.
    pub fn non_interactive(&self) -> bool {
        self.select.is_some()
    }
}
