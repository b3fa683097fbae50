// src/models.rs

use crate::{error::AppError, symbols, utils};
use colored::{ColoredString, Colorize};
use std::fmt;
use url::Url;

/// A course listed on the portal home page. Names are not guaranteed unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub name: String,
    pub url: Url,
}

/// One week of a course and the page that lists its lecture files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LecturePage {
    /// First two words of the week's label, e.g. "Week 3"
    pub week_label: String,
    pub url: Url,
}

/// A downloadable file discovered on a lecture page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    pub url: Url,
    pub filename: String,
}

impl FileReference {
    pub fn new(url: Url) -> Self {
        let filename = utils::sanitize_filename(&utils::decode_filename(url.as_str()));
        Self { url, filename }
    }
}

/// Opaque server-supplied content identifier (the `ETag` header).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// `None` for a missing or blank header value.
    pub fn from_header(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Fingerprint {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Verb of a `(<current>/<total>) <verb>: <filename>` progress line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressVerb {
    Downloading,
    Overwriting,
    AlreadyDownloaded,
    AlreadyExists,
}

impl ProgressVerb {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressVerb::Downloading => "Downloading",
            ProgressVerb::Overwriting => "File already exists! Overwriting",
            ProgressVerb::AlreadyDownloaded => "File already downloaded! Skipping",
            ProgressVerb::AlreadyExists => "File already exists! Skipping",
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, ProgressVerb::AlreadyDownloaded | ProgressVerb::AlreadyExists)
    }
}

impl fmt::Display for ProgressVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with one file after consulting the fingerprint store and the disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadAction {
    Skip(ProgressVerb),
    /// `claimed` is the fingerprint newly inserted for this file; it is released if the download fails.
    Download {
        overwrite: bool,
        claimed: Option<Fingerprint>,
    },
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DownloadStatus {
    Success,
    Skipped,
    HttpError,
    NetworkError,
    ConnectionError,
    TimeoutError,
    IoError,
    StoreError,
    Cancelled,
    UnexpectedError,
}

impl DownloadStatus {
    pub fn get_display_info(
        &self,
    ) -> (
        &'static ColoredString,
        fn(ColoredString) -> ColoredString,
        &'static str,
    ) {
        match self {
            DownloadStatus::Success => (&symbols::OK, |s| s.green(), "Downloaded"),
            DownloadStatus::Skipped => (&symbols::SKIP, |s| s.cyan(), "Skipped"),
            DownloadStatus::HttpError => (&symbols::ERROR, |s| s.red(), "Server returned an error"),
            DownloadStatus::NetworkError => (&symbols::ERROR, |s| s.red(), "Network request failed"),
            DownloadStatus::ConnectionError => (&symbols::ERROR, |s| s.red(), "Could not connect"),
            DownloadStatus::TimeoutError => (&symbols::WARN, |s| s.yellow(), "Request timed out"),
            DownloadStatus::IoError => (&symbols::ERROR, |s| s.red(), "Local file write failed"),
            DownloadStatus::StoreError => (&symbols::ERROR, |s| s.red(), "Fingerprint store failure"),
            DownloadStatus::Cancelled => (&symbols::WARN, |s| s.yellow(), "Cancelled"),
            DownloadStatus::UnexpectedError => (&symbols::ERROR, |s| s.red(), "Unexpected error"),
        }
    }
}

impl From<&AppError> for DownloadStatus {
    fn from(error: &AppError) -> Self {
        match error {
            AppError::Network(err)
            | AppError::NetworkMiddleware(reqwest_middleware::Error::Reqwest(err)) => {
                if err.is_timeout() {
                    DownloadStatus::TimeoutError
                } else if err.is_connect() {
                    DownloadStatus::ConnectionError
                } else if err.is_status() {
                    DownloadStatus::HttpError
                } else {
                    DownloadStatus::NetworkError
                }
            }
            AppError::NetworkMiddleware(_) => DownloadStatus::NetworkError,
            AppError::Io(_) | AppError::TempFilePersist(_) => DownloadStatus::IoError,
            AppError::Store { .. } => DownloadStatus::StoreError,
            AppError::UserInterrupt => DownloadStatus::Cancelled,
            _ => DownloadStatus::UnexpectedError,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub filename: String,
    pub status: DownloadStatus,
    pub message: Option<String>,
}

impl DownloadResult {
    pub fn new(filename: &str, status: DownloadStatus) -> Self {
        Self {
            filename: filename.to_string(),
            status,
            message: None,
        }
    }
}
