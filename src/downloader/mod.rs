// src/downloader/mod.rs

mod engine;
mod task_processor;

pub use engine::{LectureDownloader, collect_file_references};

use crate::{models::DownloadResult, symbols, ui};
use colored::*;
use log::info;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DownloadStats {
    pub total: usize,
    pub success: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Run-wide tally of download results, shared by every pass of a session.
#[derive(Clone)]
pub struct DownloadManager {
    stats: Arc<Mutex<DownloadStats>>,
    failed_downloads: Arc<Mutex<Vec<(String, String)>>>,
}

impl Default for DownloadManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadManager {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(Mutex::new(DownloadStats::default())),
            failed_downloads: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn record(&self, result: &DownloadResult) {
        let mut stats = self.stats.lock().unwrap();
        stats.total += 1;
        match result.status {
            crate::models::DownloadStatus::Success => stats.success += 1,
            crate::models::DownloadStatus::Skipped => stats.skipped += 1,
            status => {
                stats.failed += 1;
                let (_, _, msg) = status.get_display_info();
                let reason = match &result.message {
                    Some(detail) => format!("{} ({})", msg, detail),
                    None => msg.to_string(),
                };
                log::error!("Download of '{}' failed: {}", result.filename, reason);
                self.failed_downloads
                    .lock()
                    .unwrap()
                    .push((result.filename.clone(), msg.to_string()));
            }
        }
    }

    pub fn get_stats(&self) -> DownloadStats {
        self.stats.lock().unwrap().clone()
    }

    pub fn did_all_succeed(&self) -> bool {
        self.stats.lock().unwrap().failed == 0
    }

    pub fn print_report(&self) {
        let stats = self.get_stats();
        let failed = self.failed_downloads.lock().unwrap();
        info!(
            "Download report: Total={}, Success={}, Skipped={}, Failed={}",
            stats.total, stats.success, stats.skipped, stats.failed
        );

        if !failed.is_empty() {
            ui::print_sub_header("Failed downloads");
            println!("\n{} {} file(s) could not be downloaded:", *symbols::ERROR, stats.failed);
            print_grouped_report(&failed, |s| s.red());
        }
        ui::print_sub_header("Summary");
        if stats.failed == 0 {
            println!(
                "{} All {} files processed ({} skipped).",
                *symbols::OK,
                stats.total,
                stats.skipped
            );
        } else {
            let summary = format!(
                "{} | {} | {}",
                format!("Downloaded: {}", stats.success).green(),
                format!("Failed: {}", stats.failed).red(),
                format!("Skipped: {}", stats.skipped).yellow()
            );
            println!("{}", summary);
        }
    }
}

fn print_grouped_report(
    items: &[(String, String)],
    color_fn: fn(ColoredString) -> ColoredString,
) {
    let mut grouped: HashMap<&String, Vec<&String>> = HashMap::new();
    for (filename, reason) in items {
        grouped.entry(reason).or_default().push(filename);
    }
    let mut sorted_reasons: Vec<_> = grouped.keys().collect();
    sorted_reasons.sort();
    for reason in sorted_reasons {
        println!("  - {}", color_fn(format!("Reason: {}", reason).into()));
        let mut filenames = grouped[reason].clone();
        filenames.sort();
        for filename in filenames {
            println!("    - {}", filename);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DownloadStatus;

    #[test]
    fn test_record_tallies_by_status() {
        let manager = DownloadManager::new();
        manager.record(&DownloadResult::new("a.pdf", DownloadStatus::Success));
        manager.record(&DownloadResult::new("b.pdf", DownloadStatus::Skipped));
        manager.record(&DownloadResult::new("c.pdf", DownloadStatus::TimeoutError));

        assert_eq!(
            manager.get_stats(),
            DownloadStats {
                total: 3,
                success: 1,
                skipped: 1,
                failed: 1
            }
        );
        assert!(!manager.did_all_succeed());
    }
}
