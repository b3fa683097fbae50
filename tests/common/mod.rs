// tests/common/mod.rs

#![allow(dead_code)]

use clap::Parser;
use moodle_dl::{
    CrawlContext,
    cli::Cli,
    config::AppConfig,
    models::ProgressVerb,
    ui::{ProgressReporter, progress_line},
};
use std::sync::{Arc, Mutex, atomic::AtomicBool};

/// Collects progress lines instead of printing them.
#[derive(Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn sorted_lines(&self) -> Vec<String> {
        let mut lines = self.lines();
        lines.sort();
        lines
    }
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, current: usize, total: usize, verb: ProgressVerb, filename: &str) {
        self.lines
            .lock()
            .unwrap()
            .push(progress_line(current, total, verb, filename));
    }
}

/// A crawl context against a mock portal. `extra_args` are parsed like command-line flags.
pub fn test_context(extra_args: &[&str], workers: usize) -> (CrawlContext, Arc<RecordingReporter>) {
    test_context_with_config(
        extra_args,
        AppConfig {
            max_workers: workers,
            ..AppConfig::default()
        },
    )
}

pub fn test_context_with_config(
    extra_args: &[&str],
    config: AppConfig,
) -> (CrawlContext, Arc<RecordingReporter>) {
    let args = Arc::new(Cli::parse_from(
        std::iter::once("moodle-dl").chain(extra_args.iter().copied()),
    ));
    let reporter = Arc::new(RecordingReporter::default());
    let context = CrawlContext::new(
        Arc::new(config),
        args,
        reporter.clone(),
        Arc::new(AtomicBool::new(false)),
    )
    .expect("client should build");
    (context, reporter)
}
