// src/downloader/task_processor.rs

use crate::{
    CrawlContext,
    error::*,
    models::*,
    store::FingerprintStore,
    ui,
};
use futures::StreamExt;
use indicatif::{HumanBytes, ProgressBar};
use log::{debug, error};
use std::{
    io::Write as IoWrite,
    path::Path,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tempfile::NamedTempFile;
use url::Url;

/// Decides between skipping and downloading one file.
///
/// A new fingerprint is inserted right away so that concurrent workers never fetch the same
/// content twice; the caller must release the claim if the download then fails.
/// Without a fingerprint the file on disk is the only evidence of a previous download.
pub(super) fn decide_action(
    store: &mut FingerprintStore,
    fingerprint: Option<Fingerprint>,
    target_exists: bool,
    force: bool,
) -> DownloadAction {
    match fingerprint {
        Some(fp) => {
            let is_new = store.check_and_insert(&fp);
            if !is_new && !force {
                return DownloadAction::Skip(ProgressVerb::AlreadyDownloaded);
            }
            DownloadAction::Download {
                overwrite: target_exists,
                claimed: is_new.then_some(fp),
            }
        }
        None if target_exists && !force => DownloadAction::Skip(ProgressVerb::AlreadyExists),
        None => DownloadAction::Download {
            overwrite: target_exists,
            claimed: None,
        },
    }
}

/// Handles single files of one download pass.
pub(super) struct TaskProcessor<'a> {
    context: &'a CrawlContext,
    store: &'a Mutex<FingerprintStore>,
    destination: &'a Path,
    total: usize,
}

impl<'a> TaskProcessor<'a> {
    pub(super) fn new(
        context: &'a CrawlContext,
        store: &'a Mutex<FingerprintStore>,
        destination: &'a Path,
        total: usize,
    ) -> Self {
        Self {
            context,
            store,
            destination,
            total,
        }
    }

    fn lock_store(&self) -> MutexGuard<'a, FingerprintStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Never fails: errors become a failed [`DownloadResult`] so the pass can go on.
    pub(super) async fn process(&self, current: usize, file: FileReference) -> DownloadResult {
        if self.context.is_cancelled() {
            return DownloadResult::new(&file.filename, DownloadStatus::Cancelled);
        }
        match self.try_process(current, &file).await {
            Ok(result) => result,
            Err(e) => {
                error!("Failed to process '{}' ({}): {}", file.filename, file.url, e);
                let status = DownloadStatus::from(&e);
                let (symbol, color_fn, default_msg) = status.get_display_info();
                println!(
                    "{} ({}/{}) {} {}",
                    symbol,
                    current,
                    self.total,
                    file.filename,
                    color_fn(format!("failed: {} ({})", default_msg, e).into())
                );
                DownloadResult {
                    filename: file.filename,
                    status,
                    message: Some(e.to_string()),
                }
            }
        }
    }

    async fn try_process(&self, current: usize, file: &FileReference) -> AppResult<DownloadResult> {
        let target = self.destination.join(&file.filename);
        let fingerprint = self.context.fetcher.fetch_fingerprint(&file.url).await?;

        let action = decide_action(
            &mut self.lock_store(),
            fingerprint,
            target.exists(),
            self.context.args.force_redownload,
        );
        debug!("'{}': {:?}", file.filename, action);

        match action {
            DownloadAction::Skip(verb) => {
                self.context.reporter.report(current, self.total, verb, &file.filename);
                Ok(DownloadResult::new(&file.filename, DownloadStatus::Skipped))
            }
            DownloadAction::Download { overwrite, claimed } => {
                let verb = if overwrite {
                    ProgressVerb::Overwriting
                } else {
                    ProgressVerb::Downloading
                };
                self.context.reporter.report(current, self.total, verb, &file.filename);

                match self.download_to(&file.url, &target).await {
                    Ok(bytes) => {
                        debug!("Saved {} ({})", target.display(), HumanBytes(bytes));
                        Ok(DownloadResult::new(&file.filename, DownloadStatus::Success))
                    }
                    Err(e) => {
                        if let Some(fp) = claimed {
                            self.lock_store().remove(&fp);
                        }
                        Err(e)
                    }
                }
            }
        }
    }

    /// Streams the body into a temporary file next to `target`, then renames it into place.
    async fn download_to(&self, url: &Url, target: &Path) -> AppResult<u64> {
        let res = self.context.http_client.get_stream(url.clone()).await?;

        let pbar: Option<ProgressBar> = res
            .content_length()
            .filter(|len| *len > 0 && self.context.config.max_workers == 1)
            .map(|len| ui::new_bytes_progress_bar(len, "Downloading"));

        let mut temp = NamedTempFile::new_in(self.destination)?;
        let mut stream = res.bytes_stream();
        let mut written: u64 = 0;
        while let Some(chunk_result) = stream.next().await {
            if self.context.is_cancelled() {
                if let Some(pbar) = &pbar {
                    pbar.abandon();
                }
                return Err(AppError::UserInterrupt);
            }
            let chunk = chunk_result?;
            temp.write_all(&chunk)?;
            written += chunk.len() as u64;
            if let Some(pbar) = &pbar {
                pbar.inc(chunk.len() as u64);
            }
        }
        temp.persist(target)?;

        if let Some(pbar) = pbar {
            pbar.finish_and_clear();
        }
        Ok(written)
    }
}
