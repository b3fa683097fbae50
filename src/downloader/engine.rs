// src/downloader/engine.rs

use super::task_processor::TaskProcessor;
use crate::{
    CrawlContext,
    constants::portal,
    error::*,
    extractor::PageDocument,
    models::{DownloadResult, DownloadStatus, FileReference},
    store::FingerprintStore,
};
use futures::{StreamExt, stream};
use log::{debug, info, warn};
use regex::Regex;
use scraper::Selector;
use std::{
    fs,
    path::Path,
    sync::{LazyLock, Mutex, PoisonError},
};
use url::Url;

static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static FORCE_DOWNLOAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(portal::FORCE_DOWNLOAD_PATTERN).unwrap());

/// Force-download links of a lecture page, resolved, in document order.
pub fn collect_file_references(page: &PageDocument) -> Vec<FileReference> {
    page.root()
        .select(&LINK_SELECTOR)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            if !FORCE_DOWNLOAD_RE.is_match(href) {
                return None;
            }
            match page.resolve(href) {
                Ok(url) => Some(FileReference::new(url)),
                Err(e) => {
                    warn!("Ignoring unusable file link '{}' on {}: {}", href, page.url(), e);
                    None
                }
            }
        })
        .collect()
}

/// Downloads the files of lecture pages into destination directories.
pub struct LectureDownloader {
    context: CrawlContext,
}

impl LectureDownloader {
    pub fn new(context: CrawlContext) -> Self {
        Self { context }
    }

    /// One download pass over the files of `lecture_page_url`.
    ///
    /// Returns `running_total` plus the number of files actually fetched in this pass.
    /// Per-file failures are reported and tallied but do not end the pass; failing to
    /// fetch the page itself or to open or save the fingerprint store does.
    pub async fn download_all(
        &self,
        destination: &Path,
        lecture_page_url: &Url,
        running_total: usize,
    ) -> AppResult<usize> {
        let files = {
            let page = self.context.fetcher.fetch_document(lecture_page_url).await?;
            collect_file_references(&page)
        };
        let total = files.len();
        info!("{} files linked from {}", total, lecture_page_url);
        if total == 0 {
            return Ok(running_total);
        }

        fs::create_dir_all(destination)?;
        let store = Mutex::new(FingerprintStore::open(destination)?);
        let workers = self.context.config.max_workers.clamp(1, total);
        debug!("Processing {} files with {} workers", total, workers);

        let results: Vec<DownloadResult> = {
            let processor = TaskProcessor::new(&self.context, &store, destination, total);
            stream::iter(files.into_iter().enumerate())
                .map(|(index, file)| processor.process(index + 1, file))
                .buffer_unordered(workers)
                .collect()
                .await
        };

        store.into_inner().unwrap_or_else(PoisonError::into_inner).close()?;

        let mut downloaded = 0;
        for result in &results {
            self.context.manager.record(result);
            if result.status == DownloadStatus::Success {
                downloaded += 1;
            }
        }
        if self.context.is_cancelled() {
            return Err(AppError::UserInterrupt);
        }
        Ok(running_total + downloaded)
    }
}
