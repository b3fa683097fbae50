// src/extractor/document.rs

use crate::{client::RobustClient, error::*, models::Fingerprint};
use log::debug;
use reqwest::header;
use scraper::{ElementRef, Html};
use std::sync::Arc;
use url::Url;

/// A fetched portal page, parsed and remembered together with the URL it came from.
pub struct PageDocument {
    url: Url,
    html: Html,
}

/// A text node that matched a search, with its nearest enclosing `<a>`.
#[derive(Debug, Clone, Copy)]
pub struct TextHit<'a> {
    pub anchor: Option<ElementRef<'a>>,
}

impl PageDocument {
    pub fn parse(url: Url, markup: &str) -> Self {
        Self {
            url,
            html: Html::parse_document(markup),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn root(&self) -> ElementRef<'_> {
        self.html.root_element()
    }

    /// Resolves an `href` found on this page to an absolute URL.
    pub fn resolve(&self, href: &str) -> AppResult<Url> {
        Ok(self.url.join(href.trim())?)
    }

    /// `href` of `anchor`, resolved against this page.
    pub fn anchor_target(&self, anchor: ElementRef<'_>) -> AppResult<Url> {
        let href = anchor
            .value()
            .attr("href")
            .ok_or_else(|| AppError::structure(&self.url, "link without an href"))?;
        self.resolve(href)
    }
}

/// Every text node under `scope` (in document order) for which `matches` holds.
pub fn find_text<'a, F>(scope: ElementRef<'a>, matches: F) -> impl Iterator<Item = TextHit<'a>>
where
    F: Fn(&str) -> bool + 'a,
{
    scope.descendants().filter_map(move |node| {
        let text: &'a str = node.value().as_text()?;
        if !matches(text) {
            return None;
        }
        let anchor = node
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "a");
        Some(TextHit { anchor })
    })
}

/// The first matching text node that sits inside a link; text without a link is passed over.
pub fn first_anchored_text<'a, F>(scope: ElementRef<'a>, matches: F) -> Option<ElementRef<'a>>
where
    F: Fn(&str) -> bool + 'a,
{
    find_text(scope, matches).find_map(|hit| hit.anchor)
}

/// All visible text of an element, whitespace-collapsed.
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

/// Issues the GET/HEAD requests the crawler needs against the logged-in session.
#[derive(Clone)]
pub struct DocumentFetcher {
    client: Arc<RobustClient>,
}

impl DocumentFetcher {
    pub fn new(client: Arc<RobustClient>) -> Self {
        Self { client }
    }

    /// GETs `url` and parses the body. Relative links resolve against the final URL after redirects.
    pub async fn fetch_document(&self, url: &Url) -> AppResult<PageDocument> {
        debug!("Fetching document {}", url);
        let res = self.client.get(url.clone()).await?;
        let final_url = res.url().clone();
        let body = res.text().await?;
        Ok(PageDocument::parse(final_url, &body))
    }

    /// HEADs `url` and returns its `ETag`, or `None` when the server sends none.
    pub async fn fetch_fingerprint(&self, url: &Url) -> AppResult<Option<Fingerprint>> {
        let res = self.client.head(url.clone()).await?;
        let fingerprint = res
            .headers()
            .get(header::ETAG)
            .and_then(|value| value.to_str().ok())
            .and_then(Fingerprint::from_header);
        debug!("Fingerprint of {}: {:?}", url, fingerprint);
        Ok(fingerprint)
    }
}
