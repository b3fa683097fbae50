// src/extractor/navigator.rs

//! Course and week discovery.
//!
//! Course pages come in two layouts. Either a week block links its lecture folder
//! directly ([`LectureLocation::Inline`]), or it only links a separate week page that
//! in turn holds the "Lectures" link ([`LectureLocation::Deferred`]). Locating is a pure
//! function of the course page; resolving a deferred week costs one more request.

use super::document::{DocumentFetcher, PageDocument, element_text, find_text, first_anchored_text};
use crate::{
    constants::portal,
    error::*,
    models::{Course, LecturePage},
};
use itertools::Itertools;
use log::{debug, info, warn};
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::LazyLock;
use url::Url;

static COURSE_HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("h2").unwrap());
static LINK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a[href]").unwrap());
static WEEK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li[id][aria-label]").unwrap());

static COURSE_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(portal::COURSE_TITLE_CLASS).unwrap());
static WEEK_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(portal::WEEK_ID_PATTERN).unwrap());
static WEEK_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(portal::WEEK_LABEL_PATTERN).unwrap());

/// Where a week's lecture page is linked from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LectureLocation {
    /// The week block links the lecture page itself.
    Inline(Url),
    /// The week block links a week page, which links the lecture page.
    Deferred(Url),
}

/// A week block found on a course page, before any deferred lookup.
#[derive(Debug)]
pub struct WeekEntry {
    pub label: String,
    pub location: AppResult<LectureLocation>,
}

#[derive(Debug)]
pub struct WeekFailure {
    pub label: String,
    pub error: AppError,
}

/// Outcome of resolving all weeks of one course.
#[derive(Debug, Default)]
pub struct PageDiscovery {
    pub pages: Vec<LecturePage>,
    /// Weeks whose markup did not lead to a lecture page; they contribute no entry to `pages`.
    pub failures: Vec<WeekFailure>,
}

/// Courses on the home page, in document order, duplicates kept.
pub fn list_courses(home: &PageDocument) -> Vec<Course> {
    let mut courses = Vec::new();
    for heading in home.root().select(&COURSE_HEADING_SELECTOR) {
        if !heading.value().classes().any(|c| COURSE_TITLE_RE.is_match(c)) {
            continue;
        }
        let name = element_text(heading);
        let Some(link) = heading.select(&LINK_SELECTOR).next() else {
            warn!("Course heading '{}' has no link, ignoring it", name);
            continue;
        };
        match home.anchor_target(link) {
            Ok(url) => courses.push(Course { name, url }),
            Err(e) => warn!("Course heading '{}' has an unusable link: {}", name, e),
        }
    }
    debug!("Found {} courses on {}", courses.len(), home.url());
    courses
}

/// "Week 3: Introduction" -> "Week 3"
pub fn week_label(aria_label: &str) -> String {
    aria_label
        .split_whitespace()
        .take(2)
        .join(" ")
        .trim_end_matches(|c: char| !c.is_alphanumeric())
        .to_string()
}

/// Decides which layout `week` uses and extracts the corresponding link.
///
/// The first linked "Lecture" text wins. Otherwise the week page link is followed, even when
/// the block mentions lectures in plain text only (e.g. "Lecturer: Dr X").
pub fn locate_lecture_anchor(page: &PageDocument, week: ElementRef<'_>) -> AppResult<LectureLocation> {
    let mut saw_lecture_text = false;
    for hit in find_text(week, |t| t.contains(portal::LECTURE_MARKER)) {
        if let Some(anchor) = hit.anchor {
            return Ok(LectureLocation::Inline(page.anchor_target(anchor)?));
        }
        saw_lecture_text = true;
    }

    let week_link = week
        .select(&LINK_SELECTOR)
        .find(|a| WEEK_LABEL_RE.is_match(&element_text(*a)));
    match week_link {
        Some(link) => Ok(LectureLocation::Deferred(page.anchor_target(link)?)),
        None if saw_lecture_text => Err(AppError::structure(
            page.url(),
            "lecture entries in week block are not linked",
        )),
        None => Err(AppError::structure(
            page.url(),
            "week block has neither lecture entries nor a week page link",
        )),
    }
}

/// Week blocks of a course page, in document order.
pub fn scan_weeks(course_page: &PageDocument) -> Vec<WeekEntry> {
    course_page
        .root()
        .select(&WEEK_SELECTOR)
        .filter_map(|week| {
            let id = week.value().attr("id")?;
            let aria_label = week.value().attr("aria-label")?;
            (WEEK_ID_RE.is_match(id) && WEEK_LABEL_RE.is_match(aria_label)).then(|| WeekEntry {
                label: week_label(aria_label),
                location: locate_lecture_anchor(course_page, week),
            })
        })
        .collect()
}

/// The "Lectures" link on a week page.
pub fn find_lectures_link(week_page: &PageDocument) -> AppResult<Url> {
    let anchor = first_anchored_text(week_page.root(), |t| t.contains(portal::LECTURES_LINK_TEXT))
        .ok_or_else(|| AppError::structure(week_page.url(), "week page has no 'Lectures' link"))?;
    week_page.anchor_target(anchor)
}

/// Walks home page -> courses -> weeks -> lecture pages.
#[derive(Clone)]
pub struct StructureNavigator {
    fetcher: DocumentFetcher,
}

impl StructureNavigator {
    pub fn new(fetcher: DocumentFetcher) -> Self {
        Self { fetcher }
    }

    pub async fn list_courses(&self, home_url: &Url) -> AppResult<Vec<Course>> {
        let home = self.fetcher.fetch_document(home_url).await?;
        Ok(list_courses(&home))
    }

    /// Turns a located week into its lecture page URL, fetching the week page if needed.
    pub async fn resolve_location(&self, location: LectureLocation) -> AppResult<Url> {
        match location {
            LectureLocation::Inline(url) => Ok(url),
            LectureLocation::Deferred(week_url) => {
                debug!("Week content is on a separate page: {}", week_url);
                let week_page = self.fetcher.fetch_document(&week_url).await?;
                find_lectures_link(&week_page)
            }
        }
    }

    /// Lecture pages of every week of `course`.
    ///
    /// A week whose markup cannot be followed is recorded in `failures` and skipped;
    /// transport errors abort the whole course.
    pub async fn resolve_pages(&self, course: &Course) -> AppResult<PageDiscovery> {
        let entries = {
            let course_page = self.fetcher.fetch_document(&course.url).await?;
            scan_weeks(&course_page)
        };
        info!("Course '{}': {} week blocks", course.name, entries.len());

        let mut discovery = PageDiscovery::default();
        for entry in entries {
            let resolved = match entry.location {
                Ok(location) => self.resolve_location(location).await,
                Err(e) => Err(e),
            };
            match resolved {
                Ok(url) => discovery.pages.push(LecturePage {
                    week_label: entry.label,
                    url,
                }),
                Err(e) if e.is_transport() => return Err(e),
                Err(e) => {
                    warn!("Skipping '{}' of course '{}': {}", entry.label, course.name, e);
                    discovery.failures.push(WeekFailure {
                        label: entry.label,
                        error: e,
                    });
                }
            }
        }
        Ok(discovery)
    }
}
