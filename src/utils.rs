// src/utils.rs

use crate::{
    constants,
    error::{AppError, AppResult},
};
use percent_encoding::percent_decode_str;
use regex::Regex;
use std::{
    collections::BTreeSet,
    ffi::OsStr,
    path::{Path, PathBuf},
    sync::LazyLock,
};

static ILLEGAL_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"[\\/*?:"<>|]"#).unwrap());
static WHITESPACE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static SELECTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(-\d+)?(,\d+(-\d+)?)*$").unwrap());

pub fn sanitize_filename(name: &str) -> String {
    let original_name = name.trim();
    if original_name.is_empty() { return "unknown".to_string(); }

    let stem = Path::new(original_name)
        .file_stem()
        .unwrap_or_else(|| OsStr::new(original_name))
        .to_string_lossy()
        .to_uppercase();
    let windows_reserved = [
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
        "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];

    let mut name = if windows_reserved.contains(&stem.as_ref()) {
        format!("_{}", original_name)
    } else {
        original_name.to_string()
    };

    name = ILLEGAL_CHARS_RE.replace_all(&name, " ").into_owned();
    name = WHITESPACE_RE.replace_all(&name, " ").trim().to_string();
    name = name.trim_matches(|c: char| c == '.' || c.is_whitespace()).to_string();
    if name.is_empty() { return "unnamed".to_string(); }

    if name.len() > constants::MAX_FILENAME_BYTES {
        if let (Some(stem_part), Some(ext)) = (Path::new(&name).file_stem(), Path::new(&name).extension()) {
            let stem_part_str = stem_part.to_string_lossy();
            let ext_str = format!(".{}", ext.to_string_lossy());
            let max_stem_bytes = constants::MAX_FILENAME_BYTES.saturating_sub(ext_str.len());
            let truncated_stem = safe_truncate_utf8(&stem_part_str, max_stem_bytes);
            name = format!("{}{}", truncated_stem, ext_str);
        } else {
            name = safe_truncate_utf8(&name, constants::MAX_FILENAME_BYTES).to_string();
        }
    }
    name
}

fn safe_truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes { return s; }
    let mut i = max_bytes;
    while i > 0 && !s.is_char_boundary(i) { i -= 1; }
    &s[..i]
}

pub fn truncate_text(text: &str, max_width: usize) -> String {
    let mut width = 0;
    let mut end_pos = 0;
    for (i, c) in text.char_indices() {
        width += if c.is_ascii() { 1 } else { 2 };
        if width > max_width.saturating_sub(3) {
            end_pos = i;
            break;
        }
    }
    if end_pos == 0 { text.to_string() } else { format!("{}...", &text[..end_pos]) }
}

/// Local filename of a download link: query and fragment stripped, basename kept, percent-decoded.
pub fn decode_filename(url: &str) -> String {
    let without_query = url.split(['?', '#']).next().unwrap_or_default();
    let basename = without_query.rsplit('/').next().unwrap_or_default();
    percent_decode_str(basename).decode_utf8_lossy().into_owned()
}

/// Parses "1,3,5-7" or "all" into sorted, de-duplicated 0-based indices.
///
/// Any entry outside `1..=total_items` rejects the whole input; the error names that entry.
pub fn parse_selection(selection_str: &str, total_items: usize) -> AppResult<Vec<usize>> {
    let compact: String = selection_str.split_whitespace().collect();
    if compact.eq_ignore_ascii_case("all") {
        return Ok((0..total_items).collect());
    }
    if !SELECTION_RE.is_match(&compact) {
        return Err(AppError::UserInputError(format!("Invalid input: '{}'", selection_str.trim())));
    }

    let check = |n: usize| -> AppResult<usize> {
        if n == 0 || n > total_items {
            Err(AppError::UserInputError(format!("Invalid choice: {}", n)))
        } else {
            Ok(n - 1)
        }
    };
    let parse = |s: &str| -> AppResult<usize> {
        s.parse::<usize>()
            .map_err(|_| AppError::UserInputError(format!("Invalid choice: {}", s)))
    };

    let mut indices = BTreeSet::new();
    for part in compact.split(',') {
        if let Some((start, end)) = part.split_once('-') {
            let (start, end) = (parse(start)?, parse(end)?);
            for n in start.min(end)..=start.max(end) {
                indices.insert(check(n)?);
            }
        } else {
            indices.insert(check(parse(part)?)?);
        }
    }
    Ok(indices.into_iter().collect())
}

/// Expands a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}

/// `<root>/<course>/<week>/Lectures`, each component made safe for the filesystem.
pub fn lecture_directory(root: &Path, course_name: &str, week_label: &str) -> PathBuf {
    root.join(sanitize_filename(course_name))
        .join(sanitize_filename(week_label))
        .join(constants::LECTURES_DIR)
}
