// src/constants.rs

pub const UI_WIDTH: usize = 88;
pub const COURSE_NAME_TRUNCATE_LENGTH: usize = 70;
pub const MAX_FILENAME_BYTES: usize = 200;
pub const CONFIG_DIR_NAME: &str = concat!(".", clap::crate_name!());
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const LOG_FILE_NAME: &str = concat!(clap::crate_name!(), ".log");
pub const LOG_FALLBACK_FILE_NAME: &str = "fallback.log";
pub const FINGERPRINT_STORE_FILE: &str = ".moodle-dl-etags.json";
pub const LECTURES_DIR: &str = "Lectures";
pub const DEFAULT_LOGIN_URL: &str = "https://moodle2.gla.ac.uk/login/index.php";
pub const DEFAULT_HOME_URL: &str = "http://moodle2.gla.ac.uk/my/";
pub const DEFAULT_WORKERS: usize = 1;
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const ENV_USERNAME: &str = "MOODLE_USERNAME";
pub const ENV_PASSWORD: &str = "MOODLE_PASSWORD";

pub const SELECTION_HELP: &str = "Enter numbers separated by commas, or dashes to denote a range (e.g. 3,4,6-10 or all).";

/// Markup patterns of the course portal.
pub mod portal {
    /// Class fragment of the course headings on the home page.
    pub const COURSE_TITLE_CLASS: &str = "title";
    /// `id` of a week block, e.g. `section-3`.
    pub const WEEK_ID_PATTERN: &str = r"section-[0-9]";
    /// `aria-label` of a week block, e.g. `Week 3: Introduction`.
    pub const WEEK_LABEL_PATTERN: &str = r"Week [0-9]";
    /// Text that marks lecture material inside a week block.
    pub const LECTURE_MARKER: &str = "Lecture";
    /// Text of the link to the lecture folder on a week sub-page.
    pub const LECTURES_LINK_TEXT: &str = "Lectures";
    /// Query marker of direct file links.
    pub const FORCE_DOWNLOAD_PATTERN: &str = "forcedownload";
    /// Element id Moodle renders when a login attempt is rejected.
    pub const LOGIN_ERROR_ID: &str = "loginerrormessage";
}
