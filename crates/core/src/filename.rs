//! Download filenames: `{yyyyMMdd_HHmmss}_{siteShortName}.docx`.

use chrono::{DateTime, Local, NaiveDateTime};

use crate::walkers::sites::short_name;

const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
pub const DOCX_EXTENSION: &str = "docx";

/// Filename for a document generated at `at`, without timezone suffix.
pub fn download_filename(site: &str, at: NaiveDateTime) -> String {
	format!("{}_{}.{DOCX_EXTENSION}", at.format(TIMESTAMP_FORMAT), short_name(site))
}

/// Filename stamped with the current local time.
pub fn download_filename_now(site: &str) -> String {
	let now: DateTime<Local> = Local::now();
	download_filename(site, now.naive_local())
}
