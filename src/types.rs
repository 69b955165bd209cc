use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// An unprocessed input video waiting in the input directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFileRecord {
    pub file_name: String,
    pub size_bytes: u64,
    pub created: DateTime<Utc>,
}

/// One job directory under the output directory, reduced to counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    /// Name of the job directory
    pub id: String,
    /// `clean.mp4` exists in the job root
    pub has_clean_video: bool,
    /// `*.mp4` entries directly inside `highlights/`
    pub highlight_count: u32,
    /// `*.csv` entries directly inside `scenes/`
    pub scene_count: u32,
    pub created: DateTime<Utc>,
}

/// One job directory with the artifact names spelled out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDetail {
    pub id: String,
    pub has_clean_video: bool,
    /// Unordered
    pub highlights: Vec<String>,
    /// Unordered
    pub scenes: Vec<String>,
    pub created: DateTime<Utc>,
}

/// What the pipeline is doing, according to the last line of `pipeline.log`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub is_running: bool,
    pub current_file: Option<String>,
    pub stage: Option<String>,
    pub percent: Option<u8>,
    /// Taken verbatim from the `[YYYY-MM-DD HH:MM:SS]` prefix, no timezone
    pub last_updated: Option<NaiveDateTime>,
}

impl StatusSnapshot {
    /// Nothing running and nothing known
    pub fn idle() -> Self {
        Self::default()
    }
}

/// A single page of an already ordered listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: usize,
    pub page_size: usize,
    pub total_count: usize,
    pub total_pages: usize,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl<T> Page<T> {
    /// Slice `all` into the 1-based `page_number` of `page_size` items.
    /// Callers guarantee `page_number >= 1` and `page_size >= 1`.
    pub fn from_items(all: Vec<T>, page_number: usize, page_size: usize) -> Self {
        let total_count = all.len();
        let total_pages = total_count.div_ceil(page_size);
        let skip = (page_number - 1).saturating_mul(page_size);
        let items = all.into_iter().skip(skip).take(page_size).collect();

        Self {
            items,
            page_number,
            page_size,
            total_count,
            total_pages,
            has_previous_page: page_number > 1,
            has_next_page: page_number < total_pages,
        }
    }
}
