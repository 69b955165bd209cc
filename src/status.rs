//! Pipeline status derived from the last meaningful line of `pipeline.log`.
//!
//! Example log lines:
//! ```text
//! [2026-01-21 14:33:12] Processing file: myvideo.mp4
//! [2026-01-21 14:33:15] Stage: silence removal (42%)
//! [2026-01-21 14:33:20] Completed file: myvideo.mp4
//! ```

use crate::config::PipelineConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::scan::is_blank;
use crate::tail::last_non_blank_line;
use crate::types::StatusSnapshot;
use chrono::NaiveDateTime;
use regex::Regex;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

pub const PIPELINE_LOG: &str = "pipeline.log";

const PROCESSING_MARKER: &str = "Processing file:";
const STAGE_MARKER: &str = "Stage:";
const COMPLETED_MARKER: &str = "Completed file:";
const STARTING_STAGE: &str = "Starting";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn timestamp_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\]").expect("valid timestamp regex")
    })
}

/// Trailing `(NN%)` with optional inner whitespace, anchored at the end
fn trailing_percent_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?s)(?P<stage>.*?)\(\s*(?P<percent>\d+)\s*%\)$")
            .expect("valid percentage regex")
    })
}

/// Read the tail of `pipeline.log` in the output directory and classify it
pub fn get_status(config: &PipelineConfig) -> ServiceResult<StatusSnapshot> {
    if is_blank(&config.output_directory) {
        return Err(ServiceError::configuration(
            "Output directory is not configured.",
        ));
    }

    let log_path = Path::new(&config.output_directory).join(PIPELINE_LOG);
    let last_line = match read_last_line(&log_path) {
        Ok(line) => line,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(StatusSnapshot::idle()),
        Err(_) => {
            return Err(ServiceError::configuration(
                "Unable to read pipeline status log.",
            ))
        }
    };

    Ok(match last_line {
        Some(line) => classify_line(&line),
        None => StatusSnapshot::idle(),
    })
}

fn read_last_line(path: &Path) -> io::Result<Option<String>> {
    let mut file = File::open(path)?;
    last_non_blank_line(&mut file)
}

/// Map one log line onto the status state machine. The first matching marker wins.
pub fn classify_line(line: &str) -> StatusSnapshot {
    let last_updated = parse_timestamp(line);

    if let Some(file) = text_after(line, PROCESSING_MARKER) {
        return StatusSnapshot {
            is_running: true,
            current_file: Some(file.to_string()),
            stage: Some(STARTING_STAGE.to_string()),
            percent: None,
            last_updated,
        };
    }

    if let Some(rest) = text_after(line, STAGE_MARKER) {
        let (stage, percent) = split_stage(rest);
        return StatusSnapshot {
            is_running: true,
            current_file: None,
            stage: Some(stage),
            percent,
            last_updated,
        };
    }

    if line.contains(COMPLETED_MARKER) {
        return StatusSnapshot {
            last_updated,
            ..StatusSnapshot::idle()
        };
    }

    // Unrecognised format: idle, but keep whatever timestamp the line carried
    StatusSnapshot {
        last_updated,
        ..StatusSnapshot::idle()
    }
}

/// Text following the first occurrence of `marker`, trimmed
fn text_after<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.find(marker)
        .map(|idx| line[idx + marker.len()..].trim())
}

/// Split `silence removal (42%)` into the stage label and its percentage.
/// Without a trailing percentage the whole text is the stage.
fn split_stage(rest: &str) -> (String, Option<u8>) {
    trailing_percent_regex()
        .captures(rest)
        .and_then(|caps| {
            let percent = caps["percent"].parse::<u8>().ok()?;
            Some((caps["stage"].trim().to_string(), Some(percent)))
        })
        .unwrap_or_else(|| (rest.to_string(), None))
}

fn parse_timestamp(line: &str) -> Option<NaiveDateTime> {
    let caps = timestamp_regex().captures(line)?;
    NaiveDateTime::parse_from_str(&caps[1], TIMESTAMP_FORMAT).ok()
}
