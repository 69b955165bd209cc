use crate::config::PipelineConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::scan::{created_at, extension_pattern, is_blank, matching_files};
use crate::types::RawFileRecord;
use std::io;
use std::path::Path;

const RAW_VIDEO_PATTERN: &str = "*.mp4";

/// List the raw `.mp4` files waiting in the input directory, newest first.
///
/// A missing input directory is reported as an empty list.
pub fn list_raw_files(config: &PipelineConfig) -> ServiceResult<Vec<RawFileRecord>> {
    if is_blank(&config.input_directory) {
        return Err(ServiceError::configuration(
            "Input directory is not configured.",
        ));
    }

    let dir = Path::new(&config.input_directory);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let pattern = extension_pattern(RAW_VIDEO_PATTERN)?;
    let mut files = scan_raw_files(dir, &pattern).map_err(|e| {
        ServiceError::from_io(
            &e,
            "the configured input directory",
            "enumerating files in the configured input directory",
        )
    })?;

    files.sort_by(|a, b| b.created.cmp(&a.created));
    Ok(files)
}

fn scan_raw_files(dir: &Path, pattern: &glob::Pattern) -> io::Result<Vec<RawFileRecord>> {
    matching_files(dir, pattern)?
        .into_iter()
        .map(|file| -> io::Result<RawFileRecord> {
            Ok(RawFileRecord {
                created: created_at(&file.metadata)?,
                size_bytes: file.metadata.len(),
                file_name: file.name,
            })
        })
        .collect()
}
