use crate::error::JobIdError;
use std::path::Path;

/// Characters refused in a single path segment on any supported host.
/// Superset of the Windows reserved set so ids stay portable.
const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*', '/', '\\'];

/// Check a caller-supplied job id before it is joined onto a directory.
///
/// Rejects blank ids as `Missing`. Ids containing a path separator, a `..`
/// sequence, a control character or a reserved character are `Malformed`, as
/// is anything that is not already a single normal path segment (such as `.`).
pub fn validate_job_id(id: &str) -> Result<(), JobIdError> {
    if id.trim().is_empty() {
        return Err(JobIdError::Missing);
    }

    if id.contains("..")
        || id
            .chars()
            .any(|c| c.is_control() || RESERVED_CHARS.contains(&c))
        || sanitize_job_id(id) != id
    {
        return Err(JobIdError::Malformed);
    }

    Ok(())
}

#[cfg(test)]
pub fn is_valid_job_id(id: &str) -> bool {
    validate_job_id(id).is_ok()
}

/// Reduce an id to its final path segment.
/// Only meaningful after `validate_job_id`, where it is a no-op.
pub fn sanitize_job_id(id: &str) -> String {
    Path::new(id)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        for id in ["job-1", "2026-01-21_myvideo", "my video", "a.b.c", "clip (final)"] {
            assert!(is_valid_job_id(id), "Expected {:?} to be valid", id);
        }
    }

    #[test]
    fn test_blank_ids_are_missing() {
        assert_eq!(validate_job_id(""), Err(JobIdError::Missing));
        assert_eq!(validate_job_id("   "), Err(JobIdError::Missing));
        assert_eq!(validate_job_id("\t\n"), Err(JobIdError::Missing));
    }

    #[test]
    fn test_traversal_and_separators_are_malformed() {
        let bad = [
            "../etc",
            "..",
            ".",
            "a..b",
            "job/other",
            "/root",
            "job\\other",
            "C:\\temp",
            "nul\0byte",
            "what?",
            "star*",
            "pipe|",
            "<tag>",
            "quote\"",
            "bell\u{7}",
        ];
        for id in bad {
            assert_eq!(
                validate_job_id(id),
                Err(JobIdError::Malformed),
                "Expected {:?} to be malformed",
                id
            );
        }
    }

    #[test]
    fn test_sanitize_is_noop_for_valid_ids() {
        for id in ["job-1", "my video", "a.b.c"] {
            assert!(is_valid_job_id(id));
            assert_eq!(sanitize_job_id(id), id);
        }
    }

    #[test]
    fn test_sanitize_keeps_final_segment() {
        assert_eq!(sanitize_job_id("outer/inner"), "inner");
        assert_eq!(sanitize_job_id("."), "");
        assert_eq!(sanitize_job_id(""), "");
    }
}
