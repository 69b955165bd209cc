use std::io;
use thiserror::Error;

/// Why a caller-supplied job id was refused before touching the filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JobIdError {
    #[error("Job id must be provided.")]
    Missing,
    #[error("Invalid job id.")]
    Malformed,
}

/// Failures surfaced by the catalog, status and config operations
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A required path is unset, or a configured path could not be read or written
    #[error("{0}")]
    Configuration(String),

    #[error(transparent)]
    InvalidJobId(#[from] JobIdError),

    #[error("{0}")]
    Unexpected(String),
}

impl ServiceError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn unexpected(msg: impl Into<String>) -> Self {
        Self::Unexpected(msg.into())
    }

    /// Translate a filesystem failure against `target` while `action` was in progress.
    ///
    /// Permission problems and every other I/O fault both become configuration
    /// errors, with distinct messages so the caller can tell them apart.
    pub fn from_io(err: &io::Error, target: &str, action: &str) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => {
                Self::Configuration(format!("Access to {} is denied.", target))
            }
            _ => Self::Configuration(format!("An I/O error occurred while {}.", action)),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_denied_mentions_target() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let translated = ServiceError::from_io(
            &err,
            "the configured input directory",
            "enumerating files in the configured input directory",
        );
        assert_eq!(
            translated.to_string(),
            "Access to the configured input directory is denied."
        );
    }

    #[test]
    fn test_other_io_error_mentions_action() {
        let err = io::Error::new(io::ErrorKind::Other, "disk on fire");
        let translated = ServiceError::from_io(&err, "the log file", "reading the log file");
        assert!(matches!(translated, ServiceError::Configuration(_)));
        assert_eq!(
            translated.to_string(),
            "An I/O error occurred while reading the log file."
        );
    }

    #[test]
    fn test_job_id_error_messages() {
        assert_eq!(JobIdError::Missing.to_string(), "Job id must be provided.");
        assert_eq!(JobIdError::Malformed.to_string(), "Invalid job id.");
        let err: ServiceError = JobIdError::Malformed.into();
        assert!(matches!(err, ServiceError::InvalidJobId(JobIdError::Malformed)));
    }
}
