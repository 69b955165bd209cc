use crate::error::{ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use glob::{MatchOptions, Pattern};
use std::fs::{self, DirEntry, Metadata};
use std::io;
use std::path::{Path, PathBuf};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Creation time of an entry, or its modification time where the
/// filesystem does not record birth times.
pub fn created_at(metadata: &Metadata) -> io::Result<DateTime<Utc>> {
    let time = match metadata.created() {
        Ok(time) => time,
        Err(e) if e.kind() == io::ErrorKind::Unsupported => metadata.modified()?,
        Err(e) => return Err(e),
    };
    Ok(DateTime::<Utc>::from(time))
}

/// A file found by `matching_files`, with the metadata read while scanning
pub struct MatchedFile {
    pub name: String,
    pub metadata: Metadata,
}

/// Metadata of `entry`, following symlinks.
/// `None` when the entry vanished after `read_dir` listed it or is a dangling link.
fn entry_metadata(entry: &DirEntry) -> io::Result<Option<Metadata>> {
    let metadata = entry.file_type().and_then(|kind| {
        if kind.is_symlink() {
            fs::metadata(entry.path())
        } else {
            entry.metadata()
        }
    });
    match metadata {
        Ok(metadata) => Ok(Some(metadata)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Regular files directly inside `dir` whose name matches `pattern`.
/// Sub-directories are never descended into.
pub fn matching_files(dir: &Path, pattern: &Pattern) -> io::Result<Vec<MatchedFile>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !pattern.matches_with(&name, MATCH_OPTIONS) {
            continue;
        }
        match entry_metadata(&entry)? {
            Some(metadata) if metadata.is_file() => files.push(MatchedFile { name, metadata }),
            _ => {}
        }
    }
    Ok(files)
}

/// File names of `matching_files`, or nothing if `dir` is not a directory
pub fn matching_file_names(dir: &Path, pattern: &Pattern) -> io::Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    Ok(matching_files(dir, pattern)?
        .into_iter()
        .map(|file| file.name)
        .collect())
}

/// Sub-directories directly inside `dir`, with their metadata
pub fn child_directories(dir: &Path) -> io::Result<Vec<(PathBuf, Metadata)>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        match entry_metadata(&entry)? {
            Some(metadata) if metadata.is_dir() => dirs.push((entry.path(), metadata)),
            _ => {}
        }
    }
    Ok(dirs)
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Compile one of the fixed extension patterns used by the catalogs
pub fn extension_pattern(glob: &str) -> ServiceResult<Pattern> {
    Pattern::new(glob)
        .map_err(|e| ServiceError::unexpected(format!("Bad file pattern '{}': {}", glob, e)))
}
