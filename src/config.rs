use crate::error::{ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Pipeline configuration shared with the processing pipeline, persisted as JSON.
///
/// Keys are PascalCase on disk; missing keys take their type defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct PipelineConfig {
    /// Where raw videos wait to be processed
    pub input_directory: String,
    /// Where the pipeline writes job directories and `pipeline.log`
    pub output_directory: String,
    /// Where processed raw videos are moved
    pub archive_directory: String,
    pub enable_highlights: bool,
    pub enable_scenes: bool,
    /// Silence detection threshold in dB
    pub silence_threshold: i32,
}

impl PipelineConfig {
    /// Configuration used when no file has been written yet
    pub fn fallback() -> Self {
        Self {
            input_directory: "./Input".to_string(),
            output_directory: "./Output".to_string(),
            archive_directory: "./Input/Archive".to_string(),
            enable_highlights: true,
            enable_scenes: true,
            silence_threshold: -40,
        }
    }
}

/// The same configuration as exchanged over HTTP (camelCase)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigDto {
    pub input_directory: String,
    pub output_directory: String,
    pub archive_directory: String,
    pub enable_highlights: bool,
    pub enable_scenes: bool,
    pub silence_threshold: i32,
}

impl From<PipelineConfig> for ConfigDto {
    fn from(c: PipelineConfig) -> Self {
        Self {
            input_directory: c.input_directory,
            output_directory: c.output_directory,
            archive_directory: c.archive_directory,
            enable_highlights: c.enable_highlights,
            enable_scenes: c.enable_scenes,
            silence_threshold: c.silence_threshold,
        }
    }
}

impl From<ConfigDto> for PipelineConfig {
    fn from(d: ConfigDto) -> Self {
        Self {
            input_directory: d.input_directory,
            output_directory: d.output_directory,
            archive_directory: d.archive_directory,
            enable_highlights: d.enable_highlights,
            enable_scenes: d.enable_scenes,
            silence_threshold: d.silence_threshold,
        }
    }
}

/// How the cached configuration was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// No configuration file path was given
    NotConfigured,
    /// A path was given but nothing exists there yet
    FileMissing,
    Loaded,
}

/// File-backed pipeline configuration with an in-memory cache
pub struct ConfigStore {
    path: Option<PathBuf>,
    cached: RwLock<Option<Arc<PipelineConfig>>>,
}

impl ConfigStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        let path = path.filter(|p| !p.as_os_str().to_string_lossy().trim().is_empty());
        Self {
            path,
            cached: RwLock::new(None),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn require_path(&self) -> ServiceResult<&Path> {
        self.path().ok_or_else(|| {
            ServiceError::configuration("Pipeline configuration file path is not configured.")
        })
    }

    /// Read the configuration file. `None` if it does not exist yet.
    pub fn load(&self) -> ServiceResult<Option<PipelineConfig>> {
        let path = self.require_path()?;
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(path).map_err(|_| {
            ServiceError::configuration(format!(
                "Failed to read configuration file at '{}'.",
                path.display()
            ))
        })?;
        let config = serde_json::from_str(&content).map_err(|_| {
            ServiceError::configuration(format!(
                "Failed to deserialize configuration file at '{}'.",
                path.display()
            ))
        })?;
        Ok(Some(config))
    }

    /// Where the configuration would come from if loaded now
    pub fn source(&self) -> ConfigSource {
        match self.path() {
            None => ConfigSource::NotConfigured,
            Some(p) if !p.exists() => ConfigSource::FileMissing,
            Some(_) => ConfigSource::Loaded,
        }
    }

    /// The cached configuration, loading it on first use.
    ///
    /// Falls back to `PipelineConfig::fallback()` when no file is configured or
    /// the file does not exist. Read or parse failures are returned and nothing
    /// is cached, so a later call retries.
    pub fn cached(&self) -> ServiceResult<Arc<PipelineConfig>> {
        if let Some(config) = self.read_cache()? {
            return Ok(config);
        }

        let loaded = match self.path() {
            None => None,
            Some(_) => self.load()?,
        };
        let config = Arc::new(loaded.unwrap_or_else(PipelineConfig::fallback));

        let mut cache = self
            .cached
            .write()
            .map_err(|_| ServiceError::unexpected("Configuration cache lock poisoned"))?;
        // Another caller may have filled the cache meanwhile; keep the first value
        Ok(Arc::clone(cache.get_or_insert(config)))
    }

    fn read_cache(&self) -> ServiceResult<Option<Arc<PipelineConfig>>> {
        let cache = self
            .cached
            .read()
            .map_err(|_| ServiceError::unexpected("Configuration cache lock poisoned"))?;
        Ok(cache.as_ref().map(Arc::clone))
    }

    /// Persist atomically (write temp, then rename) and replace the cached value.
    /// The parent directory must already exist.
    pub fn save(&self, config: PipelineConfig) -> ServiceResult<()> {
        let path = self.require_path()?;

        let content = serde_json::to_string_pretty(&config).map_err(|_| {
            ServiceError::configuration("Failed to serialize pipeline configuration.")
        })?;

        let mut temp_path = path.as_os_str().to_owned();
        temp_path.push(".tmp");
        let temp_path = PathBuf::from(temp_path);

        write_then_rename(&temp_path, path, &content).map_err(|e| {
            warn!(path = %path.display(), error = %e, "Failed to write pipeline configuration");
            match e.kind() {
                io::ErrorKind::PermissionDenied => ServiceError::configuration(format!(
                    "Insufficient permissions to write configuration file at '{}'.",
                    path.display()
                )),
                _ => ServiceError::configuration(format!(
                    "Failed to write configuration file at '{}'.",
                    path.display()
                )),
            }
        })?;

        let mut cache = self
            .cached
            .write()
            .map_err(|_| ServiceError::unexpected("Configuration cache lock poisoned"))?;
        *cache = Some(Arc::new(config));

        info!(path = %path.display(), "Saved pipeline configuration");
        Ok(())
    }
}

fn write_then_rename(temp_path: &Path, path: &Path, content: &str) -> io::Result<()> {
    fs::write(temp_path, content)?;
    fs::rename(temp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> PipelineConfig {
        PipelineConfig {
            input_directory: "/videos/in".to_string(),
            output_directory: "/videos/out".to_string(),
            archive_directory: "/videos/archive".to_string(),
            enable_highlights: false,
            enable_scenes: true,
            silence_threshold: -35,
        }
    }

    #[test]
    fn test_load_without_path_is_error() {
        for path in [None, Some(PathBuf::from("")), Some(PathBuf::from("   "))] {
            let store = ConfigStore::new(path);
            assert!(matches!(store.load(), Err(ServiceError::Configuration(_))));
            assert!(matches!(
                store.save(sample()),
                Err(ServiceError::Configuration(_))
            ));
        }
    }

    #[test]
    fn test_load_missing_file_is_none() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(Some(dir.path().join("config.json")));
        assert_eq!(store.load().unwrap(), None);
        assert_eq!(store.source(), ConfigSource::FileMissing);
    }

    #[test]
    fn test_load_reads_pascal_case_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"InputDirectory": "/in", "OutputDirectory": "/out", "SilenceThreshold": -30}"#,
        )
        .unwrap();

        let config = ConfigStore::new(Some(path)).load().unwrap().unwrap();
        assert_eq!(config.input_directory, "/in");
        assert_eq!(config.output_directory, "/out");
        assert_eq!(config.archive_directory, "");
        assert!(!config.enable_highlights);
        assert_eq!(config.silence_threshold, -30);
    }

    #[test]
    fn test_load_invalid_json_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = ConfigStore::new(Some(path)).load().unwrap_err();
        assert!(err.to_string().contains("Failed to deserialize"));
    }

    #[test]
    fn test_save_then_load_roundtrip_and_no_temp_left() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = ConfigStore::new(Some(path.clone()));

        store.save(sample()).unwrap();
        assert_eq!(store.load().unwrap(), Some(sample()));
        assert!(!dir.path().join("config.json.tmp").exists());

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"InputDirectory\""));
    }

    #[test]
    fn test_save_overwrites_and_updates_cache() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(Some(dir.path().join("config.json")));

        assert_eq!(*store.cached().unwrap(), PipelineConfig::fallback());

        store.save(sample()).unwrap();
        let mut second = sample();
        second.silence_threshold = -50;
        store.save(second.clone()).unwrap();

        assert_eq!(*store.cached().unwrap(), second);
        assert_eq!(store.load().unwrap(), Some(second));
    }

    #[test]
    fn test_save_into_missing_directory_is_error() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::new(Some(dir.path().join("missing").join("config.json")));
        let err = store.save(sample()).unwrap_err();
        assert!(matches!(err, ServiceError::Configuration(_)));
    }

    #[test]
    fn test_cached_without_path_uses_fallback() {
        let store = ConfigStore::new(None);
        assert_eq!(store.source(), ConfigSource::NotConfigured);
        assert_eq!(*store.cached().unwrap(), PipelineConfig::fallback());
    }

    #[test]
    fn test_cached_is_served_from_memory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"InputDirectory": "/first"}"#).unwrap();
        let store = ConfigStore::new(Some(path.clone()));

        assert_eq!(store.cached().unwrap().input_directory, "/first");
        fs::write(&path, r#"{"InputDirectory": "/second"}"#).unwrap();
        assert_eq!(store.cached().unwrap().input_directory, "/first");
    }

    #[test]
    fn test_dto_conversion_uses_camel_case() {
        let dto = ConfigDto::from(sample());
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["inputDirectory"], "/videos/in");
        assert_eq!(json["silenceThreshold"], -35);
        assert_eq!(PipelineConfig::from(dto), sample());
    }

    #[test]
    fn test_poisoned_cache_is_unexpected() {
        let store = Arc::new(ConfigStore::new(None));
        let holder = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = holder.cached.write().unwrap();
            panic!("writer died holding the cache lock");
        })
        .join();

        assert!(matches!(store.cached(), Err(ServiceError::Unexpected(_))));
    }
}
