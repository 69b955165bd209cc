use crate::config::PipelineConfig;
use crate::error::{ServiceError, ServiceResult};
use crate::scan::{child_directories, created_at, extension_pattern, is_blank, matching_file_names};
use crate::types::{JobDetail, JobSummary};
use crate::validation::{sanitize_job_id, validate_job_id};
use std::fs::{self, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use tokio::task::JoinSet;

const CLEAN_VIDEO: &str = "clean.mp4";
const HIGHLIGHTS_DIR: &str = "highlights";
const SCENES_DIR: &str = "scenes";
const JOB_LOG: &str = "log.txt";
const HIGHLIGHT_PATTERN: &str = "*.mp4";
const SCENE_PATTERN: &str = "*.csv";

const JOB_DIR_TARGET: &str = "a job directory";
const JOB_DIR_ACTION: &str = "processing a job directory";

/// Facts gathered from a single job directory
struct JobContents {
    has_clean_video: bool,
    highlights: Vec<String>,
    scenes: Vec<String>,
    created: chrono::DateTime<chrono::Utc>,
}

fn output_directory(config: &PipelineConfig) -> ServiceResult<&Path> {
    if is_blank(&config.output_directory) {
        return Err(ServiceError::configuration(
            "Output directory is not configured.",
        ));
    }
    Ok(Path::new(&config.output_directory))
}

fn inspect_job(job_dir: &Path, metadata: &Metadata) -> ServiceResult<JobContents> {
    let highlight_pattern = extension_pattern(HIGHLIGHT_PATTERN)?;
    let scene_pattern = extension_pattern(SCENE_PATTERN)?;

    let scan = || -> io::Result<JobContents> {
        Ok(JobContents {
            has_clean_video: job_dir.join(CLEAN_VIDEO).is_file(),
            highlights: matching_file_names(&job_dir.join(HIGHLIGHTS_DIR), &highlight_pattern)?,
            scenes: matching_file_names(&job_dir.join(SCENES_DIR), &scene_pattern)?,
            created: created_at(metadata)?,
        })
    };

    scan().map_err(|e| ServiceError::from_io(&e, JOB_DIR_TARGET, JOB_DIR_ACTION))
}

fn summarize(job_dir: &Path, metadata: &Metadata) -> ServiceResult<JobSummary> {
    let contents = inspect_job(job_dir, metadata)?;
    Ok(JobSummary {
        id: job_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        has_clean_video: contents.has_clean_video,
        highlight_count: contents.highlights.len() as u32,
        scene_count: contents.scenes.len() as u32,
        created: contents.created,
    })
}

/// Validate and sanitize `id`, then resolve it under the output directory
fn job_path(config: &PipelineConfig, id: &str) -> ServiceResult<(String, PathBuf)> {
    let output = output_directory(config)?;
    validate_job_id(id)?;
    let safe_id = sanitize_job_id(id);
    let path = output.join(&safe_id);
    Ok((safe_id, path))
}

/// Metadata of the job directory at `job_dir`, `None` if there is no such directory
fn job_directory(job_dir: &Path) -> ServiceResult<Option<Metadata>> {
    match fs::metadata(job_dir) {
        Ok(metadata) if metadata.is_dir() => Ok(Some(metadata)),
        Ok(_) => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(ServiceError::from_io(&e, JOB_DIR_TARGET, JOB_DIR_ACTION)),
    }
}

/// Summaries of every job directory under the output directory, newest first.
///
/// Each job is inspected on its own blocking task; ordering is applied once
/// every task has finished.
pub async fn list_jobs(config: &PipelineConfig) -> ServiceResult<Vec<JobSummary>> {
    let output = output_directory(config)?.to_path_buf();

    let job_dirs = tokio::task::spawn_blocking(move || -> ServiceResult<Vec<(PathBuf, Metadata)>> {
        if !output.is_dir() {
            return Ok(Vec::new());
        }
        child_directories(&output).map_err(|e| {
            ServiceError::from_io(
                &e,
                "the configured output directory",
                "enumerating directories in the configured output directory",
            )
        })
    })
    .await
    .map_err(|e| ServiceError::unexpected(format!("Job enumeration task failed: {}", e)))??;

    let mut tasks = JoinSet::new();
    for (job_dir, metadata) in job_dirs {
        tasks.spawn_blocking(move || summarize(&job_dir, &metadata));
    }

    let mut jobs = Vec::with_capacity(tasks.len());
    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(job)) => jobs.push(job),
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(e) => {
                first_error.get_or_insert(ServiceError::unexpected(format!(
                    "Job inspection task failed: {}",
                    e
                )));
            }
        }
    }

    if let Some(e) = first_error {
        return Err(e);
    }

    jobs.sort_by(|a, b| b.created.cmp(&a.created));
    Ok(jobs)
}

/// Detail view of one job, or `None` if no such job directory exists
pub fn get_job_detail(config: &PipelineConfig, id: &str) -> ServiceResult<Option<JobDetail>> {
    let (safe_id, job_dir) = job_path(config, id)?;
    let Some(metadata) = job_directory(&job_dir)? else {
        return Ok(None);
    };

    let contents = inspect_job(&job_dir, &metadata)?;
    Ok(Some(JobDetail {
        id: safe_id,
        has_clean_video: contents.has_clean_video,
        highlights: contents.highlights,
        scenes: contents.scenes,
        created: contents.created,
    }))
}

/// Raw contents of a job's `log.txt`, or `None` if the job or its log is absent
pub fn get_job_log(config: &PipelineConfig, id: &str) -> ServiceResult<Option<String>> {
    let (_, job_dir) = job_path(config, id)?;
    if job_directory(&job_dir)?.is_none() {
        return Ok(None);
    }

    let bytes = match fs::read(job_dir.join(JOB_LOG)) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(ServiceError::from_io(&e, "the log file", "reading the log file")),
    };
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}
