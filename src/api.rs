//! HTTP routes over the catalogs, the status parser and the config store.

use crate::config::{ConfigDto, ConfigStore, PipelineConfig};
use crate::error::{ServiceError, ServiceResult};
use crate::types::Page;
use crate::{jobs, raw_files, status};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ConfigStore>,
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound,
    Configuration(String),
    Unexpected(String),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Configuration(detail) => Self::Configuration(detail),
            ServiceError::InvalidJobId(e) => Self::BadRequest(e.to_string()),
            ServiceError::Unexpected(detail) => Self::Unexpected(detail),
        }
    }
}

#[derive(Serialize)]
struct ProblemDetails {
    title: &'static str,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, title, detail) = match self {
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "Bad Request", Some(detail)),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not Found", None),
            ApiError::Configuration(detail) => {
                warn!(detail = %detail, "Configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Configuration Error",
                    Some(detail),
                )
            }
            ApiError::Unexpected(detail) => {
                error!(detail = %detail, "Unexpected error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Unexpected Error",
                    Some(detail),
                )
            }
        };

        let body = ProblemDetails {
            title,
            status: status.as_u16(),
            detail,
        };
        (status, Json(body)).into_response()
    }
}

/// Optional paging for list endpoints; absent `page` means the full list
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

fn paginate<T: Serialize>(items: Vec<T>, query: &PageQuery) -> ApiResult<Response> {
    let Some(page) = query.page else {
        return Ok(Json(items).into_response());
    };
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);

    if page == 0 {
        return Err(ApiError::BadRequest("page must be at least 1.".to_string()));
    }
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ApiError::BadRequest(format!(
            "pageSize must be between 1 and {}.",
            MAX_PAGE_SIZE
        )));
    }

    Ok(Json(Page::from_items(items, page, page_size)).into_response())
}

/// Run a blocking filesystem operation off the async runtime
async fn blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Unexpected(format!("Worker task failed: {}", e)))?
        .map_err(ApiError::from)
}

fn current_config(state: &AppState) -> ApiResult<Arc<PipelineConfig>> {
    Ok(state.config.cached()?)
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/raw", get(list_raw))
        .route("/api/job", get(list_job_summaries))
        .route("/api/job/:id", get(job_detail))
        .route("/api/job/:id/log", get(job_log))
        .route("/api/status", get(pipeline_status))
        .route("/api/config", get(read_config).post(write_config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn list_raw(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Response> {
    let config = current_config(&state)?;
    let files = blocking(move || raw_files::list_raw_files(&config)).await?;
    paginate(files, &query)
}

async fn list_job_summaries(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Response> {
    let config = current_config(&state)?;
    let jobs = jobs::list_jobs(&config).await?;
    paginate(jobs, &query)
}

async fn job_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let config = current_config(&state)?;
    let detail = blocking(move || jobs::get_job_detail(&config, &id)).await?;
    match detail {
        Some(detail) => Ok(Json(detail).into_response()),
        None => Err(ApiError::NotFound),
    }
}

async fn job_log(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let config = current_config(&state)?;
    let log = blocking(move || jobs::get_job_log(&config, &id)).await?;
    match log {
        Some(log) => Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], log).into_response()),
        None => Err(ApiError::NotFound),
    }
}

async fn pipeline_status(State(state): State<AppState>) -> ApiResult<Response> {
    let config = current_config(&state)?;
    let snapshot = blocking(move || status::get_status(&config)).await?;
    Ok(Json(snapshot).into_response())
}

async fn read_config(State(state): State<AppState>) -> ApiResult<Json<ConfigDto>> {
    let store = Arc::clone(&state.config);
    match blocking(move || store.load()).await? {
        Some(config) => Ok(Json(config.into())),
        None => Err(ApiError::NotFound),
    }
}

async fn write_config(
    State(state): State<AppState>,
    Json(dto): Json<ConfigDto>,
) -> ApiResult<StatusCode> {
    let store = Arc::clone(&state.config);
    blocking(move || store.save(dto.into())).await?;
    Ok(StatusCode::OK)
}
