use crate::error::AppError;
use crate::routes::caller::Caller;
use crate::state::AppState;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use backup_core::auth::Action;
use backup_core::catalog::{Backup, CatalogStats, DEFAULT_RECENT_LIMIT};
use backup_core::restore::TableSelector;
use backup_core::{Category, ExportFormat};
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

pub fn router(_state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_backups).post(create_backup))
        .route("/recent", get(recent_backups))
        .route("/stats", get(backup_stats))
        .route("/cleanup", post(cleanup_backups))
        .route("/archives/{dir}", get(download_archive))
        .route("/{dir}", get(get_backup).delete(delete_backup))
        // Every second-level GET is a file download, so an exported file may
        // be called anything. `restore` is only special for POST.
        .route("/{dir}/{filename}", get(download_file).post(restore_backup))
}

const RESTORE_ACTION: &str = "restore";

/// Run a storage-bound backup operation off the async runtime.
async fn run_blocking<T, F>(state: &Arc<AppState>, f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&AppState) -> backup_core::Result<T> + Send + 'static,
{
    let state = state.clone();
    let result = tokio::task::spawn_blocking(move || f(&state))
        .await
        .map_err(|e| anyhow::anyhow!(e))?;
    Ok(result?)
}

fn attachment(file_name: &str) -> String {
    format!("attachment; filename=\"{}\"", file_name.replace('"', "_"))
}

// ── Listing ──

async fn list_backups(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<serde_json::Value>, AppError> {
    state.authorize(caller.principal(), Action::View)?;

    let listing = run_blocking(&state, |s| s.backups.catalog.list()).await?;
    let stats = CatalogStats::from_backups(&listing.backups);

    Ok(Json(json!({
        "backups": listing.backups,
        "skipped": listing.skipped,
        "stats": stats,
    })))
}

#[derive(Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// Dashboard widget: the newest few backups plus totals over all of them.
async fn recent_backups(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<RecentQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.authorize(caller.principal(), Action::View)?;

    let limit = query.limit.unwrap_or(DEFAULT_RECENT_LIMIT);
    let mut listing = run_blocking(&state, |s| s.backups.catalog.list()).await?;
    let stats = CatalogStats::from_backups(&listing.backups);
    listing.backups.truncate(limit);

    Ok(Json(json!({
        "backups": listing.backups,
        "stats": stats,
    })))
}

async fn backup_stats(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<CatalogStats>, AppError> {
    state.authorize(caller.principal(), Action::View)?;
    let stats = run_blocking(&state, |s| s.backups.catalog.stats()).await?;
    Ok(Json(stats))
}

async fn get_backup(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(dir): Path<String>,
) -> Result<Json<Backup>, AppError> {
    state.authorize(caller.principal(), Action::View)?;
    let backup = run_blocking(&state, move |s| s.backups.catalog.get(&dir)).await?;
    Ok(Json(backup))
}

// ── Create ──

#[derive(Deserialize)]
pub struct CreateBackupRequest {
    #[serde(rename = "type", default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub format: Option<String>,
}

fn default_category() -> String {
    Category::All.to_string()
}

async fn create_backup(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<CreateBackupRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.authorize(caller.principal(), Action::Create)?;

    let category: Category = body.category.parse()?;
    let format: ExportFormat = match body.format.as_deref() {
        Some(f) => f.parse()?,
        None => state.config.backup.export.default_format,
    };

    tracing::info!(category = %category, format = %format, "Creating backup");
    let outcome = run_blocking(&state, move |s| s.backups.producer.create(category, format)).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Backup created successfully: {}", outcome.name),
        "backup": outcome.name,
        "files": outcome.files,
        "output": outcome.output,
    })))
}

// ── Downloads ──

async fn download_file(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((dir, filename)): Path<(String, String)>,
) -> Result<Response, AppError> {
    state.authorize(caller.principal(), Action::Download)?;

    let file = filename.clone();
    let data = run_blocking(&state, move |s| s.backups.catalog.read_file(&dir, &file)).await?;

    let content_type = match filename.rsplit('.').next() {
        Some("json") => "application/json",
        Some("csv") => "text/csv",
        _ => "application/octet-stream",
    };

    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, attachment(&filename)),
        ],
        bytes::Bytes::from(data),
    )
        .into_response())
}

/// Streams the whole backup as a zip. The staged archive is deleted once the
/// response body is dropped, whether or not the client read all of it.
async fn download_archive(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(dir): Path<String>,
) -> Result<Response, AppError> {
    state.authorize(caller.principal(), Action::Download)?;

    let archive = run_blocking(&state, move |s| s.backups.archiver.build(&dir)).await?;
    let file = tokio::fs::File::open(archive.path())
        .await
        .map_err(|e| AppError::Failed(format!("Failed to open archive: {}", e)))?;

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (header::CONTENT_DISPOSITION, attachment(archive.file_name())),
        (header::CONTENT_LENGTH, archive.size().to_string()),
    ];

    let stream = ReaderStream::new(file).map(move |chunk| {
        let _staged = &archive;
        chunk
    });

    Ok((headers, Body::from_stream(stream)).into_response())
}

// ── Delete / restore / cleanup ──

async fn delete_backup(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(dir): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.authorize(caller.principal(), Action::Delete)?;

    let name = dir.clone();
    run_blocking(&state, move |s| s.backups.catalog.delete(&name)).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Backup {} deleted successfully", dir),
    })))
}

#[derive(Deserialize)]
pub struct RestoreRequest {
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_table() -> String {
    TableSelector::All.to_string()
}

async fn restore_backup(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path((dir, action)): Path<(String, String)>,
    Json(body): Json<RestoreRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if action != RESTORE_ACTION {
        return Err(AppError::NotFound(format!("Unknown backup action: {}", action)));
    }
    state.authorize(caller.principal(), Action::Restore)?;

    let table: TableSelector = body.table.parse()?;
    tracing::info!(backup = %dir, table = %table, "Restoring backup");
    let outcome = run_blocking(&state, move |s| s.backups.restorer.restore(&dir, &table)).await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("Backup {} restored successfully ({})", outcome.name, outcome.table),
        "output": outcome.output,
    })))
}

#[derive(Deserialize)]
pub struct CleanupQuery {
    pub days: Option<u32>,
}

async fn cleanup_backups(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Query(query): Query<CleanupQuery>,
) -> Result<Response, AppError> {
    state.authorize(caller.principal(), Action::Cleanup)?;

    let days = query.days.unwrap_or(state.config.backup.retention.days);
    let sweeping = state
        .sweep_lock
        .clone()
        .try_lock_owned()
        .map_err(|_| AppError::Conflict("A cleanup is already running".into()))?;

    // The guard travels with the blocking sweep so it outlives a timed-out request.
    let report = run_blocking(&state, move |s| {
        let _sweeping = sweeping;
        s.backups.sweeper.cleanup_older_than(days)
    })
    .await?;

    let mut message = format!("Removed {} backups older than {} days", report.removed.len(), days);
    if !report.is_clean() {
        message.push_str(&format!(", {} could not be removed", report.failed.len()));
    }
    let status = if report.is_clean() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((
        status,
        Json(json!({
            "success": report.is_clean(),
            "message": message,
            "removed": report.removed,
            "failed": report.failed,
            "kept": report.kept,
        })),
    )
        .into_response())
}
