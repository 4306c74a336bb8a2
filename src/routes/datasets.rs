use axum::{
    extract::{
        multipart::{Multipart, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, State,
    },
    http::HeaderValue,
    routing::{get, post},
    Router,
    Json,
};
use bytes::Bytes;
use serde_json::{Map, Value};
use std::sync::Arc;
use crate::{
    AppState,
    error::AppError,
    models::{AnalysisReport, CleanRequest, CleanResponse, UploadResponse},
    services::{
        analyzer,
        cleaner::{self, CleanAction},
        dataset,
    },
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

const UPLOAD_FIELD: &str = "file";

pub fn routes(max_file_size: usize) -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload_csv", post(upload_csv))
        .route("/analyze_data", get(analyze_data))
        .route("/clean_data", post(clean_data))
        .route("/get_cleaned_csv", get(get_cleaned_csv))
        .layer(DefaultBodyLimit::max(max_file_size))
}

/// Allow-listed origins with credentials; methods and headers are mirrored
/// back since wildcards are not allowed alongside credentials.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin {}: {}", origin, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

async fn upload_csv(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let start = std::time::Instant::now();
    let mut multipart = multipart.map_err(|e| AppError::MalformedInput(e.to_string()))?;

    let (filename, data) = read_upload(&mut multipart).await?;
    tracing::info!("Received upload {} ({}KB)", filename, data.len() / 1024);

    let table_name = dataset::table_name_from_filename(&filename);
    let cleaned = run_blocking(move || cleaner::clean_all(&dataset::read_csv(data)?)).await?;

    state.remote.mirror(&table_name, &cleaned, true).await;

    let columns = dataset::column_names(&cleaned);
    let rows = cleaned.height();
    state.store.lock().await.set_current(cleaned, table_name.clone());

    tracing::info!("Upload of {} processed in {:?}", filename, start.elapsed());

    Ok(Json(UploadResponse {
        message: format!("{} loaded and cleaned successfully.", filename),
        table_name,
        columns,
        rows,
    }))
}

async fn read_upload(multipart: &mut Multipart) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::MalformedInput(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::MalformedInput("Uploaded file has no filename".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::MalformedInput(e.to_string()))?;

        return Ok((filename, data));
    }

    Err(AppError::MalformedInput(format!("Missing '{}' field", UPLOAD_FIELD)))
}

async fn analyze_data(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnalysisReport>, AppError> {
    let current = state.store.lock().await.snapshot()?;
    let report = run_blocking(move || analyzer::analyze_current(&current)).await?;
    Ok(Json(report))
}

async fn clean_data(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CleanRequest>, JsonRejection>,
) -> Result<Json<CleanResponse>, AppError> {
    let action = payload
        .map_err(|e| AppError::UnrecognizedAction(e.body_text()))
        .and_then(|Json(request)| CleanAction::parse(&request.action));

    // Held until commit so concurrent cleans apply one after another.
    let mut store = state.store.lock().await;
    let current = store.snapshot()?;
    let action = action?;

    let task = action.clone();
    let cleaned = run_blocking(move || task.apply(&current.frame)).await?;
    let committed = store.commit_cleaned(cleaned)?;
    drop(store);

    // The remote table always receives the full dataset again.
    state.remote.mirror(&committed.table_name, &committed.frame, false).await;

    tracing::info!("Cleaning '{}' done, {} rows", action, committed.frame.height());

    Ok(Json(CleanResponse {
        message: format!("Cleaning '{}' completed successfully.", action),
        rows_after: committed.frame.height(),
    }))
}

/// Runs dataframe work on the blocking pool, off the async workers.
async fn run_blocking<T, F>(task: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task).await?
}

async fn get_cleaned_csv(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Map<String, Value>>>, AppError> {
    let cleaned = state
        .store
        .lock()
        .await
        .last_cleaned()
        .cloned()
        .ok_or(AppError::NoCleanedData)?;

    Ok(Json(dataset::to_records(&cleaned)?))
}
