use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::controller::{ControllerSnapshot, TranslationController};
use crate::error::{UnknownLanguage, UploadRejection};
use crate::language::TargetLanguage;
use crate::state::AppState;
use crate::upload::IncomingFile;
use crate::view;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(new_session))
        .route("/api/health", get(health_check))
        .route("/s/:session_id", get(show_page))
        .route("/s/:session_id/state", get(show_state))
        .route("/s/:session_id/file", post(select_file))
        .route("/s/:session_id/language", post(set_language))
        .route("/s/:session_id/translate", post(translate))
        .route("/s/:session_id/download", get(download))
        .route("/s/:session_id/reset", post(reset))
}

/// Full application with middleware and state attached.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes();
    Router::new()
        .merge(create_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn session_page(session_id: &str) -> Redirect {
    Redirect::to(&format!("/s/{}", session_id))
}

fn missing_session() -> Response {
    (StatusCode::NOT_FOUND, Html(view::render_missing_session())).into_response()
}

fn lookup(state: &AppState, session_id: &str) -> Result<Arc<TranslationController>, Response> {
    state.sessions.get(session_id).ok_or_else(|| {
        debug!("Unknown session {}", session_id);
        missing_session()
    })
}

async fn new_session(State(state): State<AppState>) -> Result<Redirect, Response> {
    if state.sessions.is_full() {
        state.sessions.sweep(Utc::now()).await;
    }
    let (session_id, _) = state.sessions.create().map_err(|e| {
        warn!("Refusing new session: {}", e);
        (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
    })?;
    Ok(session_page(&session_id))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "sessions": state.sessions.len(),
    }))
}

async fn show_page(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Html<String>, Response> {
    let controller = lookup(&state, &session_id)?;
    let snapshot = controller.snapshot().await;
    Ok(Html(view::render_page(&session_id, &snapshot)))
}

async fn show_state(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ControllerSnapshot>, Response> {
    let controller = lookup(&state, &session_id)?;
    Ok(Json(controller.snapshot().await))
}

async fn select_file(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    mut multipart: Multipart,
) -> Result<Redirect, Response> {
    let controller = lookup(&state, &session_id)?;

    let files = match read_files(&mut multipart).await {
        Ok(files) => files,
        Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!("Upload for session {} exceeds the body limit: {}", session_id, e);
            let rejection = UploadRejection::TooLarge {
                limit_mb: state.config.server.max_upload_mb,
            };
            controller.note_rejection(&rejection).await;
            return Ok(session_page(&session_id));
        }
        Err(e) => {
            warn!("Malformed upload for session {}: {}", session_id, e);
            return Err((e.status(), e.body_text()).into_response());
        }
    };

    match controller.widget().accept(files) {
        Ok(Some(file)) => controller.select_file(file).await,
        Ok(None) => {}
        Err(rejection) => controller.note_rejection(&rejection).await,
    }
    Ok(session_page(&session_id))
}

async fn read_files(multipart: &mut Multipart) -> Result<Vec<IncomingFile>, MultipartError> {
    let mut files = Vec::new();
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        // Browsers send an empty part when the picker was cancelled.
        let Some(name) = field.file_name().filter(|n| !n.is_empty()).map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await?;
        files.push(IncomingFile {
            name,
            content_type,
            bytes,
        });
    }
    Ok(files)
}

#[derive(Debug, Deserialize)]
struct LanguageForm {
    target_lang: String,
}

async fn set_language(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Form(form): Form<LanguageForm>,
) -> Result<Redirect, Response> {
    let controller = lookup(&state, &session_id)?;
    let lang: TargetLanguage = form
        .target_lang
        .parse()
        .map_err(|e: UnknownLanguage| {
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        })?;
    controller.set_target_language(lang).await;
    Ok(session_page(&session_id))
}

async fn translate(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Redirect, Response> {
    let controller = lookup(&state, &session_id)?;
    if !controller.spawn_translate().await {
        debug!("Translate ignored for session {}", session_id);
    }
    Ok(session_page(&session_id))
}

async fn download(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, Response> {
    let controller = lookup(&state, &session_id)?;
    let artifact = controller
        .download()
        .await
        .ok_or_else(|| (StatusCode::NOT_FOUND, "No translated file available").into_response())?;

    let content_type = HeaderValue::from_str(&artifact.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&content_disposition(&artifact.filename))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes,
    )
        .into_response())
}

async fn reset(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Redirect, Response> {
    let controller = lookup(&state, &session_id)?;
    controller.reset().await;
    Ok(session_page(&session_id))
}

/// `attachment` header with an ASCII fallback name and an RFC 5987 UTF-8 name.
fn content_disposition(filename: &str) -> String {
    let fallback: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(filename)
    )
}
