//! HTTP surface: the portal page and the widget fragment routes.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Form, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State, multipart::MultipartError},
    http::StatusCode,
    response::Html,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::AppState;
use crate::backend::{FilePayload, HttpBackend, resolve_mime};
use crate::bill::{ANALYSIS_FAILURE_ALERT, BillSubmission, BillUploadForm, render_report};
use crate::chat::{Attachment, WidgetHandle, WidgetStore};
use crate::config::AppConfig;
use crate::ui::bill_form::render_alert;
use crate::ui::chat_widget::{
    render_chat_widget, render_messages, render_messages_with_preview, render_upload_preview,
};
use crate::ui::page::portal_page;

/// Upper bound on how often idle widgets are swept.
const REAPER_INTERVAL: Duration = Duration::from_secs(60);

type HandlerError = (StatusCode, String);

/// Build the router over an already assembled state.
pub fn build_router(state: AppState) -> Router {
    let static_dir = state.config.server.static_dir.clone();
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/widgets/chat/{id}/toggle", post(toggle_handler))
        .route(
            "/widgets/chat/{id}/messages",
            get(messages_handler).post(send_handler),
        )
        .route("/widgets/chat/{id}/upload", post(upload_handler))
        .route(
            "/widgets/chat/{id}/attachment",
            axum::routing::delete(remove_attachment_handler),
        )
        .route("/widgets/bill/analyze", post(analyze_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    info!(
        name: "backend.config.loaded",
        base_url = %config.backend.base_url,
        timeout_secs = ?config.backend.timeout_secs,
        "Backend configuration loaded"
    );

    let widgets = WidgetStore::new();
    let idle_timeout = Duration::from_secs(config.chat.idle_timeout_secs);
    widgets.spawn_reaper(idle_timeout, REAPER_INTERVAL.min(idle_timeout));

    let state = AppState {
        widgets,
        backend,
        config: Arc::clone(&config),
    };
    let app = build_router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - Portal page with a fresh chat widget.
async fn index_handler(State(state): State<AppState>) -> Html<String> {
    let (id, handle) = state.widgets.create();
    info!(name: "chat.widget.created", session_id = %id, "Chat widget created");
    let widget = handle.lock().await;
    Html(portal_page(&widget))
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "widgets": state.widgets.len(),
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Chat Widget Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// The widget for `id`. An evicted widget is recreated so a long-open page
/// keeps working; only malformed ids are rejected.
fn widget(state: &AppState, id: &str) -> Result<WidgetHandle, HandlerError> {
    state
        .widgets
        .get_or_create(id)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown chat session: {id}")))
}

/// POST /widgets/chat/:id/toggle
async fn toggle_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, HandlerError> {
    let handle = widget(&state, &id)?;
    handle.toggle().await;
    let widget = handle.lock().await;
    Ok(Html(render_chat_widget(&widget)))
}

/// GET /widgets/chat/:id/messages - Polled while a reply is pending.
async fn messages_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, HandlerError> {
    let handle = widget(&state, &id)?;
    let widget = handle.lock().await;
    Ok(Html(render_messages_with_preview(&widget)))
}

#[derive(Debug, Deserialize)]
struct SendForm {
    #[serde(default)]
    message: String,
}

/// POST /widgets/chat/:id/messages
///
/// Returns as soon as the user message and typing indicator are in place; the
/// reply is picked up by the list's poller.
async fn send_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<SendForm>,
) -> Result<Html<String>, HandlerError> {
    let handle = widget(&state, &id)?;
    // Detached: the exchange finishes on its own.
    let _exchange = handle
        .start_send(Arc::clone(&state.backend), &form.message)
        .await;
    let widget = handle.lock().await;
    Ok(Html(render_messages(&widget)))
}

/// POST /widgets/chat/:id/upload
///
/// A body that cannot be read, including one over the size limit, counts as a
/// failed upload and is answered with the apology rather than an error status.
async fn upload_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Html<String>, HandlerError> {
    let handle = widget(&state, &id)?;

    match read_attachment(&mut multipart).await {
        Ok(attachment) => {
            let (_start, _exchange) = handle
                .start_upload(Arc::clone(&state.backend), attachment)
                .await;
        }
        Err(e) => {
            log_multipart_error(&e);
            handle.fail_upload().await;
        }
    }
    let widget = handle.lock().await;
    Ok(Html(render_messages_with_preview(&widget)))
}

/// DELETE /widgets/chat/:id/attachment
async fn remove_attachment_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, HandlerError> {
    let handle = widget(&state, &id)?;
    handle.remove_attachment().await;
    let widget = handle.lock().await;
    Ok(Html(render_upload_preview(widget.session_id(), widget.staged())))
}

// ─────────────────────────────────────────────────────────────────────────────
// Bill Form Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// POST /widgets/bill/analyze
///
/// Failures are rendered as an alert with status 200 so the fragment is
/// swapped into the output area.
async fn analyze_handler(State(state): State<AppState>, mut multipart: Multipart) -> Html<String> {
    let submission = match read_submission(&mut multipart).await {
        Ok(submission) => submission,
        Err(e) => {
            log_multipart_error(&e);
            return Html(render_alert(ANALYSIS_FAILURE_ALERT));
        }
    };

    let form = BillUploadForm::new(Arc::clone(&state.backend));
    let html = match form.submit(submission).await {
        Ok(report) => render_report(&report),
        Err(e) => render_alert(e.alert()),
    };
    Html(html)
}

// ─────────────────────────────────────────────────────────────────────────────
// Multipart Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// A file read from a multipart field.
struct FormFile {
    name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

impl FormFile {
    fn into_payload(self) -> FilePayload {
        let mime_type = resolve_mime(&self.name, self.content_type.as_deref());
        FilePayload::new(self.name, mime_type, self.bytes)
    }
}

/// Read a file field. Browsers send an empty filename when nothing was
/// selected, which counts as no file.
async fn read_file_field(
    field: axum::extract::multipart::Field<'_>,
) -> Result<Option<FormFile>, MultipartError> {
    let name = field.file_name().unwrap_or_default().to_string();
    if name.is_empty() {
        return Ok(None);
    }
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await?;
    Ok(Some(FormFile {
        name,
        content_type,
        bytes: bytes.to_vec(),
    }))
}

/// The chat upload form: a single `file` field.
async fn read_attachment(multipart: &mut Multipart) -> Result<Option<Attachment>, MultipartError> {
    let mut file = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            file = read_file_field(field).await?;
        }
    }
    Ok(file.map(|f| Attachment::new(f.name, f.content_type.as_deref(), f.bytes)))
}

/// The bill form: `bill_file`, `previous_bill_file` and the `compare` box.
async fn read_submission(multipart: &mut Multipart) -> Result<BillSubmission, MultipartError> {
    let mut submission = BillSubmission::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("bill_file") => {
                submission.bill = read_file_field(field).await?.map(FormFile::into_payload);
            }
            Some("previous_bill_file") => {
                submission.previous_bill =
                    read_file_field(field).await?.map(FormFile::into_payload);
            }
            Some("compare") => submission.compare = is_checked(&field.text().await?),
            _ => {}
        }
    }
    Ok(submission)
}

fn log_multipart_error(e: &MultipartError) {
    warn!(
        name: "http.multipart.invalid",
        status = e.status().as_u16(),
        error = %e,
        "Failed to read multipart body"
    );
}

fn is_checked(value: &str) -> bool {
    matches!(value, "on" | "true" | "1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkbox_values() {
        assert!(is_checked("on"));
        assert!(is_checked("true"));
        assert!(!is_checked(""));
        assert!(!is_checked("off"));
    }

    #[test]
    fn test_form_file_guesses_missing_mime() {
        let payload = FormFile {
            name: "bolletta.png".to_string(),
            content_type: None,
            bytes: vec![1, 2],
        }
        .into_payload();
        assert_eq!(payload.mime_type, "image/png");
        assert_eq!(payload.bytes, vec![1, 2]);
    }
}
