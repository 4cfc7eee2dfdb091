//! Client side of the analysis and chatbot backend.
//!
//! The widgets never talk HTTP directly. They go through the [`Backend`]
//! trait, which has one method per endpoint the portal consumes:
//!
//! | Method | Endpoint | Consumed field |
//! |---|---|---|
//! | [`Backend::send_message`] | message | `response` |
//! | [`Backend::upload_attachment`] | chat upload | `response` |
//! | [`Backend::analyze_bill`] | bill analysis | `analysis` |
//! | [`Backend::compare_bills`] | bill comparison | `comparison` |
//!
//! [`HttpBackend`] is the reqwest implementation used in production. Tests
//! substitute their own implementation.

mod http;

pub use http::HttpBackend;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The four backend endpoints, used for logging and error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Message,
    Upload,
    Analyze,
    Compare,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Message => "message",
            Self::Upload => "upload",
            Self::Analyze => "analyze",
            Self::Compare => "compare",
        };
        f.write_str(name)
    }
}

/// Errors raised while talking to the backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Transport failure, or a body that could not be decoded.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid base URL or endpoint path.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The backend answered with a non-success status.
    #[error("{endpoint} endpoint returned status {status}")]
    Status { endpoint: Endpoint, status: u16 },

    /// The body decoded but lacks the field the widget consumes.
    #[error("{endpoint} endpoint response has no `{field}` field")]
    MissingField {
        endpoint: Endpoint,
        field: &'static str,
    },
}

/// JSON body of a chat message request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub session_id: String,
    pub message: String,
}

/// A file travelling to the backend as a multipart part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePayload {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FilePayload {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }
}

/// MIME type for an uploaded file.
///
/// Uses the type the browser declared unless it is missing or the generic
/// octet-stream, in which case it is guessed from the file name.
#[must_use]
pub fn resolve_mime(file_name: &str, declared: Option<&str>) -> String {
    match declared {
        Some(mime) if !mime.is_empty() && mime != "application/octet-stream" => {
            mime.to_ascii_lowercase()
        }
        _ => mime_guess::from_path(file_name)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string(),
    }
}

/// JSON body of a bill comparison request.
#[derive(Debug, Clone, Serialize)]
pub struct CompareRequest<'a> {
    pub current_bill: &'a Value,
    pub previous_bill: &'a Value,
}

/// Response of both chat endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct ChatReply {
    #[serde(default)]
    pub response: Option<String>,
}

/// Response of the analysis endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct AnalysisEnvelope {
    #[serde(default)]
    pub analysis: Value,
}

/// Response of the comparison endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct ComparisonEnvelope {
    #[serde(default)]
    pub comparison: Value,
}

impl ChatReply {
    pub(crate) fn into_text(self, endpoint: Endpoint) -> Result<String, BackendError> {
        self.response.ok_or(BackendError::MissingField {
            endpoint,
            field: "response",
        })
    }
}

impl AnalysisEnvelope {
    pub(crate) fn into_value(self) -> Result<Value, BackendError> {
        if self.analysis.is_null() {
            return Err(BackendError::MissingField {
                endpoint: Endpoint::Analyze,
                field: "analysis",
            });
        }
        Ok(self.analysis)
    }
}

impl ComparisonEnvelope {
    /// A missing or `null` comparison is treated as an empty result.
    pub(crate) fn into_value(self) -> Value {
        if self.comparison.is_null() {
            Value::Object(serde_json::Map::new())
        } else {
            self.comparison
        }
    }
}

/// Backend operations consumed by the widgets.
#[async_trait]
pub trait Backend: Send + Sync + fmt::Debug {
    /// Send a chat message and return the bot's reply text.
    async fn send_message(&self, turn: &ChatTurn) -> Result<String, BackendError>;

    /// Upload a chat attachment and return the bot's reply text.
    async fn upload_attachment(
        &self,
        session_id: &str,
        file: &FilePayload,
    ) -> Result<String, BackendError>;

    /// Analyse one bill file. Returns the opaque `analysis` value.
    async fn analyze_bill(&self, file: &FilePayload) -> Result<Value, BackendError>;

    /// Compare two prior analyses. Returns the opaque `comparison` value.
    async fn compare_bills(&self, current: &Value, previous: &Value)
    -> Result<Value, BackendError>;
}
