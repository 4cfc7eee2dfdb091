#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use serde_json::{Value, json};
use tokio::sync::Semaphore;

use energywise_portal::AppState;
use energywise_portal::backend::{Backend, BackendError, ChatTurn, Endpoint, FilePayload};
use energywise_portal::chat::WidgetStore;
use energywise_portal::config::{
    AppConfig, BackendConfig, ChatConfig, LoggingConfig, ServerConfig,
};
use energywise_portal::server::build_router;

/// One backend request as the double saw it.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Message(ChatTurn),
    Upload {
        session_id: String,
        file_name: String,
        mime_type: String,
    },
    Analyze(String),
    Compare { current: Value, previous: Value },
}

/// In-memory backend that records every call.
///
/// A held backend parks each request until [`RecordingBackend::release`] is
/// called, so tests can observe the busy state.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    calls: Mutex<Vec<Call>>,
    failing: AtomicBool,
    gate: Option<Arc<Semaphore>>,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        let backend = Self::default();
        backend.failing.store(true, Ordering::SeqCst);
        Arc::new(backend)
    }

    pub fn held() -> Arc<Self> {
        Arc::new(Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        })
    }

    /// Let one parked request through.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn record(&self, call: Call, endpoint: Endpoint) -> Result<(), BackendError> {
        self.calls.lock().unwrap().push(call);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(BackendError::Status {
                endpoint,
                status: 500,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn send_message(&self, turn: &ChatTurn) -> Result<String, BackendError> {
        self.record(Call::Message(turn.clone()), Endpoint::Message)
            .await?;
        Ok("Salve!".to_string())
    }

    async fn upload_attachment(
        &self,
        session_id: &str,
        file: &FilePayload,
    ) -> Result<String, BackendError> {
        self.record(
            Call::Upload {
                session_id: session_id.to_string(),
                file_name: file.name.clone(),
                mime_type: file.mime_type.clone(),
            },
            Endpoint::Upload,
        )
        .await?;
        Ok(format!("Ho ricevuto **{}**", file.name))
    }

    async fn analyze_bill(&self, file: &FilePayload) -> Result<Value, BackendError> {
        self.record(Call::Analyze(file.name.clone()), Endpoint::Analyze)
            .await?;
        Ok(json!({
            "summary": format!("Bolletta {}", file.name),
            "cost_breakdown": ["Energia: 52 €", "Trasporto: 18 €"],
            "saving_tips": ["Usa la lavatrice di sera"],
            "anomalies": [],
        }))
    }

    async fn compare_bills(&self, current: &Value, previous: &Value) -> Result<Value, BackendError> {
        self.record(
            Call::Compare {
                current: current.clone(),
                previous: previous.clone(),
            },
            Endpoint::Compare,
        )
        .await?;
        Ok(json!({
            "consumption_diff": "+12 kWh",
            "cost_diff": "+4 €",
            "anomalies": ["Conguaglio inatteso"],
            "complaint_tips": ["Chiedi la lettura reale del contatore"],
        }))
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
            static_dir: "static".to_string(),
            max_upload_bytes: 1024 * 1024,
        },
        backend: BackendConfig {
            base_url: "http://127.0.0.1:5000".to_string(),
            message_path: "/api/chatbot".to_string(),
            upload_path: "/api/chatbot/upload".to_string(),
            analyze_path: "/upload".to_string(),
            compare_path: "/compare".to_string(),
            timeout_secs: None,
        },
        chat: ChatConfig {
            idle_timeout_secs: 60,
        },
        logging: LoggingConfig { json: false },
    }
}

pub fn test_server(backend: Arc<RecordingBackend>) -> (TestServer, WidgetStore) {
    let widgets = WidgetStore::new();
    let state = AppState {
        widgets: widgets.clone(),
        backend,
        config: Arc::new(test_config()),
    };
    let server = TestServer::new(build_router(state)).unwrap();
    (server, widgets)
}

/// Load the portal page and return the session id of its chat widget.
pub async fn open_portal(server: &TestServer) -> String {
    let page = server.get("/").await.text();
    let marker = r#"data-session-id=""#;
    let start = page.find(marker).expect("page has a chat widget") + marker.len();
    let end = start + page[start..].find('"').unwrap();
    page[start..end].to_string()
}

/// Poll until the widget has no request in flight.
pub async fn wait_until_idle(widgets: &WidgetStore, session_id: &str) {
    let handle = widgets.get(session_id).expect("widget exists");
    for _ in 0..200 {
        if !handle.lock().await.is_processing() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("widget {session_id} stayed busy");
}
