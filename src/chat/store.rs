//! Process-wide registry of live chat widgets.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use super::attachment::Attachment;
use super::widget::{ChatWidget, UploadStart};
use crate::backend::Backend;

const ID_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_SUFFIX_LEN: usize = 9;

/// Fresh opaque session identifier, e.g. `user_k3f9a0x2b`.
#[must_use]
pub fn generate_session_id() -> String {
    let mut n = Uuid::new_v4().as_u128();
    let mut id = String::with_capacity(5 + ID_SUFFIX_LEN);
    id.push_str("user_");
    for _ in 0..ID_SUFFIX_LEN {
        id.push(char::from(ID_ALPHABET[(n % 36) as usize]));
        n /= 36;
    }
    id
}

/// Whether `id` has the shape produced by [`generate_session_id`].
#[must_use]
pub fn is_session_id(id: &str) -> bool {
    id.strip_prefix("user_").is_some_and(|suffix| {
        suffix.len() == ID_SUFFIX_LEN && suffix.bytes().all(|b| ID_ALPHABET.contains(&b))
    })
}

/// Shared handle to one widget.
///
/// The lock is held only while state changes; backend calls run with the
/// widget unlocked so reads (and dropped duplicate sends) are never blocked
/// behind a slow backend.
#[derive(Debug, Clone)]
pub struct WidgetHandle {
    inner: Arc<Mutex<ChatWidget>>,
}

impl WidgetHandle {
    fn new(widget: ChatWidget) -> Self {
        Self {
            inner: Arc::new(Mutex::new(widget)),
        }
    }

    /// Lock the widget for reading or rendering.
    pub async fn lock(&self) -> MutexGuard<'_, ChatWidget> {
        self.inner.lock().await
    }

    pub async fn toggle(&self) -> bool {
        self.inner.lock().await.toggle()
    }

    pub async fn remove_attachment(&self) {
        self.inner.lock().await.remove_attachment();
    }

    /// Begin sending a text message.
    ///
    /// The exchange runs detached: only its own completion clears the busy
    /// flag, even if the caller stops waiting. Returns `None` when the send was
    /// dropped (blank input or busy).
    pub async fn start_send(&self, backend: Arc<dyn Backend>, input: &str) -> Option<JoinHandle<()>> {
        let turn = self.inner.lock().await.begin_send(input)?;
        info!(name: "chat.message.sent", session_id = %turn.session_id, "Chat message sent");

        let widget = Arc::clone(&self.inner);
        Some(tokio::spawn(async move {
            let outcome = backend.send_message(&turn).await;
            match &outcome {
                Ok(_) => info!(
                    name: "chat.message.answered",
                    session_id = %turn.session_id,
                    "Chat message answered"
                ),
                Err(e) => warn!(
                    name: "chat.message.failed",
                    session_id = %turn.session_id,
                    error = %e,
                    "Chat message failed"
                ),
            }
            widget.lock().await.finish_send(outcome);
        }))
    }

    /// Begin uploading an attachment. The exchange handle is returned only
    /// when the upload actually started.
    pub async fn start_upload(
        &self,
        backend: Arc<dyn Backend>,
        file: Option<Attachment>,
    ) -> (UploadStart, Option<JoinHandle<()>>) {
        let (start, session_id) = {
            let mut widget = self.inner.lock().await;
            let start = widget.begin_upload(file);
            (start, widget.session_id().to_string())
        };

        let payload = match start {
            UploadStart::Started(payload) => payload,
            UploadStart::Rejected => {
                info!(name: "chat.upload.rejected", session_id = %session_id, "Unsupported attachment type");
                return (UploadStart::Rejected, None);
            }
            UploadStart::Ignored => return (UploadStart::Ignored, None),
        };
        info!(name: "chat.upload.sent", session_id = %session_id, file = %payload.name, "Attachment sent");

        let started = UploadStart::Started(payload.clone());
        let widget = Arc::clone(&self.inner);
        let exchange = tokio::spawn(async move {
            let outcome = backend.upload_attachment(&session_id, &payload).await;
            match &outcome {
                Ok(_) => info!(
                    name: "chat.upload.answered",
                    session_id = %session_id,
                    file = %payload.name,
                    "Attachment processed"
                ),
                Err(e) => warn!(
                    name: "chat.upload.failed",
                    session_id = %session_id,
                    file = %payload.name,
                    error = %e,
                    "Attachment upload failed"
                ),
            }
            widget.lock().await.finish_upload(outcome);
        });
        (started, Some(exchange))
    }

    /// Record an upload whose request body could not be read.
    pub async fn fail_upload(&self) {
        let mut widget = self.inner.lock().await;
        if widget.fail_unread_upload() {
            warn!(name: "chat.upload.unreadable", session_id = %widget.session_id(), "Attachment could not be read");
        }
    }
}

/// Thread-safe store of chat widgets keyed by session id.
#[derive(Debug, Clone, Default)]
pub struct WidgetStore {
    widgets: Arc<RwLock<HashMap<String, WidgetHandle>>>,
}

impl WidgetStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a widget under a fresh session id.
    #[must_use]
    pub fn create(&self) -> (String, WidgetHandle) {
        let id = generate_session_id();
        let handle = WidgetHandle::new(ChatWidget::new(id.clone()));
        self.widgets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), handle.clone());
        (id, handle)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<WidgetHandle> {
        self.widgets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Look up a widget, recreating it under the same id if it was evicted.
    ///
    /// A page outlives the widget's idle timeout, so a well-formed id that is
    /// no longer stored gets a fresh closed widget. Malformed ids return `None`.
    pub fn get_or_create(&self, id: &str) -> Option<WidgetHandle> {
        if !is_session_id(id) {
            return None;
        }
        let mut guard = self.widgets.write().unwrap_or_else(PoisonError::into_inner);
        let handle = guard.entry(id.to_string()).or_insert_with(|| {
            info!(name: "chat.widget.recreated", session_id = %id, "Chat widget recreated");
            WidgetHandle::new(ChatWidget::new(id))
        });
        Some(handle.clone())
    }

    pub fn remove(&self, id: &str) -> Option<WidgetHandle> {
        self.widgets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.widgets.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict widgets idle for longer than `timeout`.
    ///
    /// Widgets that are busy or currently locked are kept. Returns the number
    /// removed.
    pub fn evict_idle(&self, timeout: Duration) -> usize {
        let now = Utc::now();
        let mut guard = self.widgets.write().unwrap_or_else(PoisonError::into_inner);
        let before = guard.len();
        guard.retain(|_, handle| {
            let Ok(widget) = handle.inner.try_lock() else {
                return true;
            };
            if widget.is_processing() {
                return true;
            }
            (now - widget.last_activity())
                .to_std()
                .map_or(true, |idle| idle <= timeout)
        });
        before - guard.len()
    }

    /// Run [`Self::evict_idle`] every `interval` until the runtime shuts down.
    pub fn spawn_reaper(&self, timeout: Duration, interval: Duration) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let removed = store.evict_idle(timeout);
                if removed > 0 {
                    info!(name: "chat.widgets.evicted", removed, remaining = store.len(), "Evicted idle chat widgets");
                }
            }
        })
    }
}
