//! Chat widget state.
//!
//! [`ChatWidget`] holds two independent flags (`is_open`, `is_processing`),
//! the message history and at most one staged attachment. Every backend
//! exchange is split in two halves, `begin_*` and `finish_*`, so the caller
//! can release the widget while the request is in flight:
//!
//! ```rust
//! use energywise_portal::chat::ChatWidget;
//!
//! let mut widget = ChatWidget::new("user_abc123xyz");
//! widget.toggle();
//!
//! let turn = widget.begin_send("  ciao ").unwrap();
//! assert_eq!(turn.message, "ciao");
//! assert!(widget.is_processing());
//! assert!(widget.begin_send("again").is_none());
//!
//! widget.finish_send(Ok("Salve!".to_string()));
//! assert!(!widget.is_processing());
//! assert_eq!(widget.messages().last().unwrap().text, "Salve!");
//! ```

use chrono::{DateTime, Utc};

use super::attachment::Attachment;
use super::message::Message;
use crate::backend::{BackendError, ChatTurn, FilePayload};

/// Inserted on the first open when the history is empty.
pub const WELCOME_MESSAGE: &str = "Ciao! Sono EnergyBot, l'assistente virtuale di EnergyWise. \
Come posso aiutarti oggi? Posso fornirti informazioni sui nostri prodotti e offerte, \
rispondere a domande sulla tua bolletta o darti consigli per risparmiare energia.";

/// Shown when a text message round-trip fails.
pub const SEND_FAILURE_MESSAGE: &str = "Mi dispiace, si è verificato un errore. \
Riprova più tardi o contatta il nostro servizio clienti al numero 800.123.456.";

/// Shown when an attachment round-trip fails.
pub const UPLOAD_FAILURE_MESSAGE: &str = "Mi dispiace, si è verificato un errore durante \
l'elaborazione della bolletta. Riprova più tardi o contatta il nostro servizio clienti \
al numero 800.123.456.";

/// Shown when the picked file is not a PDF, JPEG or PNG.
pub const UNSUPPORTED_FILE_MESSAGE: &str =
    "Mi dispiace, puoi caricare solo file PDF o immagini (JPG, PNG).";

/// User-side message announcing an uploaded bill.
#[must_use]
pub fn upload_announcement(file_name: &str) -> String {
    format!("Ho caricato la mia bolletta: {file_name}")
}

/// Result of asking the widget to upload a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadStart {
    /// No file, or a request is already in flight. Nothing changed.
    Ignored,
    /// Unsupported type. An error message was appended, nothing is sent.
    Rejected,
    /// Staged and announced. The payload must now go to the backend.
    Started(FilePayload),
}

/// State of one chat widget instance.
#[derive(Debug, Clone)]
pub struct ChatWidget {
    session_id: String,
    is_open: bool,
    is_processing: bool,
    messages: Vec<Message>,
    staged: Option<Attachment>,
    last_activity: DateTime<Utc>,
}

impl ChatWidget {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            is_open: false,
            is_processing: false,
            messages: Vec::new(),
            staged: None,
            last_activity: Utc::now(),
        }
    }

    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.is_open
    }

    #[must_use]
    pub fn is_processing(&self) -> bool {
        self.is_processing
    }

    /// History in display order, including the typing placeholder if shown.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The attachment shown in the upload preview, if any.
    #[must_use]
    pub fn staged(&self) -> Option<&Attachment> {
        self.staged.as_ref()
    }

    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Flip between launcher and panel. Returns the new open state.
    pub fn toggle(&mut self) -> bool {
        self.touch();
        self.is_open = !self.is_open;
        if self.is_open && self.messages.is_empty() {
            self.push(Message::bot(WELCOME_MESSAGE));
        }
        self.is_open
    }

    /// Start sending `input`.
    ///
    /// Returns `None` without touching state when the trimmed input is empty
    /// or a request is already in flight.
    pub fn begin_send(&mut self, input: &str) -> Option<ChatTurn> {
        let message = input.trim();
        if message.is_empty() || self.is_processing {
            return None;
        }
        self.touch();
        self.push(Message::user(message));
        self.show_typing();
        self.is_processing = true;
        Some(ChatTurn {
            session_id: self.session_id.clone(),
            message: message.to_string(),
        })
    }

    /// Apply the outcome of a message round-trip.
    pub fn finish_send(&mut self, outcome: Result<String, BackendError>) {
        self.settle();
        match outcome {
            Ok(reply) => self.push(Message::bot(reply)),
            Err(_) => self.push(Message::bot(SEND_FAILURE_MESSAGE)),
        }
    }

    /// Start uploading `file`.
    pub fn begin_upload(&mut self, file: Option<Attachment>) -> UploadStart {
        let Some(file) = file else {
            return UploadStart::Ignored;
        };
        self.touch();
        if !file.is_allowed() {
            self.push(Message::bot(UNSUPPORTED_FILE_MESSAGE));
            return UploadStart::Rejected;
        }
        if self.is_processing {
            return UploadStart::Ignored;
        }

        let payload = file.to_payload();
        self.push(Message::user(upload_announcement(&file.name)));
        self.staged = Some(file);
        self.show_typing();
        self.is_processing = true;
        UploadStart::Started(payload)
    }

    /// Apply the outcome of an upload round-trip. The preview is cleared on
    /// both paths.
    pub fn finish_upload(&mut self, outcome: Result<String, BackendError>) {
        self.settle();
        self.staged = None;
        match outcome {
            Ok(reply) => self.push(Message::bot(reply)),
            Err(_) => self.push(Message::bot(UPLOAD_FAILURE_MESSAGE)),
        }
    }

    /// Apply a failed upload whose file never reached this widget, such as a
    /// body over the size limit. Returns `false` and changes nothing while a
    /// request is in flight.
    pub fn fail_unread_upload(&mut self) -> bool {
        if self.is_processing {
            return false;
        }
        self.touch();
        self.staged = None;
        self.push(Message::bot(UPLOAD_FAILURE_MESSAGE));
        true
    }

    /// Drop the staged attachment preview. Does not cancel an in-flight upload.
    pub fn remove_attachment(&mut self) {
        self.touch();
        self.staged = None;
    }

    fn settle(&mut self) {
        self.touch();
        self.hide_typing();
        self.is_processing = false;
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    fn show_typing(&mut self) {
        self.messages.push(Message::typing());
    }

    fn hide_typing(&mut self) {
        if let Some(pos) = self.messages.iter().rposition(Message::is_typing) {
            self.messages.remove(pos);
        }
    }

    fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}
