//! The floating chat assistant.
//!
//! A page load creates one [`ChatWidget`] in the [`WidgetStore`] under a fresh
//! session id. Gestures on the page (open, close, send, upload, remove
//! attachment) reach the widget through a [`WidgetHandle`], which performs the
//! backend round-trip and applies its outcome.
//!
//! # Structure
//!
//! - [`widget`]: state flags, history and the begin/finish halves of each exchange
//! - [`store`]: session registry and the async drivers
//! - [`format`]: escaping and bot-reply markup
//! - [`attachment`]: staged files and the accepted MIME types
//! - [`message`]: history entries

pub mod attachment;
pub mod format;
pub mod message;
pub mod store;
pub mod widget;

pub use attachment::{ALLOWED_MIME_TYPES, Attachment};
pub use format::{escape_html, format_message};
pub use message::{Message, Rendering, Role};
pub use store::{WidgetHandle, WidgetStore, generate_session_id};
pub use widget::{
    ChatWidget, SEND_FAILURE_MESSAGE, UNSUPPORTED_FILE_MESSAGE, UPLOAD_FAILURE_MESSAGE,
    UploadStart, WELCOME_MESSAGE, upload_announcement,
};
