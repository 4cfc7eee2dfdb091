//! Files staged in the chat widget before upload.

use crate::backend::{FilePayload, resolve_mime};

/// MIME types the chat widget accepts. `image/jpg` is a non-standard alias
/// some browsers report for JPEG files.
pub const ALLOWED_MIME_TYPES: &[&str] = &["application/pdf", "image/jpeg", "image/jpg", "image/png"];

/// A file picked in the chat widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Build an attachment, guessing the MIME type from the file name when
    /// the browser sent none or only the generic octet-stream type.
    pub fn new(name: impl Into<String>, mime_type: Option<&str>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let mime_type = resolve_mime(&name, mime_type);
        Self {
            name,
            mime_type,
            bytes,
        }
    }

    /// Whether the chat backend accepts this file type.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        ALLOWED_MIME_TYPES.contains(&self.mime_type.as_str())
    }

    #[must_use]
    pub fn to_payload(&self) -> FilePayload {
        FilePayload::new(self.name.clone(), self.mime_type.clone(), self.bytes.clone())
    }
}
