//! Chat history entries.

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

/// How a message's text is turned into HTML.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rendering {
    /// Escaped verbatim.
    Plain,
    /// Escaped, then links, bold, italic and line breaks applied.
    Formatted,
    /// The transient "bot is typing" placeholder. Carries no text.
    Typing,
}

/// A single entry in the chat history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub rendering: Rendering,
}

impl Message {
    /// A message typed (or synthesized) on the user's side.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            rendering: Rendering::Plain,
        }
    }

    /// A reply from the bot, rendered with light formatting.
    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
            rendering: Rendering::Formatted,
        }
    }

    pub(crate) fn typing() -> Self {
        Self {
            role: Role::Bot,
            text: String::new(),
            rendering: Rendering::Typing,
        }
    }

    #[must_use]
    pub fn is_typing(&self) -> bool {
        self.rendering == Rendering::Typing
    }
}
