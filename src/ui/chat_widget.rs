//! Chat widget fragments.
//!
//! The widget is a single `#chat-widget` element holding the launcher and the
//! panel. Toggling swaps the whole element; sending and uploading swap only
//! the message list and update the upload preview out-of-band.

use crate::chat::{Attachment, ChatWidget, Message, Rendering, Role, escape_html, format_message};
use crate::ui::icons::{bot_icon, chat_icon, send_icon, upload_icon, x_icon};

/// Delay before a busy message list polls for the reply.
const POLL_DELAY: &str = "700ms";

fn chat_base(session_id: &str) -> String {
    format!("/widgets/chat/{}", escape_html(session_id))
}

/// Full widget: launcher, panel, history, preview and input area.
#[must_use]
pub fn render_chat_widget(widget: &ChatWidget) -> String {
    let base = chat_base(widget.session_id());
    let launcher_class = if widget.is_open() {
        "chatbot-icon hidden"
    } else {
        "chatbot-icon"
    };
    let window_class = if widget.is_open() {
        "chatbot-window open"
    } else {
        "chatbot-window"
    };
    let messages = render_messages(widget);
    let preview = render_upload_preview(widget.session_id(), widget.staged());

    format!(
        r##"<div id="chat-widget" class="chatbot" data-session-id="{session}">
    <button type="button" class="{launcher_class}" aria-label="Apri la chat"
            hx-post="{base}/toggle" hx-target="#chat-widget" hx-swap="outerHTML">
        {launcher_icon}
    </button>
    <div class="{window_class}" role="dialog" aria-label="EnergyBot">
        <div class="chatbot-header">
            <div class="chatbot-title">
                {bot_avatar}
                <span>EnergyBot</span>
            </div>
            <button type="button" class="chatbot-close" aria-label="Chiudi la chat"
                    hx-post="{base}/toggle" hx-target="#chat-widget" hx-swap="outerHTML">
                {close_icon}
            </button>
        </div>
        <div id="chatbot-messages" class="chatbot-messages" aria-live="polite"
             hx-on::after-settle="this.scrollTop = this.scrollHeight">
            {messages}
        </div>
        <div id="chatbot-upload-preview" class="chatbot-upload-preview">{preview}</div>
        <div class="chatbot-input">
            <form class="chatbot-upload-form"
                  hx-post="{base}/upload" hx-encoding="multipart/form-data" hx-trigger="change"
                  hx-target="#chatbot-messages" hx-swap="innerHTML"
                  hx-on::after-request="this.reset()">
                <label class="chatbot-upload" aria-label="Carica una bolletta">
                    {upload_icon}
                    <input type="file" name="file" class="chatbot-file-input" accept=".pdf,.jpg,.jpeg,.png" hidden>
                </label>
            </form>
            <form class="chatbot-send-form"
                  hx-post="{base}/messages" hx-target="#chatbot-messages" hx-swap="innerHTML"
                  hx-on::after-request="this.reset()">
                <input type="text" name="message" class="chatbot-message-input"
                       placeholder="Scrivi un messaggio..." autocomplete="off">
                <button type="submit" class="chatbot-send" aria-label="Invia">
                    {send_icon}
                </button>
            </form>
        </div>
    </div>
</div>"##,
        session = escape_html(widget.session_id()),
        launcher_icon = chat_icon("h-6 w-6"),
        bot_avatar = bot_icon("chatbot-logo h-6 w-6"),
        close_icon = x_icon("h-5 w-5"),
        upload_icon = upload_icon("h-5 w-5"),
        send_icon = send_icon("h-5 w-5"),
    )
}

/// The message list. While a request is in flight the list carries a poller
/// that re-fetches it until the reply lands.
#[must_use]
pub fn render_messages(widget: &ChatWidget) -> String {
    let mut html: String = widget.messages().iter().map(render_message).collect();
    if widget.is_processing() {
        html.push_str(&format!(
            r##"<div class="chatbot-poll" hx-get="{base}/messages" hx-trigger="load delay:{POLL_DELAY}" hx-target="#chatbot-messages" hx-swap="innerHTML"></div>"##,
            base = chat_base(widget.session_id()),
        ));
    }
    html
}

/// Message list followed by an out-of-band refresh of the upload preview.
#[must_use]
pub fn render_messages_with_preview(widget: &ChatWidget) -> String {
    format!(
        r#"{messages}<div id="chatbot-upload-preview" class="chatbot-upload-preview" hx-swap-oob="true">{preview}</div>"#,
        messages = render_messages(widget),
        preview = render_upload_preview(widget.session_id(), widget.staged()),
    )
}

/// A single history entry.
#[must_use]
pub fn render_message(message: &Message) -> String {
    match (message.role, message.rendering) {
        (_, Rendering::Typing) => format!(
            r#"<div class="chatbot-message bot-message typing">
    <div class="message-avatar">{avatar}</div>
    <div class="message-content"><div class="typing-indicator"><span></span><span></span><span></span></div></div>
</div>"#,
            avatar = bot_icon("h-6 w-6"),
        ),
        (Role::User, _) => format!(
            r#"<div class="chatbot-message user-message"><div class="message-content">{}</div></div>"#,
            escape_html(&message.text)
        ),
        (Role::Bot, _) => format!(
            r#"<div class="chatbot-message bot-message">
    <div class="message-avatar">{avatar}</div>
    <div class="message-content">{content}</div>
</div>"#,
            avatar = bot_icon("h-6 w-6"),
            content = format_message(&message.text),
        ),
    }
}

/// The removable filename preview, or nothing when no file is staged.
#[must_use]
pub fn render_upload_preview(session_id: &str, staged: Option<&Attachment>) -> String {
    let Some(file) = staged else {
        return String::new();
    };
    format!(
        r##"<div class="upload-preview-container">
    <span class="upload-filename">{name}</span>
    <button type="button" class="upload-remove" aria-label="Rimuovi il file"
            hx-delete="{base}/attachment" hx-target="#chatbot-upload-preview" hx-swap="innerHTML">
        {icon}
    </button>
</div>"##,
        name = escape_html(&file.name),
        base = chat_base(session_id),
        icon = x_icon("h-4 w-4"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_widget_shows_launcher_only() {
        let widget = ChatWidget::new("user_abc");
        let html = render_chat_widget(&widget);

        assert!(html.contains(r#"class="chatbot-icon""#));
        assert!(html.contains(r#"class="chatbot-window""#));
        assert!(html.contains(r#"hx-post="/widgets/chat/user_abc/toggle""#));
    }

    #[test]
    fn test_open_widget_shows_welcome() {
        let mut widget = ChatWidget::new("user_abc");
        widget.toggle();
        let html = render_chat_widget(&widget);

        assert!(html.contains("chatbot-icon hidden"));
        assert!(html.contains("chatbot-window open"));
        assert!(html.contains("Ciao! Sono EnergyBot"));
        assert_eq!(html.matches("chatbot-message bot-message").count(), 1);
    }

    #[test]
    fn test_user_text_is_escaped_not_formatted() {
        let html = render_message(&Message::user("<b>**ciao**</b>"));
        assert!(html.contains("&lt;b&gt;**ciao**&lt;/b&gt;"));
        assert!(!html.contains("<strong>"));
    }

    #[test]
    fn test_busy_list_polls_and_shows_typing() {
        let mut widget = ChatWidget::new("user_abc");
        widget.begin_send("ciao");
        let html = render_messages(&widget);

        assert!(html.contains("typing-indicator"));
        assert!(html.contains(r#"hx-get="/widgets/chat/user_abc/messages""#));

        widget.finish_send(Ok("Salve!".to_string()));
        let html = render_messages(&widget);
        assert!(!html.contains("typing-indicator"));
        assert!(!html.contains("chatbot-poll"));
    }

    #[test]
    fn test_preview_lists_staged_file() {
        let file = Attachment::new("bolletta <1>.pdf", Some("application/pdf"), vec![]);
        let html = render_upload_preview("user_abc", Some(&file));

        assert!(html.contains("bolletta &lt;1&gt;.pdf"));
        assert!(html.contains(r#"hx-delete="/widgets/chat/user_abc/attachment""#));
        assert!(render_upload_preview("user_abc", None).is_empty());
    }
}
