//! Inline SVG icons.
//!
//! Icons are emitted inline so fragments swapped in by htmx carry their own
//! artwork.

/// Common icon size class.
const ICON_SIZE: &str = "h-4 w-4";

fn svg(class: &str, body: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" class="{ICON_SIZE} {class}">{body}</svg>"#
    )
}

/// Send/paper-plane icon.
#[must_use]
pub fn send_icon(class: &str) -> String {
    svg(
        class,
        r#"<line x1="22" y1="2" x2="11" y2="13"/><polygon points="22 2 15 22 11 13 2 9 22 2"/>"#,
    )
}

/// Loader/spinner icon.
#[must_use]
pub fn loader_icon(class: &str) -> String {
    svg(
        &format!("{class} animate-spin"),
        r#"<path d="M21 12a9 9 0 1 1-6.219-8.56"/>"#,
    )
}

/// Close (X) icon.
#[must_use]
pub fn x_icon(class: &str) -> String {
    svg(
        class,
        r#"<line x1="18" y1="6" x2="6" y2="18"/><line x1="6" y1="6" x2="18" y2="18"/>"#,
    )
}

/// Upload (tray with arrow) icon.
#[must_use]
pub fn upload_icon(class: &str) -> String {
    svg(
        class,
        r#"<path d="M21 15v4a2 2 0 0 1-2 2H5a2 2 0 0 1-2-2v-4"/><polyline points="17 8 12 3 7 8"/><line x1="12" y1="3" x2="12" y2="15"/>"#,
    )
}

/// Speech bubble icon used by the chat launcher.
#[must_use]
pub fn chat_icon(class: &str) -> String {
    svg(
        class,
        r#"<path d="M21 15a2 2 0 0 1-2 2H7l-4 4V5a2 2 0 0 1 2-2h14a2 2 0 0 1 2 2z"/>"#,
    )
}

/// Bot avatar icon.
#[must_use]
pub fn bot_icon(class: &str) -> String {
    svg(
        class,
        r#"<rect x="3" y="11" width="18" height="10" rx="2"/><circle cx="12" cy="5" r="2"/><path d="M12 7v4"/><line x1="8" y1="16" x2="8" y2="16"/><line x1="16" y1="16" x2="16" y2="16"/>"#,
    )
}
