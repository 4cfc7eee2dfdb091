//! Text escaping and the lightweight markup used in bot replies.
//!
//! Bot replies support four rules, applied to already-escaped text:
//!
//! - bare `http://` / `https://` URLs become links opening in a new tab
//! - `**bold**` becomes `<strong>`
//! - `_italic_` becomes `<em>`
//! - newlines become `<br>`
//!
//! Each rule runs over the whole message, so emphasis may wrap a link. Links
//! are swapped for opaque tokens while the emphasis rules run, so an
//! underscore inside a URL never turns into `<em>`.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Delimiters of the token standing in for a link. Private-use code points,
/// stripped from the input beforehand.
const LINK_OPEN: char = '\u{E000}';
const LINK_CLOSE: char = '\u{E001}';

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s<]+").expect("valid url regex"));
static BOLD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("valid bold regex"));
static ITALIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(.*?)_").expect("valid italic regex"));
static LINK_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x{E000}(\d+)\x{E001}").expect("valid link token regex"));

/// Escape text for safe inclusion in HTML content and attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render a bot reply as HTML.
#[must_use]
pub fn format_message(text: &str) -> String {
    let escaped = escape_html(text).replace([LINK_OPEN, LINK_CLOSE], "");

    let mut links: Vec<String> = Vec::new();
    let shielded = URL_RE.replace_all(&escaped, |caps: &Captures<'_>| {
        links.push(caps[0].to_string());
        format!("{LINK_OPEN}{}{LINK_CLOSE}", links.len() - 1)
    });

    let bold = BOLD_RE.replace_all(&shielded, "<strong>$1</strong>");
    let italic = ITALIC_RE.replace_all(&bold, "<em>$1</em>");
    let html = italic.replace('\n', "<br>");

    LINK_TOKEN_RE
        .replace_all(&html, |caps: &Captures<'_>| {
            match caps[1].parse::<usize>().ok().and_then(|i| links.get(i)) {
                Some(href) => {
                    format!(r#"<a href="{href}" target="_blank" rel="noopener">{href}</a>"#)
                }
                None => String::new(),
            }
        })
        .into_owned()
}
