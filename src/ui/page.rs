//! Full-page HTML.

use crate::chat::ChatWidget;
use crate::ui::bill_form::render_bill_form;
use crate::ui::chat_widget::render_chat_widget;

/// Generate the HTML shell for the portal.
#[must_use]
pub fn html_shell(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="it">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="description" content="Analisi delle bollette e assistente virtuale EnergyWise">
    <title>{title} - EnergyWise</title>

    <!-- HTMX -->
    <script src="https://unpkg.com/htmx.org@2.0.8/dist/htmx.min.js"></script>

    <link rel="stylesheet" href="/static/app.css">
</head>
<body class="min-h-screen antialiased">
    <header class="site-header">
        <a href="/" class="brand">
            <span>EnergyWise</span>
        </a>
    </header>

    <main id="app" class="container">
        {content}
    </main>

    <footer class="site-footer">
        <p>Servizio clienti 800.123.456</p>
    </footer>
</body>
</html>"#
    )
}

/// Portal page: the bill form plus the chat widget for this page load.
#[must_use]
pub fn portal_page(widget: &ChatWidget) -> String {
    let content = format!(
        "{form}\n{chat}",
        form = render_bill_form(),
        chat = render_chat_widget(widget),
    );
    html_shell("Analisi Bollette", &content)
}
