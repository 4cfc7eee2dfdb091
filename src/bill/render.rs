//! HTML rendering of analysis and comparison results.
//!
//! Result values are opaque JSON. Each named field goes through one of the
//! content-shape rules below; nothing else about the value is assumed.

use serde_json::Value;

use super::form::BillReport;
use crate::chat::escape_html;

pub const NO_INFO_NOTICE: &str = "<p>Nessuna informazione disponibile.</p>";
pub const NO_ITEMS_NOTICE: &str = "<p>Nessun elemento disponibile.</p>";
pub const NO_ANOMALIES_NOTICE: &str = r#"<p class="text-success">Nessuna anomalia rilevata.</p>"#;
pub const NO_COMPARISON_ANOMALIES_NOTICE: &str =
    r#"<p class="text-success">Nessuna anomalia rilevata nel confronto.</p>"#;
pub const NO_COMPLAINTS_NOTICE: &str = "<p>Non sono necessari reclami.</p>";

/// Falsy in the portal's sense: absent, null, false, zero or empty string.
fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null | Value::Bool(false)) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(_) => false,
    }
}

fn has_items(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Array(items)) => !items.is_empty(),
        other => !is_blank(other),
    }
}

fn item_text(item: &Value) -> String {
    match item {
        Value::String(s) => escape_html(s),
        other => escape_html(&other.to_string()),
    }
}

/// Content rule: paragraphs for strings, a list for arrays, a JSON dump for
/// objects.
#[must_use]
pub fn format_content(value: Option<&Value>) -> String {
    if is_blank(value) {
        return NO_INFO_NOTICE.to_string();
    }
    match value {
        Some(Value::String(text)) => text
            .split('\n')
            .map(|paragraph| format!("<p>{}</p>", escape_html(paragraph)))
            .collect(),
        Some(list @ Value::Array(_)) => format_list(Some(list)),
        Some(object @ Value::Object(_)) => format!(
            r#"<pre class="bg-light p-3 rounded">{}</pre>"#,
            escape_html(&format!("{object:#}"))
        ),
        Some(other) => format!("<p>{}</p>", escape_html(&other.to_string())),
        None => NO_INFO_NOTICE.to_string(),
    }
}

/// List rule: one bullet per entry. A lone scalar counts as one entry.
#[must_use]
pub fn format_list(value: Option<&Value>) -> String {
    if !has_items(value) {
        return NO_ITEMS_NOTICE.to_string();
    }
    let items: String = match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| format!(r#"<li class="list-group-item">{}</li>"#, item_text(item)))
            .collect(),
        Some(single) => format!(r#"<li class="list-group-item">{}</li>"#, item_text(single)),
        None => String::new(),
    };
    format!(r#"<ul class="list-group list-group-flush">{items}</ul>"#)
}

/// List rule with a fixed notice in place of the empty list.
#[must_use]
pub fn format_list_or(value: Option<&Value>, notice: &str) -> String {
    if has_items(value) {
        format_list(value)
    } else {
        notice.to_string()
    }
}

fn result_card(title: &str, id: &str, body: &str) -> String {
    format!(
        r#"<div class="result-card">
        <h3 class="result-title">{title}</h3>
        <div id="{id}" class="result-body">{body}</div>
    </div>"#
    )
}

/// Render the results section for a completed submission.
///
/// The comparison section is always present so the page layout is stable;
/// it carries `d-none` when no comparison was performed.
#[must_use]
pub fn render_report(report: &BillReport) -> String {
    let analysis = &report.analysis;

    let analysis_cards = [
        result_card(
            "Riepilogo",
            "summaryResult",
            &format_content(analysis.get("summary")),
        ),
        result_card(
            "Dettaglio dei costi",
            "costBreakdownResult",
            &format_content(analysis.get("cost_breakdown")),
        ),
        result_card(
            "Consigli per risparmiare",
            "savingTipsResult",
            &format_list(analysis.get("saving_tips")),
        ),
        result_card(
            "Anomalie",
            "anomaliesResult",
            &format_list_or(analysis.get("anomalies"), NO_ANOMALIES_NOTICE),
        ),
    ]
    .concat();

    let comparison_section = match &report.comparison {
        Some(comparison) => {
            let cards = [
                result_card(
                    "Differenza nei consumi",
                    "consumptionDiffResult",
                    &format_content(comparison.get("consumption_diff")),
                ),
                result_card(
                    "Differenza nei costi",
                    "costDiffResult",
                    &format_content(comparison.get("cost_diff")),
                ),
                result_card(
                    "Anomalie nel confronto",
                    "comparisonAnomaliesResult",
                    &format_list_or(comparison.get("anomalies"), NO_COMPARISON_ANOMALIES_NOTICE),
                ),
                result_card(
                    "Suggerimenti per reclami",
                    "complaintTipsResult",
                    &format_list_or(comparison.get("complaint_tips"), NO_COMPLAINTS_NOTICE),
                ),
            ]
            .concat();
            format!(r#"<section id="comparisonSection" class="comparison">{cards}</section>"#)
        }
        None => r#"<section id="comparisonSection" class="comparison d-none"></section>"#.to_string(),
    };

    format!(
        r#"<section id="results" class="results">
    <h2>Risultati dell'analisi</h2>
    {analysis_cards}
    {comparison_section}
</section>"#
    )
}
