//! Bill upload form fragments.

use crate::bill::previous_bill_visible;
use crate::chat::escape_html;
use crate::ui::icons::loader_icon;

const ACCEPTED_FILES: &str = ".pdf,.jpg,.jpeg,.png";

/// The form and the empty output area its results are swapped into.
///
/// Duplicate submissions are dropped client-side while one is in flight, the
/// submit button is disabled and the spinner shown for the duration.
#[must_use]
pub fn render_bill_form() -> String {
    format!(
        r##"<section class="bill-upload card">
    <h2 class="card-title">Analizza la tua bolletta</h2>
    <form id="uploadForm"
          hx-post="/widgets/bill/analyze" hx-encoding="multipart/form-data"
          hx-target="#analysis-output" hx-swap="innerHTML"
          hx-indicator="#loadingSpinner" hx-disabled-elt="#analyzeBtn" hx-sync="this:drop">
        <div class="form-group">
            <label for="billFile">Bolletta da analizzare (PDF, JPG, PNG)</label>
            <input type="file" id="billFile" name="bill_file" accept="{ACCEPTED_FILES}">
        </div>
        <div class="form-check">
            <input type="checkbox" id="compareCheck" name="compare" value="on"
                   hx-on:change="document.getElementById('previousBillUpload').classList.toggle('d-none', !this.checked)">
            <label for="compareCheck">Confronta con una bolletta precedente</label>
        </div>
        {previous}
        <button type="submit" id="analyzeBtn" class="btn btn-primary">Analizza bolletta</button>
        <div id="loadingSpinner" class="htmx-indicator" role="status">
            {spinner} Analisi in corso...
        </div>
    </form>
</section>
<div id="analysis-output"></div>"##,
        previous = render_previous_bill_input(false),
        spinner = loader_icon("h-5 w-5"),
    )
}

/// The previous-bill input, hidden unless the comparison box is ticked.
#[must_use]
pub fn render_previous_bill_input(compare: bool) -> String {
    let class = if previous_bill_visible(compare) {
        "form-group"
    } else {
        "form-group d-none"
    };
    format!(
        r#"<div id="previousBillUpload" class="{class}">
            <label for="previousBillFile">Bolletta precedente</label>
            <input type="file" id="previousBillFile" name="previous_bill_file" accept="{ACCEPTED_FILES}">
        </div>"#
    )
}

/// A blocking error notice shown in place of results.
#[must_use]
pub fn render_alert(message: &str) -> String {
    format!(
        r#"<div class="alert alert-danger" role="alert">{}</div>"#,
        escape_html(message)
    )
}
