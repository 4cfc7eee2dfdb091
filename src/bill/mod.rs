//! The bill upload form.
//!
//! One mandatory bill is analysed; an optional previous bill is analysed and
//! compared with it when the comparison checkbox is ticked. The backend's
//! answers are rendered through fixed content-shape rules in [`render`].

pub mod form;
pub mod render;

pub use form::{
    ANALYSIS_FAILURE_ALERT, BillFormError, BillReport, BillSubmission, BillUploadForm,
    MISSING_FILE_ALERT, previous_bill_visible,
};
pub use render::{format_content, format_list, format_list_or, render_report};
