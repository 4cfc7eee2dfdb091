//! Bill submission flow.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::backend::{Backend, BackendError, FilePayload};

/// Alert shown when the form is submitted without a bill.
pub const MISSING_FILE_ALERT: &str = "Seleziona un file da analizzare";

/// Alert shown when any step of the analysis fails.
pub const ANALYSIS_FAILURE_ALERT: &str =
    "Si è verificato un errore durante l'analisi. Riprova più tardi.";

/// What the user submitted.
#[derive(Debug, Clone, Default)]
pub struct BillSubmission {
    /// The bill to analyse. Required.
    pub bill: Option<FilePayload>,
    /// An earlier bill to compare against.
    pub previous_bill: Option<FilePayload>,
    /// State of the "compare with a previous bill" checkbox.
    pub compare: bool,
}

impl BillSubmission {
    /// Whether this submission leads to a comparison request.
    #[must_use]
    pub fn wants_comparison(&self) -> bool {
        self.compare && self.previous_bill.is_some()
    }
}

/// Everything the backend returned for one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct BillReport {
    pub analysis: Value,
    /// Present only when a comparison was performed.
    pub comparison: Option<Value>,
}

#[derive(Error, Debug)]
pub enum BillFormError {
    #[error("no bill file selected")]
    MissingPrimaryFile,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl BillFormError {
    /// Text of the alert shown to the user.
    #[must_use]
    pub fn alert(&self) -> &'static str {
        match self {
            Self::MissingPrimaryFile => MISSING_FILE_ALERT,
            Self::Backend(_) => ANALYSIS_FAILURE_ALERT,
        }
    }
}

/// Whether the previous-bill input is shown for a given checkbox state.
#[must_use]
pub fn previous_bill_visible(compare: bool) -> bool {
    compare
}

/// Runs submissions against the backend.
#[derive(Debug, Clone)]
pub struct BillUploadForm {
    backend: Arc<dyn Backend>,
}

impl BillUploadForm {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Analyse the bill and, when requested, compare it with the previous one.
    ///
    /// Steps run strictly in order: bill analysis, previous-bill analysis,
    /// comparison. The first failure aborts the rest and no partial report is
    /// produced.
    pub async fn submit(&self, submission: BillSubmission) -> Result<BillReport, BillFormError> {
        let Some(bill) = submission.bill.as_ref() else {
            return Err(BillFormError::MissingPrimaryFile);
        };

        info!(name: "bill.analysis.started", file = %bill.name, compare = submission.compare, "Analysing bill");

        let result = self.run(bill, &submission).await;
        match &result {
            Ok(report) => info!(
                name: "bill.analysis.completed",
                file = %bill.name,
                compared = report.comparison.is_some(),
                "Bill analysis completed"
            ),
            Err(e) => warn!(
                name: "bill.analysis.failed",
                file = %bill.name,
                error = %e,
                "Bill analysis failed"
            ),
        }
        result
    }

    async fn run(
        &self,
        bill: &FilePayload,
        submission: &BillSubmission,
    ) -> Result<BillReport, BillFormError> {
        let analysis = self.backend.analyze_bill(bill).await?;

        let comparison = match &submission.previous_bill {
            Some(previous) if submission.wants_comparison() => {
                let previous_analysis = self.backend.analyze_bill(previous).await?;
                Some(
                    self.backend
                        .compare_bills(&analysis, &previous_analysis)
                        .await?,
                )
            }
            _ => None,
        };

        Ok(BillReport {
            analysis,
            comparison,
        })
    }
}
