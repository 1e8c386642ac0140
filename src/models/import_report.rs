//! Bulk import report models

use serde::{Deserialize, Serialize};

/// A CSV row that was skipped, with its 1-based data row number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    pub row: usize,
    pub message: String,
}

/// Outcome of one import batch. Failed rows never abort the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub imported: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<RowFailure>,
}

impl ImportReport {
    pub fn total(&self) -> usize {
        self.imported + self.failures.len()
    }

    pub fn record_failure(&mut self, row: usize, message: impl Into<String>) {
        self.failures.push(RowFailure {
            row,
            message: message.into(),
        });
    }
}
