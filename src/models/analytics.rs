//! Analytics report keys and the consumer-facing report state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::ConsoleError;

/// Inclusive reporting window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Identifies one analytics report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQueryKey {
    #[serde(default)]
    pub entity_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl AnalyticsQueryKey {
    pub fn new(entity_id: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            entity_id: entity_id.into(),
            start_date,
            end_date,
        }
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    /// Whether the entity is known yet; no fetch is issued without one.
    pub fn is_ready(&self) -> bool {
        !self.entity_id.trim().is_empty()
    }

    pub fn validate(&self) -> Result<(), ConsoleError> {
        if matches!(self.entity_id.trim(), "." | "..") {
            return Err(ConsoleError::Validation(format!(
                "entityId {:?} is not a valid id",
                self.entity_id
            )));
        }
        if self.start_date > self.end_date {
            return Err(ConsoleError::Validation(format!(
                "startDate {} is after endDate {}",
                self.start_date, self.end_date
            )));
        }
        Ok(())
    }
}

/// Failure shown next to the report, with a manual retry affordance.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReportError {
    pub code: String,
    pub message: String,
    pub retryable: bool,
}

impl From<&ConsoleError> for ReportError {
    fn from(err: &ConsoleError) -> Self {
        Self {
            code: err.error_code().to_string(),
            message: err.message().to_string(),
            retryable: err.is_retryable(),
        }
    }
}

/// What the dashboard renders for its current key.
#[derive(Debug, Clone, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsView {
    pub key: Option<AnalyticsQueryKey>,
    pub data: Option<serde_json::Value>,
    pub loading: bool,
    pub error: Option<ReportError>,
    /// The session was rejected upstream; the UI must go to sign-in.
    pub sign_in_required: bool,
}
