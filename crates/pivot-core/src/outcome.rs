//! Per-source outcome records for an orchestrated query
//!
//! A query's result is the set of [`SourceOutcome`]s for every source
//! attempted, emitted in completion order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Terminal status of one (request, source) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    /// Served from the cache without invoking the driver
    Cached,
    /// Driver call completed and returned a payload
    Success,
    /// Driver call failed
    Error,
    /// Driver call exceeded the source's configured timeout
    Timeout,
}

/// The result record of a single source within one orchestrated query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOutcome {
    /// Source that produced this outcome
    #[serde(rename = "source")]
    pub source_id: String,
    /// Terminal status
    pub status: OutcomeStatus,
    /// Payload, present for `cached` and `success`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Arc<Value>>,
    /// Failure detail, present for `error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// When the outcome became final
    pub finished_at: DateTime<Utc>,
}

impl SourceOutcome {
    /// A cache hit, emitted without invoking the driver
    pub fn cached(source_id: impl Into<String>, payload: Arc<Value>) -> Self {
        SourceOutcome {
            source_id: source_id.into(),
            status: OutcomeStatus::Cached,
            payload: Some(payload),
            error: None,
            finished_at: Utc::now(),
        }
    }

    /// A completed driver call
    pub fn success(source_id: impl Into<String>, payload: Arc<Value>) -> Self {
        SourceOutcome {
            source_id: source_id.into(),
            status: OutcomeStatus::Success,
            payload: Some(payload),
            error: None,
            finished_at: Utc::now(),
        }
    }

    /// A driver call that exceeded its timeout
    pub fn timeout(source_id: impl Into<String>) -> Self {
        SourceOutcome {
            source_id: source_id.into(),
            status: OutcomeStatus::Timeout,
            payload: None,
            error: None,
            finished_at: Utc::now(),
        }
    }

    /// A failed driver call
    pub fn error(source_id: impl Into<String>, detail: impl Into<String>) -> Self {
        SourceOutcome {
            source_id: source_id.into(),
            status: OutcomeStatus::Error,
            payload: None,
            error: Some(detail.into()),
            finished_at: Utc::now(),
        }
    }
}
