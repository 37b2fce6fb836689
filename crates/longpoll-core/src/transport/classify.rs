//! Classify a JSON status body as pending, errored or complete.

use super::{Outcome, RequestError};
use crate::config::ClassifyConfig;
use serde_json::Value;

/// Pending / error predicates over a parsed status body.
pub trait Classifier: Send + Sync {
    fn is_error(&self, body: &Value) -> bool;
    fn is_pending(&self, body: &Value) -> bool;
}

/// Compares one string field of the body against the configured values.
///
/// Defaults to `result == "error"` / `result == "pending"`. Bodies without the
/// field, or with a non-string value, are neither.
#[derive(Debug, Clone)]
pub struct ResultField {
    field: String,
    pending_value: String,
    error_value: String,
}

impl Default for ResultField {
    fn default() -> Self {
        Self::from_config(&ClassifyConfig::default())
    }
}

impl ResultField {
    pub fn from_config(cfg: &ClassifyConfig) -> Self {
        Self {
            field: cfg.field.clone(),
            pending_value: cfg.pending_value.clone(),
            error_value: cfg.error_value.clone(),
        }
    }

    fn field_equals(&self, body: &Value, expected: &str) -> bool {
        body.get(&self.field).and_then(Value::as_str) == Some(expected)
    }
}

impl Classifier for ResultField {
    fn is_error(&self, body: &Value) -> bool {
        self.field_equals(body, &self.error_value)
    }

    fn is_pending(&self, body: &Value) -> bool {
        self.field_equals(body, &self.pending_value)
    }
}

/// Parses `raw` as JSON and classifies it. Error wins over pending; anything else is complete.
pub fn classify(raw: &str, classifier: &dyn Classifier) -> Outcome {
    let value: Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(e) => return Outcome::Error(RequestError::Parse(e)),
    };
    let body = raw.to_string();
    if classifier.is_error(&value) {
        Outcome::Error(RequestError::MarkedError { body })
    } else if classifier.is_pending(&value) {
        Outcome::Pending { body }
    } else {
        Outcome::Complete { body }
    }
}
