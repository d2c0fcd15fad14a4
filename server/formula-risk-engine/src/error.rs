//! Structured error types for the formula risk engine.
//!
//! Malformed dependency lines and forecast text are never errors; they are
//! skipped or defaulted by their parsers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
  /// Row source or object catalog unavailable.
  #[error("fetch: {source_name}: {reason}")]
  Fetch { source_name: String, reason: String },

  /// Formula apply rejected by the backend.
  #[error("update: {field}: {reason}")]
  Update { field: String, reason: String },

  #[error("validation: {field}: {reason}")]
  Validation { field: String, reason: String },

  #[error("report: {0}")]
  Report(String),

  #[error("json: {0}")]
  Json(#[from] serde_json::Error),
}

impl EngineError {
  pub fn fetch(source_name: &str, reason: impl Into<String>) -> Self {
    Self::Fetch {
      source_name: source_name.to_string(),
      reason: reason.into(),
    }
  }

  pub fn update(field: &str, reason: impl Into<String>) -> Self {
    Self::Update {
      field: field.to_string(),
      reason: reason.into(),
    }
  }

  pub fn validation(field: &str, reason: &str) -> Self {
    Self::Validation {
      field: field.to_string(),
      reason: reason.to_string(),
    }
  }

  pub fn report(msg: impl Into<String>) -> Self {
    Self::Report(msg.into())
  }
}
