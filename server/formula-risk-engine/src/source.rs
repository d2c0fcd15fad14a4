//! External collaborators: row source, formula updater, report sink.
//!
//! Implementations live outside this crate (platform RPC, HTTP, test doubles).

use std::future::Future;

use crate::error::EngineError;
use crate::types::{ObjectInfo, RawFieldRisk};

/// Supplies already-scored rows. A call returns the full batch or fails.
pub trait RowSource {
  fn fetch_field_risks(
    &self,
    object_name: &str,
  ) -> impl Future<Output = Result<Vec<RawFieldRisk>, EngineError>> + Send;

  fn fetch_object_catalog(&self) -> impl Future<Output = Result<Vec<ObjectInfo>, EngineError>> + Send;
}

/// Request to replace a field's formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaUpdate {
  pub object_name: String,
  pub field_name: String,
  pub new_formula: String,
  pub field_type: String,
  pub label: String,
}

/// Applies a formula; fire-and-confirm, no retry.
pub trait FormulaUpdater {
  fn apply_formula(
    &self,
    update: &FormulaUpdate,
  ) -> impl Future<Output = Result<(), EngineError>> + Send;
}

/// Rendered forecast report ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastReport {
  pub image: Vec<u8>,
  pub label: String,
  pub html: String,
}

pub trait ReportSink {
  fn deliver(&self, report: &ForecastReport) -> impl Future<Output = Result<(), EngineError>> + Send;
}
