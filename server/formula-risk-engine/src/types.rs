//! Core types for the formula risk engine (JSON contracts + derived models).

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::reconcile::ComparisonList;

// ---------------------------------------------------------------------------
// Inbound types (JSON contract: what the scoring service sends)
// ---------------------------------------------------------------------------

/// Missing and `null` both decode to the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One scored formula field. Unknown fields are silently ignored; unset
/// fields may be missing or `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFieldRisk {
  pub object_name: String,
  pub field_name: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub label: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub return_type: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub depth: i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub cross_object_hops: i64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub heavy_function_count: i64,
  /// Wire value; anything outside High/Medium/Low is treated as unknown.
  #[serde(default, deserialize_with = "null_as_default")]
  pub risk_level: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub cpu_score: f64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub cpu_red_flags: String,
  #[serde(default, deserialize_with = "null_as_default")]
  pub uses_record_type_or_user: bool,
  #[serde(default, deserialize_with = "null_as_default")]
  pub is_formula_too_long: bool,
  #[serde(default, deserialize_with = "null_as_default")]
  pub is_non_deterministic: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub original_formula: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub optimized_formula: Option<String>,
  /// Multi-line dependency descriptor ("- Type: Name" per line).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub deps: Option<String>,
  /// Free-text CPU forecast narrative.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub forecast_score: Option<String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub dna: BTreeMap<String, String>,
  #[serde(default, deserialize_with = "null_as_default")]
  pub cpu_time_ms: f64,
  #[serde(default, deserialize_with = "null_as_default")]
  pub wall_time_ms: f64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub record_count: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub total_records: Option<u64>,
}

/// One entry of the object picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectInfo {
  pub label: String,
  pub api_name: String,
}

/// Binary input: one batch for one object.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchInput {
  #[serde(default)]
  pub object_name: Option<String>,
  pub rows: Vec<RawFieldRisk>,
}

// ---------------------------------------------------------------------------
// Risk level (normalized)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
  High,
  Medium,
  Low,
  Unknown,
}

impl RiskLevel {
  /// Exact match on the wire value; everything else is `Unknown`.
  pub fn from_wire(s: &str) -> Self {
    match s {
      "High" => Self::High,
      "Medium" => Self::Medium,
      "Low" => Self::Low,
      _ => Self::Unknown,
    }
  }

  pub fn css_class(self) -> &'static str {
    match self {
      Self::High => "slds-text-color_error",
      Self::Medium => "slds-text-color_warning",
      Self::Low => "slds-text-color_success",
      Self::Unknown => "",
    }
  }

  pub fn icon(self) -> &'static str {
    match self {
      Self::High => "utility:warning",
      Self::Medium => "utility:info",
      Self::Low => "utility:check",
      Self::Unknown => "",
    }
  }
}

// ---------------------------------------------------------------------------
// Presentation row
// ---------------------------------------------------------------------------

/// RawFieldRisk plus the derived display fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayFieldRisk {
  #[serde(flatten)]
  pub raw: RawFieldRisk,
  pub risk_level_class: String,
  pub risk_level_icon: String,
  /// "{recordCount} / {totalRecords}"
  pub coverage: String,
  /// recordCount / totalRecords; `None` when the total is zero or missing.
  pub coverage_ratio: Option<f64>,
}

// ---------------------------------------------------------------------------
// Dependency graph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdge {
  pub source_field: String,
  /// Lower-cased category ("flow", "apex", "field", ...).
  pub component_type: String,
  pub target_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphNode {
  pub id: String,
  pub category: String,
  pub color: String,
}

/// Directed link `source -> target`, labelled with the component type and
/// colored by the target node's category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphLink {
  pub source: String,
  pub target: String,
  pub label: String,
  pub color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphModel {
  pub nodes: Vec<GraphNode>,
  pub links: Vec<GraphLink>,
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

pub const FORECAST_LABELS: [&str; 3] = ["Now", "6 Months", "1 Year"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ForecastSeries {
  pub labels: [&'static str; 3],
  /// Buckets in fixed order: now, 6 months, 1 year.
  pub scores: [u32; 3],
}

impl Default for ForecastSeries {
  fn default() -> Self {
    Self {
      labels: FORECAST_LABELS,
      scores: [0; 3],
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldForecast {
  pub field_name: String,
  pub series: ForecastSeries,
}

// ---------------------------------------------------------------------------
// DNA metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DnaLevel {
  High,
  Medium,
  Low,
  Other,
}

impl DnaLevel {
  pub fn from_str_loose(s: &str) -> Self {
    match s.trim().to_ascii_lowercase().as_str() {
      "high" => Self::High,
      "medium" => Self::Medium,
      "low" => Self::Low,
      _ => Self::Other,
    }
  }
}

/// Metric name with its display label and legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnaMetric {
  pub name: String,
  pub label: String,
  pub legend: String,
}

/// One metric of one row, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnaEntry {
  #[serde(flatten)]
  pub metric: DnaMetric,
  pub value: DnaLevel,
  pub color: &'static str,
}

/// Heat map: `cells[metric_index][row_index]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DnaMatrix {
  pub metrics: Vec<DnaMetric>,
  pub fields: Vec<String>,
  pub cells: Vec<Vec<DnaLevel>>,
}

impl DnaMatrix {
  pub fn value(&self, metric_index: usize, row_index: usize) -> Option<DnaLevel> {
    self.cells.get(metric_index)?.get(row_index).copied()
  }
}

// ---------------------------------------------------------------------------
// Optimized formula comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonEntry {
  pub index: usize,
  pub original_formula: String,
  pub optimized_formula: String,
  pub devname: String,
  #[serde(rename = "type")]
  pub field_type: String,
  pub label: String,
}

// ---------------------------------------------------------------------------
// Output types (JSON contract: what we emit)
// ---------------------------------------------------------------------------

/// Everything the view layer renders for one batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
  pub batch_id: String,
  pub object_name: String,
  pub rows: Vec<DisplayFieldRisk>,
  pub graph: GraphModel,
  pub forecasts: Vec<FieldForecast>,
  pub dna: DnaMatrix,
  pub comparisons: ComparisonList,
}

/// Structured error output for invalid input.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorOutput {
  pub error: bool,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub field: Option<String>,
}

impl ErrorOutput {
  pub fn new(message: impl Into<String>) -> Self {
    Self {
      error: true,
      message: message.into(),
      field: None,
    }
  }

  pub fn with_field(mut self, field: impl Into<String>) -> Self {
    self.field = Some(field.into());
    self
  }
}
