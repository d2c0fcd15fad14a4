//! Map scored rows into presentation rows.

use crate::aggregate;
use crate::types::*;

/// Derive risk class, icon and coverage for one row. Total over every risk level.
pub fn normalize(raw: &RawFieldRisk) -> DisplayFieldRisk {
  let level = RiskLevel::from_wire(&raw.risk_level);
  DisplayFieldRisk {
    raw: raw.clone(),
    risk_level_class: level.css_class().to_string(),
    risk_level_icon: level.icon().to_string(),
    coverage: aggregate::coverage_label(raw.record_count, raw.total_records),
    coverage_ratio: aggregate::coverage_ratio(raw.record_count, raw.total_records),
  }
}

/// One display row per input row, in input order.
pub fn normalize_batch(rows: &[RawFieldRisk]) -> Vec<DisplayFieldRisk> {
  rows.iter().map(normalize).collect()
}
