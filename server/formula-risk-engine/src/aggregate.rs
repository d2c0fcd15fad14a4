//! Coverage ratios and DNA metric aggregation for the heat map.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::*;

/// Known DNA metrics, in display order.
pub const DNA_METRICS: [&str; 6] = [
  "complexity",
  "chainDepth",
  "blastRadius",
  "volatility",
  "fragility",
  "usage",
];

pub const COLOR_HIGH: &str = "#e74c3c";
pub const COLOR_MEDIUM: &str = "#f39c12";
pub const COLOR_LOW: &str = "#2ecc71";
pub const COLOR_NEUTRAL: &str = "#bdc3c7";

/// "{recordCount} / {totalRecords}", 0 for missing values.
pub fn coverage_label(record_count: Option<u64>, total_records: Option<u64>) -> String {
  format!(
    "{} / {}",
    record_count.unwrap_or(0),
    total_records.unwrap_or(0)
  )
}

/// Fraction of records sampled; `None` when the total is zero or missing.
pub fn coverage_ratio(record_count: Option<u64>, total_records: Option<u64>) -> Option<f64> {
  match total_records {
    Some(total) if total > 0 => Some(record_count.unwrap_or(0) as f64 / total as f64),
    _ => None,
  }
}

/// "chainDepth" -> "Chain Depth".
pub fn metric_label(name: &str) -> String {
  let mut out = String::with_capacity(name.len() + 4);
  for (i, ch) in name.chars().enumerate() {
    if i == 0 {
      out.extend(ch.to_uppercase());
    } else {
      if ch.is_uppercase() {
        out.push(' ');
      }
      out.push(ch);
    }
  }
  out
}

pub fn metric_legend(name: &str) -> &'static str {
  match name {
    "complexity" => "Functions, operators and nesting in the formula body",
    "chainDepth" => "How many formula fields are resolved before this one",
    "blastRadius" => "Components that recompute or break when this field changes",
    "volatility" => "Use of time-dependent or non-deterministic functions",
    "fragility" => "Reliance on record types, running user or hard-coded values",
    "usage" => "How widely the field is referenced across metadata",
    _ => "",
  }
}

pub fn level_color(level: DnaLevel) -> &'static str {
  match level {
    DnaLevel::High => COLOR_HIGH,
    DnaLevel::Medium => COLOR_MEDIUM,
    DnaLevel::Low => COLOR_LOW,
    DnaLevel::Other => COLOR_NEUTRAL,
  }
}

pub fn describe_metric(name: &str) -> DnaMetric {
  DnaMetric {
    name: name.to_string(),
    label: metric_label(name),
    legend: metric_legend(name).to_string(),
  }
}

/// Known metrics first in fixed order, then unknown names sorted.
fn ordered_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
  let present: BTreeSet<&str> = names.into_iter().collect();
  let mut out: Vec<&str> = DNA_METRICS
    .iter()
    .copied()
    .filter(|m| present.contains(m))
    .collect();
  out.extend(present.iter().copied().filter(|n| !DNA_METRICS.contains(n)));
  out
}

/// Display entries for one row's DNA mapping.
pub fn entries(dna: &BTreeMap<String, String>) -> Vec<DnaEntry> {
  ordered_names(dna.keys().map(String::as_str))
    .into_iter()
    .map(|name| {
      let value = DnaLevel::from_str_loose(&dna[name]);
      DnaEntry {
        metric: describe_metric(name),
        value,
        color: level_color(value),
      }
    })
    .collect()
}

/// Heat map over the batch: all known metrics plus any unknown ones seen.
pub fn build_matrix(rows: &[RawFieldRisk]) -> DnaMatrix {
  let names = ordered_names(
    DNA_METRICS
      .iter()
      .copied()
      .chain(rows.iter().flat_map(|r| r.dna.keys().map(String::as_str))),
  );

  let cells = names
    .iter()
    .map(|name| {
      rows
        .iter()
        .map(|r| {
          r.dna
            .get(*name)
            .map(|v| DnaLevel::from_str_loose(v))
            .unwrap_or(DnaLevel::Other)
        })
        .collect()
    })
    .collect();

  DnaMatrix {
    metrics: names.iter().map(|n| describe_metric(n)).collect(),
    fields: rows.iter().map(|r| r.field_name.clone()).collect(),
    cells,
  }
}
