//! Optimized-formula comparison list and its reconciliation after an apply.

use serde::Serialize;

use crate::error::EngineError;
use crate::types::{ComparisonEntry, RawFieldRisk};

/// Comparison entries with contiguous `index` values (0..n-1).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ComparisonList {
  entries: Vec<ComparisonEntry>,
}

fn present(formula: &Option<String>) -> Option<&str> {
  formula.as_deref().filter(|f| !f.is_empty())
}

impl ComparisonList {
  /// One entry per row carrying both an original and an optimized formula.
  pub fn from_rows(rows: &[RawFieldRisk]) -> Self {
    let entries = rows
      .iter()
      .filter_map(|r| {
        let original = present(&r.original_formula)?;
        let optimized = present(&r.optimized_formula)?;
        Some((r, original, optimized))
      })
      .enumerate()
      .map(|(index, (r, original, optimized))| ComparisonEntry {
        index,
        original_formula: original.to_string(),
        optimized_formula: optimized.to_string(),
        devname: r.field_name.clone(),
        field_type: r.return_type.clone(),
        label: r.label.clone(),
      })
      .collect();
    Self { entries }
  }

  pub fn entries(&self) -> &[ComparisonEntry] {
    &self.entries
  }

  pub fn get(&self, index: usize) -> Option<&ComparisonEntry> {
    self.entries.get(index)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  /// Remove the entry at `index` and re-index the rest.
  ///
  /// An out-of-range index leaves the list untouched.
  pub fn remove_at(&mut self, index: usize) -> Result<ComparisonEntry, EngineError> {
    if index >= self.entries.len() {
      return Err(EngineError::validation("index", "no comparison entry at this position"));
    }
    let removed = self.entries.remove(index);
    self.reindex();
    Ok(removed)
  }

  /// Remove the entry matching `entry` in everything but its index, wherever
  /// it currently sits. Identical duplicates are interchangeable.
  pub fn remove_entry(&mut self, entry: &ComparisonEntry) -> Option<ComparisonEntry> {
    let pos = self.entries.iter().position(|e| {
      e.devname == entry.devname
        && e.original_formula == entry.original_formula
        && e.optimized_formula == entry.optimized_formula
        && e.field_type == entry.field_type
        && e.label == entry.label
    })?;
    self.remove_at(pos).ok()
  }

  fn reindex(&mut self) {
    for (i, entry) in self.entries.iter_mut().enumerate() {
      entry.index = i;
    }
  }
}
