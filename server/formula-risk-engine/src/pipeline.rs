//! Pure pipeline: one raw batch in, one dashboard snapshot out.

use tracing::debug;

use crate::aggregate;
use crate::config::Config;
use crate::deps;
use crate::error::EngineError;
use crate::forecast;
use crate::graph;
use crate::normalize;
use crate::reconcile::ComparisonList;
use crate::types::*;

/// Stable id for a batch: hash of object name + serialized rows.
pub fn batch_id(object_name: &str, rows: &[RawFieldRisk]) -> Result<String, EngineError> {
  let mut hasher = blake3::Hasher::new();
  hasher.update(object_name.as_bytes());
  hasher.update(b"|");
  hasher.update(&serde_json::to_vec(rows)?);
  let hex = hasher.finalize().to_hex();
  Ok(format!("batch-{}", &hex[..16]))
}

/// Derive every view structure from the batch. Deterministic for identical input.
pub fn build_dashboard(
  object_name: &str,
  rows: &[RawFieldRisk],
  config: &Config,
) -> Result<Dashboard, EngineError> {
  let edges = deps::collect_edges(rows, config);
  let graph = graph::build_graph(&edges, config);
  debug!(
    object = object_name,
    rows = rows.len(),
    edges = edges.len(),
    nodes = graph.nodes.len(),
    "built dependency graph"
  );

  Ok(Dashboard {
    batch_id: batch_id(object_name, rows)?,
    object_name: object_name.to_string(),
    rows: normalize::normalize_batch(rows),
    graph,
    forecasts: forecast::collect_forecasts(rows),
    dna: aggregate::build_matrix(rows),
    comparisons: ComparisonList::from_rows(rows),
  })
}

/// Binary entry: the object name falls back to the first row's object.
pub fn run(input: &BatchInput, config: &Config) -> Result<Dashboard, EngineError> {
  let object_name = match &input.object_name {
    Some(name) if !name.is_empty() => name.clone(),
    _ => input
      .rows
      .first()
      .map(|r| r.object_name.clone())
      .ok_or_else(|| EngineError::validation("objectName", "required when rows is empty"))?,
  };
  build_dashboard(&object_name, &input.rows, config)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn make_row(field: &str, deps: &str) -> RawFieldRisk {
    RawFieldRisk {
      object_name: "Opportunity".into(),
      field_name: field.into(),
      risk_level: "Medium".into(),
      deps: Some(deps.into()),
      forecast_score: Some("Now: 5".into()),
      ..Default::default()
    }
  }

  #[test]
  fn dashboard_covers_every_row() {
    let rows = vec![make_row("A__c", "- Flow: F"), make_row("B__c", "- Field: A__c")];
    let d = build_dashboard("Opportunity", &rows, &Config::default()).unwrap();
    assert_eq!(d.rows.len(), 2);
    assert_eq!(d.forecasts.len(), 2);
    assert_eq!(d.forecasts[1].series.scores, [5, 0, 0]);
    assert_eq!(d.dna.fields.len(), 2);
    assert_eq!(d.graph.nodes.len(), 3);
    assert!(d.comparisons.is_empty());
  }

  #[test]
  fn batch_id_is_stable_and_input_sensitive() {
    let rows = vec![make_row("A__c", "- Flow: F")];
    let a = batch_id("Opportunity", &rows).unwrap();
    let b = batch_id("Opportunity", &rows).unwrap();
    let c = batch_id("Account", &rows).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert!(a.starts_with("batch-"));
    assert_eq!(a.len(), "batch-".len() + 16);
  }

  #[test]
  fn run_falls_back_to_row_object() {
    let input = BatchInput {
      object_name: None,
      rows: vec![make_row("A__c", "")],
    };
    let d = run(&input, &Config::default()).unwrap();
    assert_eq!(d.object_name, "Opportunity");

    let empty = BatchInput {
      object_name: None,
      rows: vec![],
    };
    let err = run(&empty, &Config::default()).unwrap_err();
    assert!(err.to_string().contains("objectName"));
  }
}
