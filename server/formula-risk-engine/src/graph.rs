//! Dependency graph: node de-duplication and category colors.

use std::collections::HashMap;

use crate::config::Config;
use crate::types::*;

/// Category the owning formula field is always typed as.
pub const SOURCE_CATEGORY: &str = "field";

const CATEGORY_COLORS: &[(&str, &str)] = &[
  ("flow", "#1f77b4"),
  ("apex", "#ff7f0e"),
  ("field", "#2ca02c"),
  ("object", "#d62728"),
  ("validation", "#9467bd"),
  ("trigger", "#8c564b"),
  ("workflow", "#e377c2"),
  ("process", "#7f7f7f"),
  ("component", "#bcbd22"),
  ("permission", "#17becf"),
  ("profile", "#aec7e8"),
  ("layout", "#ffbb78"),
  ("page", "#98df8a"),
  ("customlabel", "#ff9896"),
];

/// Color for a category, `fallback` when it is not in the table.
pub fn category_color<'a>(category: &str, fallback: &'a str) -> &'a str {
  CATEGORY_COLORS
    .iter()
    .find(|(c, _)| *c == category)
    .map(|(_, color)| *color)
    .unwrap_or(fallback)
}

/// Build the node/link graph from the batch's edges.
///
/// Nodes appear once, in first-occurrence order, keeping the category of their
/// first occurrence. Links are not de-duplicated.
pub fn build_graph(edges: &[DependencyEdge], config: &Config) -> GraphModel {
  let mut nodes: Vec<GraphNode> = Vec::new();
  let mut seen: HashMap<&str, usize> = HashMap::new();
  let mut links = Vec::with_capacity(edges.len());

  for edge in edges {
    let fallback = config.fallback_color.as_str();
    upsert(&mut nodes, &mut seen, &edge.source_field, SOURCE_CATEGORY, fallback);
    let target = upsert(&mut nodes, &mut seen, &edge.target_name, &edge.component_type, fallback);

    links.push(GraphLink {
      source: edge.source_field.clone(),
      target: edge.target_name.clone(),
      label: edge.component_type.clone(),
      color: nodes[target].color.clone(),
    });
  }

  GraphModel { nodes, links }
}

/// Index of the node `id`, creating it with `category` on first sight.
fn upsert<'e>(
  nodes: &mut Vec<GraphNode>,
  seen: &mut HashMap<&'e str, usize>,
  id: &'e str,
  category: &str,
  fallback: &str,
) -> usize {
  *seen.entry(id).or_insert_with(|| {
    nodes.push(GraphNode {
      id: id.to_string(),
      category: category.to_string(),
      color: category_color(category, fallback).to_string(),
    });
    nodes.len() - 1
  })
}
