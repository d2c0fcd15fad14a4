//! Dependency descriptor parsing.
//!
//! Grammar, one dependency per line:
//!
//! ```text
//! line  := prefix type ":" name
//! prefix := "- "            (configurable)
//! ```
//!
//! Lines without the prefix, and lines whose payload does not split into
//! exactly two parts on ':', are skipped. A trailing colon ("- Field:") is two
//! parts and yields an edge with an empty target.

use tracing::debug;

use crate::config::Config;
use crate::types::{DependencyEdge, RawFieldRisk};

/// Split one line into `(type, name)`, both trimmed. `None` when the line is discarded.
pub fn parse_line<'a>(line: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
  let payload = line.strip_prefix(prefix)?;
  let mut parts = payload.split(':');
  let kind = parts.next()?;
  let name = parts.next()?;
  if parts.next().is_some() {
    return None;
  }
  Some((kind.trim(), name.trim()))
}

/// Edges for one row's deps text, in line order.
pub fn parse_deps(field_name: &str, deps: &str, prefix: &str) -> Vec<DependencyEdge> {
  deps
    .split('\n')
    .filter_map(|line| match parse_line(line, prefix) {
      Some((kind, name)) => Some(DependencyEdge {
        source_field: field_name.to_string(),
        component_type: kind.to_lowercase(),
        target_name: name.to_string(),
      }),
      None => {
        if !line.trim().is_empty() {
          debug!(field = field_name, line, "skipping deps line");
        }
        None
      }
    })
    .collect()
}

/// Edges for the whole batch: row order, then line order within a row.
pub fn collect_edges(rows: &[RawFieldRisk], config: &Config) -> Vec<DependencyEdge> {
  rows
    .iter()
    .filter_map(|r| {
      r.deps
        .as_deref()
        .map(|d| parse_deps(&r.field_name, d, &config.dependency_prefix))
    })
    .flatten()
    .collect()
}
