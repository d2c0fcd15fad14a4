//! Engine configuration with sane defaults.

/// Tunable parsing and rendering settings.
#[derive(Debug, Clone)]
pub struct Config {
  /// Prefix a deps line must start with to be considered.
  pub dependency_prefix: String,
  /// Color for graph categories missing from the category table.
  pub fallback_color: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      dependency_prefix: "- ".to_string(),
      fallback_color: "#95a5a6".to_string(),
    }
  }
}
