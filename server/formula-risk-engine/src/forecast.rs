//! CPU forecast narrative parsing.
//!
//! Each line is matched against one case-insensitive pattern: a temporal label
//! ("now", "6 months", "1 year", any spacing) followed somewhere later on the
//! line by a decimal integer. Later lines overwrite earlier ones for the same
//! bucket. Lines that do not match, or whose number does not fit, are ignored.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use crate::types::{FieldForecast, ForecastSeries, RawFieldRisk};

const NOW: usize = 0;
const SIX_MONTHS: usize = 1;
const ONE_YEAR: usize = 2;

fn forecast_line() -> &'static Regex {
  static RE: OnceLock<Regex> = OnceLock::new();
  RE.get_or_init(|| {
    Regex::new(r"(?i)\b(?:(?P<now>now)|(?P<six>6\s*months?)|(?P<year>1\s*years?))\b.*?(?P<score>\d+)")
      .expect("forecast pattern is valid")
  })
}

/// Bucket index and score for one line, if it matches.
pub fn parse_line(line: &str) -> Option<(usize, u32)> {
  let caps = forecast_line().captures(line)?;
  let bucket = if caps.name("now").is_some() {
    NOW
  } else if caps.name("six").is_some() {
    SIX_MONTHS
  } else {
    ONE_YEAR
  };
  let digits = caps.name("score")?.as_str();
  match digits.parse::<u32>() {
    Ok(score) => Some((bucket, score)),
    Err(e) => {
      debug!(line, error = %e, "forecast score out of range");
      None
    }
  }
}

/// Parse a forecast narrative; absent or empty text yields all zeros.
pub fn parse_forecast(text: Option<&str>) -> ForecastSeries {
  let mut series = ForecastSeries::default();
  for line in text.unwrap_or_default().lines() {
    if let Some((bucket, score)) = parse_line(line) {
      series.scores[bucket] = score;
    }
  }
  series
}

/// One series per row, in row order.
pub fn collect_forecasts(rows: &[RawFieldRisk]) -> Vec<FieldForecast> {
  rows
    .iter()
    .map(|r| FieldForecast {
      field_name: r.field_name.clone(),
      series: parse_forecast(r.forecast_score.as_deref()),
    })
    .collect()
}
