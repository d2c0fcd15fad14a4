//! Forecast report: HTML summary for one field and delivery to a sink.

use std::fmt::Write;

use html_escape::encode_text;
use tracing::{info, warn};

use crate::aggregate;
use crate::error::EngineError;
use crate::forecast;
use crate::source::{ForecastReport, ReportSink};
use crate::types::DisplayFieldRisk;

/// Label shown with the report; the field label, or its API name when blank.
pub fn report_label(row: &DisplayFieldRisk) -> String {
  if row.raw.label.trim().is_empty() {
    row.raw.field_name.clone()
  } else {
    row.raw.label.clone()
  }
}

/// Render the summary. All row text is escaped.
pub fn render_summary_html(row: &DisplayFieldRisk) -> String {
  let raw = &row.raw;
  let series = forecast::parse_forecast(raw.forecast_score.as_deref());
  let mut html = String::new();

  let _ = write!(
    html,
    "<h2>{}</h2><p>{}.{}</p><ul>",
    encode_text(&report_label(row)),
    encode_text(&raw.object_name),
    encode_text(&raw.field_name)
  );
  let _ = write!(html, "<li>Risk level: {}</li>", encode_text(&raw.risk_level));
  let _ = write!(html, "<li>CPU score: {}</li>", raw.cpu_score);
  let _ = write!(html, "<li>Coverage: {}</li>", encode_text(&row.coverage));
  if !raw.cpu_red_flags.trim().is_empty() {
    let _ = write!(html, "<li>Red flags: {}</li>", encode_text(&raw.cpu_red_flags));
  }
  html.push_str("</ul><table><tr>");
  for label in series.labels {
    let _ = write!(html, "<th>{}</th>", label);
  }
  html.push_str("</tr><tr>");
  for score in series.scores {
    let _ = write!(html, "<td>{}</td>", score);
  }
  html.push_str("</tr></table>");

  let dna = aggregate::entries(&raw.dna);
  if !dna.is_empty() {
    html.push_str("<ul>");
    for entry in dna {
      let _ = write!(
        html,
        "<li style=\"color:{}\">{}: {:?}</li>",
        entry.color,
        encode_text(&entry.metric.label),
        entry.value
      );
    }
    html.push_str("</ul>");
  }
  html
}

/// Build and send the report for one row. No retry.
pub async fn deliver_forecast_report<R: ReportSink>(
  sink: &R,
  row: &DisplayFieldRisk,
  image: Vec<u8>,
) -> Result<(), EngineError> {
  if image.is_empty() {
    return Err(EngineError::validation("image", "must not be empty"));
  }
  let report = ForecastReport {
    image,
    label: report_label(row),
    html: render_summary_html(row),
  };
  match sink.deliver(&report).await {
    Ok(()) => {
      info!(field = %row.raw.field_name, "forecast report delivered");
      Ok(())
    }
    Err(e) => {
      warn!(field = %row.raw.field_name, error = %e, "forecast report delivery failed");
      Err(e)
    }
  }
}
