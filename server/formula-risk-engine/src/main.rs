//! Binary entrypoint: read one JSON batch from stdin, write one Dashboard to stdout.
//!
//! Input: `{"objectName": "...", "rows": [RawFieldRisk, ...]}`.
//! Output: the Dashboard, or an ErrorOutput when the input is rejected.
//! Logs go to stderr; set RUST_LOG to adjust verbosity.

use formula_risk_engine::types::ErrorOutput;
use formula_risk_engine::{pipeline, BatchInput, Config, EngineError};
use std::io::{self, Read, Write};
use tracing_subscriber::EnvFilter;

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
    .with_writer(io::stderr)
    .init();

  if let Err(e) = run_binary() {
    let err = match &e {
      EngineError::Validation { field, reason } => {
        ErrorOutput::new(reason.clone()).with_field(field.clone())
      }
      _ => ErrorOutput::new(e.to_string()),
    };
    tracing::error!(error = %e, "batch rejected");
    let mut out = io::stdout().lock();
    let _ = serde_json::to_writer(&mut out, &err);
    let _ = writeln!(out);
    std::process::exit(1);
  }
}

fn run_binary() -> Result<(), EngineError> {
  let mut raw = String::new();
  io::stdin()
    .lock()
    .read_to_string(&mut raw)
    .map_err(|e| EngineError::validation("stdin", &e.to_string()))?;
  let input: BatchInput = serde_json::from_str(&raw)?;

  let dashboard = pipeline::run(&input, &Config::default())?;
  let mut out = io::stdout().lock();
  serde_json::to_writer(&mut out, &dashboard)?;
  let _ = writeln!(out);
  Ok(())
}
