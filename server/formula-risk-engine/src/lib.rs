//! Formula Risk Engine: turns scored formula field rows into dashboard views.
//!
//! Parses each row's dependency descriptor into typed edges and a de-duplicated
//! graph, extracts the 3-point CPU forecast from the forecast narrative, builds
//! the DNA heat map, and keeps the optimized-formula comparison list in sync
//! after applies.
//!
//! The pipeline is pure; the [`Session`] wraps it with generation-checked
//! reloads against an external [`RowSource`].

pub mod aggregate;
pub mod config;
pub mod deps;
pub mod error;
pub mod forecast;
pub mod graph;
pub mod normalize;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod session;
pub mod source;
pub mod types;

pub use config::Config;
pub use error::EngineError;
pub use pipeline::build_dashboard;
pub use reconcile::ComparisonList;
pub use session::{ReloadOutcome, Session};
pub use source::{FormulaUpdate, FormulaUpdater, ReportSink, RowSource};
pub use types::{BatchInput, Dashboard, RawFieldRisk};
