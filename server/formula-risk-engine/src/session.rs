//! Dashboard session: reloads per selected object and optimized-formula applies.
//!
//! Every reload takes a generation number. Only the result of the newest
//! generation is applied; older results (successes and failures alike) are
//! discarded so a slow fetch never overwrites a newer selection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::EngineError;
use crate::pipeline;
use crate::source::{FormulaUpdate, FormulaUpdater, RowSource};
use crate::types::{ComparisonEntry, Dashboard, ObjectInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
  Applied { generation: u64, rows: usize },
  /// A newer reload was issued while this one was in flight.
  Superseded { generation: u64, latest: u64 },
}

#[derive(Debug, Default)]
struct SessionState {
  object_name: Option<String>,
  dashboard: Option<Dashboard>,
  loaded_at: Option<DateTime<Utc>>,
  catalog: Vec<ObjectInfo>,
}

pub struct Session<S, U> {
  source: S,
  updater: U,
  config: Config,
  generation: AtomicU64,
  state: Mutex<SessionState>,
}

impl<S: RowSource, U: FormulaUpdater> Session<S, U> {
  pub fn new(source: S, updater: U, config: Config) -> Self {
    Self {
      source,
      updater,
      config,
      generation: AtomicU64::new(0),
      state: Mutex::new(SessionState::default()),
    }
  }

  pub fn with_defaults(source: S, updater: U) -> Self {
    Self::new(source, updater, Config::default())
  }

  fn state(&self) -> MutexGuard<'_, SessionState> {
    self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
  }

  /// Fetch and rebuild the dashboard for `object_name`.
  ///
  /// On fetch failure the displayed batch becomes empty and the error is returned.
  pub async fn reload(&self, object_name: &str) -> Result<ReloadOutcome, EngineError> {
    let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
    debug!(object = object_name, generation, "reload started");

    let fetched = self.source.fetch_field_risks(object_name).await;
    let built = fetched.and_then(|rows| {
      pipeline::build_dashboard(object_name, &rows, &self.config).map(|d| (rows.len(), d))
    });

    let mut state = self.state();
    let latest = self.generation.load(Ordering::SeqCst);
    if generation != latest {
      debug!(object = object_name, generation, latest, "discarding superseded reload");
      return Ok(ReloadOutcome::Superseded { generation, latest });
    }

    state.object_name = Some(object_name.to_string());
    match built {
      Ok((rows, dashboard)) => {
        info!(object = object_name, generation, rows, batch = %dashboard.batch_id, "batch applied");
        state.dashboard = Some(dashboard);
        state.loaded_at = Some(Utc::now());
        Ok(ReloadOutcome::Applied { generation, rows })
      }
      Err(e) => {
        warn!(object = object_name, generation, error = %e, "reload failed");
        state.dashboard = None;
        state.loaded_at = None;
        Err(e)
      }
    }
  }

  /// Fetch the object picker entries, in source order.
  pub async fn load_catalog(&self) -> Result<Vec<ObjectInfo>, EngineError> {
    match self.source.fetch_object_catalog().await {
      Ok(catalog) => {
        self.state().catalog = catalog.clone();
        Ok(catalog)
      }
      Err(e) => {
        warn!(error = %e, "catalog fetch failed");
        self.state().catalog.clear();
        Err(e)
      }
    }
  }

  /// Apply the optimized formula of the comparison entry at `index`.
  ///
  /// On success the entry is removed and the remaining entries re-indexed
  /// against the list as it is when the call completes. If the batch was
  /// reloaded for another object meanwhile, that list is left alone. On
  /// failure nothing changes.
  pub async fn apply_optimized(&self, index: usize) -> Result<ComparisonEntry, EngineError> {
    let (object_name, entry) = {
      let state = self.state();
      let dashboard = state
        .dashboard
        .as_ref()
        .ok_or_else(|| EngineError::validation("index", "no batch loaded"))?;
      let entry = dashboard
        .comparisons
        .get(index)
        .cloned()
        .ok_or_else(|| EngineError::validation("index", "no comparison entry at this position"))?;
      (dashboard.object_name.clone(), entry)
    };

    let update = FormulaUpdate {
      object_name: object_name.clone(),
      field_name: entry.devname.clone(),
      new_formula: entry.optimized_formula.clone(),
      field_type: entry.field_type.clone(),
      label: entry.label.clone(),
    };
    if let Err(e) = self.updater.apply_formula(&update).await {
      warn!(object = %object_name, field = %entry.devname, error = %e, "formula apply failed");
      return Err(e);
    }

    let mut state = self.state();
    match state
      .dashboard
      .as_mut()
      .filter(|d| d.object_name == object_name)
    {
      Some(dashboard) => {
        if dashboard.comparisons.remove_entry(&entry).is_none() {
          debug!(object = %object_name, field = %entry.devname, "entry already gone from current list");
        }
        info!(
          object = %object_name,
          field = %entry.devname,
          remaining = dashboard.comparisons.len(),
          "optimized formula applied"
        );
      }
      None => {
        debug!(object = %object_name, field = %entry.devname, "batch replaced before apply completed");
      }
    }
    Ok(entry)
  }

  /// Read-only copy of the current dashboard, if any batch is displayed.
  pub fn snapshot(&self) -> Option<Dashboard> {
    self.state().dashboard.clone()
  }

  pub fn selected_object(&self) -> Option<String> {
    self.state().object_name.clone()
  }

  pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
    self.state().loaded_at
  }

  pub fn catalog(&self) -> Vec<ObjectInfo> {
    self.state().catalog.clone()
  }

  pub fn comparisons(&self) -> Vec<ComparisonEntry> {
    self
      .state()
      .dashboard
      .as_ref()
      .map(|d| d.comparisons.entries().to_vec())
      .unwrap_or_default()
  }
}
