//! Session tests: reload generations, fetch failures, optimized-formula applies.

use std::collections::HashMap;
use std::sync::Mutex;

use formula_risk_engine::source::{ForecastReport, ReportSink};
use formula_risk_engine::types::ObjectInfo;
use formula_risk_engine::{
  report, EngineError, FormulaUpdate, FormulaUpdater, RawFieldRisk, ReloadOutcome, RowSource,
  Session,
};
use tokio::sync::oneshot;

type Batch = Result<Vec<RawFieldRisk>, EngineError>;

/// Row source whose fetches resolve when the test sends on the matching channel.
#[derive(Default)]
struct GatedSource {
  pending: Mutex<HashMap<String, oneshot::Receiver<Batch>>>,
}

impl GatedSource {
  fn gate(&self, object: &str) -> oneshot::Sender<Batch> {
    let (tx, rx) = oneshot::channel();
    self.pending.lock().unwrap().insert(object.to_string(), rx);
    tx
  }
}

impl RowSource for GatedSource {
  async fn fetch_field_risks(&self, object_name: &str) -> Batch {
    let rx = self.pending.lock().unwrap().remove(object_name);
    match rx {
      Some(rx) => rx
        .await
        .unwrap_or_else(|_| Err(EngineError::fetch("rows", "gate dropped"))),
      None => Err(EngineError::fetch("rows", "no gate")),
    }
  }

  async fn fetch_object_catalog(&self) -> Result<Vec<ObjectInfo>, EngineError> {
    Ok(vec![ObjectInfo {
      label: "Opportunity".into(),
      api_name: "Opportunity".into(),
    }])
  }
}

impl RowSource for &GatedSource {
  async fn fetch_field_risks(&self, object_name: &str) -> Batch {
    (**self).fetch_field_risks(object_name).await
  }

  async fn fetch_object_catalog(&self) -> Result<Vec<ObjectInfo>, EngineError> {
    (**self).fetch_object_catalog().await
  }
}

/// Row source that always answers immediately with a fixed batch.
struct StaticSource(Vec<RawFieldRisk>);

impl RowSource for StaticSource {
  async fn fetch_field_risks(&self, _object_name: &str) -> Batch {
    Ok(self.0.clone())
  }

  async fn fetch_object_catalog(&self) -> Result<Vec<ObjectInfo>, EngineError> {
    Err(EngineError::fetch("catalog", "unavailable"))
  }
}

/// Updater that records calls and rejects fields listed in `reject`.
#[derive(Default)]
struct RecordingUpdater {
  reject: Vec<String>,
  calls: Mutex<Vec<FormulaUpdate>>,
}

impl FormulaUpdater for RecordingUpdater {
  async fn apply_formula(&self, update: &FormulaUpdate) -> Result<(), EngineError> {
    self.calls.lock().unwrap().push(update.clone());
    if self.reject.contains(&update.field_name) {
      return Err(EngineError::update(&update.field_name, "rejected"));
    }
    Ok(())
  }
}

/// Updater whose applies resolve when the test releases them, in any order.
#[derive(Default)]
struct GatedUpdater {
  pending: Mutex<HashMap<String, oneshot::Receiver<()>>>,
}

impl GatedUpdater {
  fn gate(&self, field: &str) -> oneshot::Sender<()> {
    let (tx, rx) = oneshot::channel();
    self.pending.lock().unwrap().insert(field.to_string(), rx);
    tx
  }
}

impl FormulaUpdater for GatedUpdater {
  async fn apply_formula(&self, update: &FormulaUpdate) -> Result<(), EngineError> {
    let rx = self.pending.lock().unwrap().remove(&update.field_name);
    match rx {
      Some(rx) => rx
        .await
        .map_err(|_| EngineError::update(&update.field_name, "gate dropped")),
      None => Ok(()),
    }
  }
}

fn rows(object: &str, n: usize) -> Vec<RawFieldRisk> {
  (0..n)
    .map(|i| RawFieldRisk {
      object_name: object.into(),
      field_name: format!("F{}__c", i),
      label: format!("Field {}", i),
      return_type: "Number".into(),
      risk_level: "Low".into(),
      original_formula: Some("IF(A__c > 0, A__c, 0)".into()),
      optimized_formula: Some("MAX(A__c, 0)".into()),
      ..Default::default()
    })
    .collect()
}

#[tokio::test]
async fn newer_reload_wins_even_when_older_resolves_last() {
  let source = GatedSource::default();
  let tx_account = source.gate("Account");
  let tx_opp = source.gate("Opportunity");
  let session = Session::with_defaults(source, RecordingUpdater::default());

  let (first, second, ()) = tokio::join!(
    session.reload("Account"),
    session.reload("Opportunity"),
    async {
      tx_opp.send(Ok(rows("Opportunity", 2))).unwrap();
      tokio::task::yield_now().await;
      tx_account.send(Ok(rows("Account", 5))).unwrap();
    }
  );

  assert_eq!(
    first.unwrap(),
    ReloadOutcome::Superseded {
      generation: 1,
      latest: 2
    }
  );
  assert_eq!(
    second.unwrap(),
    ReloadOutcome::Applied {
      generation: 2,
      rows: 2
    }
  );
  let snapshot = session.snapshot().unwrap();
  assert_eq!(snapshot.object_name, "Opportunity");
  assert_eq!(snapshot.rows.len(), 2);
  assert_eq!(session.selected_object().as_deref(), Some("Opportunity"));
}

#[tokio::test]
async fn stale_failure_does_not_clear_newer_batch() {
  let source = GatedSource::default();
  let tx_old = source.gate("Account");
  let tx_new = source.gate("Opportunity");
  let session = Session::with_defaults(source, RecordingUpdater::default());

  let (old, new, ()) = tokio::join!(
    session.reload("Account"),
    session.reload("Opportunity"),
    async {
      tx_new.send(Ok(rows("Opportunity", 3))).unwrap();
      tokio::task::yield_now().await;
      tx_old.send(Err(EngineError::fetch("rows", "timeout"))).unwrap();
    }
  );

  assert!(matches!(old, Ok(ReloadOutcome::Superseded { .. })));
  assert!(matches!(new, Ok(ReloadOutcome::Applied { rows: 3, .. })));
  assert_eq!(session.snapshot().unwrap().rows.len(), 3);
}

#[tokio::test]
async fn fetch_failure_empties_the_dashboard() {
  let source = GatedSource::default();
  let tx = source.gate("Opportunity");
  tx.send(Ok(rows("Opportunity", 2))).unwrap();
  let session = Session::with_defaults(source, RecordingUpdater::default());
  session.reload("Opportunity").await.unwrap();
  assert!(session.snapshot().is_some());
  assert!(session.loaded_at().is_some());

  // No gate registered: the fetch fails.
  let err = session.reload("Opportunity").await.unwrap_err();
  assert!(err.to_string().contains("fetch"));
  assert!(session.snapshot().is_none());
  assert!(session.comparisons().is_empty());

  // Still usable afterwards.
  assert!(session.load_catalog().await.is_ok());
}

#[tokio::test]
async fn catalog_failure_leaves_no_catalog() {
  let session = Session::with_defaults(StaticSource(vec![]), RecordingUpdater::default());
  assert!(session.load_catalog().await.is_err());
  assert!(session.catalog().is_empty());

  let session = Session::with_defaults(GatedSource::default(), RecordingUpdater::default());
  let catalog = session.load_catalog().await.unwrap();
  assert_eq!(catalog.len(), 1);
  assert_eq!(session.catalog()[0].api_name, "Opportunity");
}

#[tokio::test]
async fn apply_removes_entry_and_reindexes() {
  let session = Session::with_defaults(
    StaticSource(rows("Opportunity", 5)),
    RecordingUpdater::default(),
  );
  session.reload("Opportunity").await.unwrap();

  let applied = session.apply_optimized(2).await.unwrap();
  assert_eq!(applied.devname, "F2__c");

  let remaining = session.comparisons();
  let indices: Vec<usize> = remaining.iter().map(|e| e.index).collect();
  let names: Vec<&str> = remaining.iter().map(|e| e.devname.as_str()).collect();
  assert_eq!(indices, vec![0, 1, 2, 3]);
  assert_eq!(names, vec!["F0__c", "F1__c", "F3__c", "F4__c"]);
}

impl FormulaUpdater for &RecordingUpdater {
  async fn apply_formula(&self, update: &FormulaUpdate) -> Result<(), EngineError> {
    (**self).apply_formula(update).await
  }
}

#[tokio::test]
async fn apply_sends_entry_details_to_updater() {
  let updater = RecordingUpdater::default();
  let session = Session::with_defaults(StaticSource(rows("Opportunity", 1)), &updater);
  session.reload("Opportunity").await.unwrap();
  session.apply_optimized(0).await.unwrap();
  assert!(session.comparisons().is_empty());

  let calls = updater.calls.lock().unwrap();
  assert_eq!(
    calls.as_slice(),
    &[FormulaUpdate {
      object_name: "Opportunity".into(),
      field_name: "F0__c".into(),
      new_formula: "MAX(A__c, 0)".into(),
      field_type: "Number".into(),
      label: "Field 0".into(),
    }]
  );
}

#[tokio::test]
async fn rejected_apply_leaves_list_unchanged() {
  let updater = RecordingUpdater {
    reject: vec!["F1__c".into()],
    ..Default::default()
  };
  let session = Session::with_defaults(StaticSource(rows("Opportunity", 3)), updater);
  session.reload("Opportunity").await.unwrap();
  let before = session.comparisons();

  let err = session.apply_optimized(1).await.unwrap_err();
  assert!(matches!(err, EngineError::Update { .. }));
  assert_eq!(session.comparisons(), before);

  // Out-of-range index is rejected without calling the backend.
  assert!(matches!(
    session.apply_optimized(9).await,
    Err(EngineError::Validation { .. })
  ));
}

#[tokio::test]
async fn concurrent_applies_reindex_at_completion() {
  let updater = GatedUpdater::default();
  let release_first = updater.gate("F1__c");
  let release_second = updater.gate("F3__c");
  let session = Session::with_defaults(StaticSource(rows("Opportunity", 5)), updater);
  session.reload("Opportunity").await.unwrap();

  let (a, b, ()) = tokio::join!(
    session.apply_optimized(1),
    session.apply_optimized(3),
    async {
      // Complete the later entry first.
      release_second.send(()).unwrap();
      tokio::task::yield_now().await;
      release_first.send(()).unwrap();
    }
  );

  assert_eq!(a.unwrap().devname, "F1__c");
  assert_eq!(b.unwrap().devname, "F3__c");
  let remaining = session.comparisons();
  let names: Vec<&str> = remaining.iter().map(|e| e.devname.as_str()).collect();
  let indices: Vec<usize> = remaining.iter().map(|e| e.index).collect();
  assert_eq!(names, vec!["F0__c", "F2__c", "F4__c"]);
  assert_eq!(indices, vec![0, 1, 2]);
}

#[tokio::test]
async fn apply_finishing_after_switch_to_other_object_leaves_new_list() {
  let source = GatedSource::default();
  source.gate("Opportunity").send(Ok(rows("Opportunity", 3))).unwrap();
  source.gate("Account").send(Ok(rows("Account", 3))).unwrap();
  let updater = GatedUpdater::default();
  let release = updater.gate("F1__c");
  let session = Session::with_defaults(source, updater);
  session.reload("Opportunity").await.unwrap();

  let (applied, ()) = tokio::join!(session.apply_optimized(1), async {
    session.reload("Account").await.unwrap();
    release.send(()).unwrap();
  });

  assert_eq!(applied.unwrap().devname, "F1__c");
  let snapshot = session.snapshot().unwrap();
  assert_eq!(snapshot.object_name, "Account");
  let names: Vec<&str> = snapshot
    .comparisons
    .entries()
    .iter()
    .map(|e| e.devname.as_str())
    .collect();
  assert_eq!(names, vec!["F0__c", "F1__c", "F2__c"]);
}

#[tokio::test]
async fn apply_finishing_after_same_object_reload_updates_fresh_list() {
  let source = GatedSource::default();
  source.gate("Opportunity").send(Ok(rows("Opportunity", 3))).unwrap();
  let updater = GatedUpdater::default();
  let release = updater.gate("F1__c");
  let session = Session::with_defaults(&source, updater);
  session.reload("Opportunity").await.unwrap();
  let first_batch = session.snapshot().unwrap().batch_id;

  let (applied, ()) = tokio::join!(session.apply_optimized(1), async {
    source.gate("Opportunity").send(Ok(rows("Opportunity", 3))).unwrap();
    session.reload("Opportunity").await.unwrap();
    release.send(()).unwrap();
  });

  assert_eq!(applied.unwrap().devname, "F1__c");
  let snapshot = session.snapshot().unwrap();
  assert_eq!(snapshot.batch_id, first_batch);
  let remaining: Vec<(usize, &str)> = snapshot
    .comparisons
    .entries()
    .iter()
    .map(|e| (e.index, e.devname.as_str()))
    .collect();
  assert_eq!(remaining, vec![(0, "F0__c"), (1, "F2__c")]);
}

struct CapturingSink {
  delivered: Mutex<Vec<ForecastReport>>,
  fail: bool,
}

impl ReportSink for CapturingSink {
  async fn deliver(&self, report: &ForecastReport) -> Result<(), EngineError> {
    if self.fail {
      return Err(EngineError::report("mail relay down"));
    }
    self.delivered.lock().unwrap().push(report.clone());
    Ok(())
  }
}

#[tokio::test]
async fn forecast_report_delivery() {
  let session = Session::with_defaults(
    StaticSource(rows("Opportunity", 1)),
    RecordingUpdater::default(),
  );
  session.reload("Opportunity").await.unwrap();
  let row = session.snapshot().unwrap().rows[0].clone();

  let sink = CapturingSink {
    delivered: Mutex::new(Vec::new()),
    fail: false,
  };
  report::deliver_forecast_report(&sink, &row, vec![0x89, 0x50])
    .await
    .unwrap();
  let delivered = sink.delivered.lock().unwrap();
  assert_eq!(delivered.len(), 1);
  assert_eq!(delivered[0].label, "Field 0");
  assert!(delivered[0].html.contains("F0__c"));
  drop(delivered);

  assert!(report::deliver_forecast_report(&sink, &row, vec![]).await.is_err());

  let failing = CapturingSink {
    delivered: Mutex::new(Vec::new()),
    fail: true,
  };
  let err = report::deliver_forecast_report(&failing, &row, vec![1])
    .await
    .unwrap_err();
  assert!(matches!(err, EngineError::Report(_)));
}
