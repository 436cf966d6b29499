//! Pass-level tests for the orchestrator
//!
//! Probes are scripted so these run without network access; the file backed
//! store lives in a temp dir.
use super::*;
use crate::error::NotifyError;
use crate::monitoring::types::{AlertEvent, AlertKind, ProbeResult};
use crate::registry::StaticRegistry;
use crate::store::{FileStatusStore, MemoryStatusStore, RecordUpdate, StatusSnapshot, default_record};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::tempdir;

/// Prober answering from a fixed map. Unlisted targets are up.
#[derive(Default)]
struct ScriptedProber {
    reachable: Mutex<HashMap<String, bool>>,
    delays: HashMap<String, Duration>,
    panics_on: HashSet<String>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedProber {
    fn set(&self, name: &str, reachable: bool) {
        self.reachable.lock().unwrap().insert(name.to_string(), reachable);
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn probe(&self, target: &Target) -> ProbeResult {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&target.name) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.panics_on.contains(&target.name) {
            panic!("prober exploded for {}", target.name);
        }

        let reachable = self.reachable.lock().unwrap().get(&target.name).copied().unwrap_or(true);
        if reachable {
            ProbeResult::reachable(&target.name, "Status Code: 200")
        } else {
            ProbeResult::unreachable(&target.name, "Status Code: 503")
        }
    }
}

/// Sink remembering every alert it was given
#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<AlertEvent>>,
}

impl RecordingSink {
    fn kinds_for(&self, name: &str) -> Vec<AlertKind> {
        self.events.lock().unwrap().iter().filter(|e| e.target_name == name).map(|e| e.kind).collect()
    }

    fn count(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, event: &AlertEvent) -> Result<(), NotifyError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

struct BrokenSink;

#[async_trait]
impl NotificationSink for BrokenSink {
    async fn notify(&self, _event: &AlertEvent) -> Result<(), NotifyError> {
        Err(NotifyError::Rejected(reqwest::StatusCode::SERVICE_UNAVAILABLE))
    }
}

/// Store whose writes always fail for the listed targets
struct ReadOnlyFor {
    inner: MemoryStatusStore,
    refused: HashSet<String>,
}

#[async_trait]
impl StatusStore for ReadOnlyFor {
    async fn read_all(&self) -> StatusSnapshot {
        self.inner.read_all().await
    }

    async fn upsert(&self, name: &str, record: StatusRecord) -> Result<(), StoreError> {
        if self.refused.contains(name) {
            return Err(read_only());
        }
        self.inner.upsert(name, record).await
    }

    async fn update(&self, name: &str, apply: RecordUpdate<'_>) -> Updated {
        if self.refused.contains(name) {
            let evaluation = apply(&self.inner.get(name).await);
            return Updated { evaluation, persist_error: Some(read_only()) };
        }
        self.inner.update(name, apply).await
    }
}

fn read_only() -> StoreError {
    StoreError::Write {
        path: "status_history.json".into(),
        source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
    }
}

/// Prober that holds each probe at a barrier, then reports the target down
struct GatedDownProber {
    gate: tokio::sync::Barrier,
}

#[async_trait]
impl Prober for GatedDownProber {
    async fn probe(&self, target: &Target) -> ProbeResult {
        self.gate.wait().await;
        ProbeResult::unreachable(&target.name, "Status Code: 503")
    }
}

fn targets(names: &[&str]) -> Vec<Target> {
    names.iter().map(|name| Target::http(*name, format!("https://{name}.example"))).collect()
}

fn orchestrator(
    prober: Arc<ScriptedProber>,
    store: Arc<dyn StatusStore>,
    sink: Arc<dyn NotificationSink>,
) -> CheckOrchestrator {
    CheckOrchestrator::new(prober, store, sink, DEFAULT_MAX_CONCURRENCY)
}

#[tokio::test]
async fn test_steady_online_never_alerts() {
    let prober = Arc::new(ScriptedProber::default());
    let sink = Arc::new(RecordingSink::default());
    let orchestrator = orchestrator(prober, Arc::new(MemoryStatusStore::new()), sink.clone());

    for _ in 0..3 {
        let report = orchestrator.run_pass(&targets(&["a", "b"])).await;
        assert_eq!(report.alerts, 0);
        assert_eq!(report.online_count(), 2);
    }

    assert_eq!(sink.count(), 0);
}

#[tokio::test]
async fn test_down_then_recovery_alerts_once_each() {
    let prober = Arc::new(ScriptedProber::default());
    let sink = Arc::new(RecordingSink::default());
    let store = Arc::new(MemoryStatusStore::new());
    let orchestrator = orchestrator(prober.clone(), store.clone(), sink.clone());
    let list = targets(&["a"]);

    prober.set("a", false);
    orchestrator.run_pass(&list).await;
    orchestrator.run_pass(&list).await;
    orchestrator.run_pass(&list).await;
    assert_eq!(sink.kinds_for("a"), vec![AlertKind::Down]);
    let down = store.get("a").await;

    prober.set("a", true);
    orchestrator.run_pass(&list).await;
    orchestrator.run_pass(&list).await;
    assert_eq!(sink.kinds_for("a"), vec![AlertKind::Down, AlertKind::Recovery]);

    let recovered = store.get("a").await;
    assert_eq!(recovered.status, Status::Online);
    assert_eq!(recovered.last_offline, down.last_offline);
    assert!(recovered.last_success.is_some());

    let events = sink.events.lock().unwrap();
    assert_eq!(events[1].down_since, down.last_offline);
}

#[tokio::test]
async fn test_first_run_without_store_file() {
    let dir = tempdir().unwrap();
    let store = Arc::new(FileStatusStore::new(dir.path().join("status_history.json")));
    assert!(store.read_all().await.is_empty());

    let prober = Arc::new(ScriptedProber::default());
    prober.set("down", false);
    let sink = Arc::new(RecordingSink::default());
    let orchestrator = orchestrator(prober, store.clone(), sink.clone());

    let report = orchestrator.run_pass(&targets(&["up", "down"])).await;

    // Unknown -> Online is silent, Unknown -> Offline alerts
    assert!(sink.kinds_for("up").is_empty());
    assert_eq!(sink.kinds_for("down"), vec![AlertKind::Down]);
    assert!(report.is_fully_persisted());
    assert_eq!(store.read_all().await.len(), 2);
}

#[tokio::test]
async fn test_results_keep_input_order() {
    let delays = [("slow", 120), ("medium", 60), ("fast", 0)]
        .into_iter()
        .map(|(name, ms)| (name.to_string(), Duration::from_millis(ms)))
        .collect();
    let prober = Arc::new(ScriptedProber { delays, ..ScriptedProber::default() });
    let orchestrator = orchestrator(prober, Arc::new(MemoryStatusStore::new()), Arc::new(RecordingSink::default()));

    let report = orchestrator.run_pass(&targets(&["slow", "medium", "fast"])).await;

    let names: Vec<_> = report.statuses.iter().map(|s| s.target.name.as_str()).collect();
    assert_eq!(names, ["slow", "medium", "fast"]);
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let names: Vec<String> = (0..25).map(|i| format!("t{i}")).collect();
    let delays = names.iter().map(|n| (n.clone(), Duration::from_millis(30))).collect();
    let prober = Arc::new(ScriptedProber { delays, ..ScriptedProber::default() });
    let orchestrator = CheckOrchestrator::new(
        prober.clone(),
        Arc::new(MemoryStatusStore::new()),
        Arc::new(RecordingSink::default()),
        4,
    );
    let list: Vec<Target> = names.iter().map(|n| Target::ping(n.as_str(), "192.0.2.1")).collect();

    let report = orchestrator.run_pass(&list).await;

    assert_eq!(report.statuses.len(), 25);
    let peak = prober.max_in_flight.load(Ordering::SeqCst);
    assert!(peak <= 4, "peak concurrency {peak} exceeded the limit");
    assert!(peak >= 1);
}

#[tokio::test]
async fn test_overlapping_passes_lose_no_updates() {
    let dir = tempdir().unwrap();
    let store = Arc::new(FileStatusStore::new(dir.path().join("status_history.json")));
    let prober = Arc::new(ScriptedProber::default());
    let orchestrator = orchestrator(prober.clone(), store.clone(), Arc::new(RecordingSink::default()));

    let first: Vec<String> = (0..15).map(|i| format!("scheduled-{i}")).collect();
    let second: Vec<String> = (0..15).map(|i| format!("on-demand-{i}")).collect();
    for name in second.iter().step_by(2) {
        prober.set(name, false);
    }
    let first_targets = targets(&first.iter().map(String::as_str).collect::<Vec<_>>());
    let second_targets = targets(&second.iter().map(String::as_str).collect::<Vec<_>>());

    let (a, b) = tokio::join!(orchestrator.run_pass(&first_targets), orchestrator.run_pass(&second_targets));
    assert!(a.is_fully_persisted() && b.is_fully_persisted());

    let stored = store.read_all().await;
    assert_eq!(stored.len(), 30);
    for name in &first {
        assert_eq!(stored[name].status, Status::Online);
    }
    for (i, name) in second.iter().enumerate() {
        let expected = if i % 2 == 0 { Status::Offline } else { Status::Online };
        assert_eq!(stored[name].status, expected, "{name}");
    }
}

async fn assert_racing_passes_alert_once(store: Arc<dyn StatusStore>) {
    let online = StatusRecord { status: Status::Online, ..default_record() };
    store.upsert("web", online).await.unwrap();

    let prober = Arc::new(GatedDownProber { gate: tokio::sync::Barrier::new(2) });
    let sink = Arc::new(RecordingSink::default());
    let orchestrator = CheckOrchestrator::new(prober, store.clone(), sink.clone(), DEFAULT_MAX_CONCURRENCY);
    let list = targets(&["web"]);

    // Both probes finish together, so both passes reach the store with the same result
    let (a, b) = tokio::join!(orchestrator.run_pass(&list), orchestrator.run_pass(&list));

    assert_eq!(sink.kinds_for("web"), vec![AlertKind::Down]);
    assert_eq!(a.alerts + b.alerts, 1);
    assert_eq!(store.get("web").await.status, Status::Offline);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_passes_alert_once_with_memory_store() {
    assert_racing_passes_alert_once(Arc::new(MemoryStatusStore::new())).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_passes_alert_once_with_file_store() {
    let dir = tempdir().unwrap();
    assert_racing_passes_alert_once(Arc::new(FileStatusStore::new(dir.path().join("status_history.json")))).await;
}

#[tokio::test]
async fn test_store_write_failure_still_reports_status() {
    let store = Arc::new(ReadOnlyFor {
        inner: MemoryStatusStore::new(),
        refused: HashSet::from(["stuck".to_string()]),
    });
    let prober = Arc::new(ScriptedProber::default());
    prober.set("stuck", false);
    let sink = Arc::new(RecordingSink::default());
    let orchestrator = orchestrator(prober, store.clone(), sink.clone());

    let report = orchestrator.run_pass(&targets(&["stuck", "fine"])).await;

    assert_eq!(report.statuses.len(), 2);
    assert_eq!(report.statuses[0].record.status, Status::Offline);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].target_name, "stuck");
    assert_eq!(report.failures[0].kind, FailureKind::Persist);
    assert_eq!(store.get("stuck").await, default_record());
    assert_eq!(store.get("fine").await.status, Status::Online);

    // Not durably recorded, so the next pass alerts again
    orchestrator.run_pass(&targets(&["stuck"])).await;
    assert_eq!(sink.kinds_for("stuck"), vec![AlertKind::Down, AlertKind::Down]);
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_pass() {
    let prober = Arc::new(ScriptedProber::default());
    prober.set("a", false);
    let store = Arc::new(MemoryStatusStore::new());
    let orchestrator = orchestrator(prober, store.clone(), Arc::new(BrokenSink));

    let report = orchestrator.run_pass(&targets(&["a", "b"])).await;

    assert_eq!(report.alerts, 1);
    assert!(report.is_fully_persisted());
    assert_eq!(store.get("a").await.status, Status::Offline);
}

#[tokio::test]
async fn test_crashed_worker_is_reported_and_others_complete() {
    let prober = Arc::new(ScriptedProber {
        panics_on: HashSet::from(["bad".to_string()]),
        ..ScriptedProber::default()
    });
    let store = Arc::new(MemoryStatusStore::new());
    let orchestrator = orchestrator(prober, store.clone(), Arc::new(RecordingSink::default()));

    let report = orchestrator.run_pass(&targets(&["before", "bad", "after"])).await;

    let names: Vec<_> = report.statuses.iter().map(|s| s.target.name.as_str()).collect();
    assert_eq!(names, ["before", "after"]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, FailureKind::Worker);
    assert_eq!(store.read_all().await.len(), 2);
}

#[tokio::test]
async fn test_registry_pass() {
    let registry = StaticRegistry::new(targets(&["a", "b", "c"]));
    let orchestrator = orchestrator(
        Arc::new(ScriptedProber::default()),
        Arc::new(MemoryStatusStore::new()),
        Arc::new(RecordingSink::default()),
    );

    let report = orchestrator.run_registry_pass(&registry).await.unwrap();

    assert_eq!(report.statuses.len(), 3);
}

#[tokio::test]
async fn test_empty_pass() {
    let orchestrator = orchestrator(
        Arc::new(ScriptedProber::default()),
        Arc::new(MemoryStatusStore::new()),
        Arc::new(RecordingSink::default()),
    );

    let report = orchestrator.run_pass(&[]).await;

    assert!(report.statuses.is_empty());
    assert!(report.failures.is_empty());
}

#[test]
fn test_merged_view_serializes_flat() {
    let status = TargetStatus { target: Target::ping("router", "192.0.2.1"), record: default_record() };

    let json = serde_json::to_value(&status).unwrap();

    assert_eq!(json["name"], "router");
    assert_eq!(json["url"], "192.0.2.1");
    assert_eq!(json["type"], "ping");
    assert_eq!(json["status"], "Unknown");
    assert_eq!(json["last_success"], "Never");
}
