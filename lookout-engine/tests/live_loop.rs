//! End-to-end behaviour of the live loop with in-process capture and
//! detection stand-ins.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use lookout_capture::{CaptureError, CapturedPacket, CapturedTraffic, PacketSource};
use lookout_core::{ResultTable, StopSignal};
use lookout_detection::{PipelineError, PipelineInvoker};
use lookout_engine::{CaptureSupervisor, LiveSettings};

const SCENARIO: &str = "flow_id,Label,Attack_Type\n1,BENIGN,\n2,BENIGN,\n3,ATTACK,SYN-flood\n";

fn settings(root: &Path, stop_timeout: Duration) -> LiveSettings {
    LiveSettings {
        window: Duration::from_millis(20),
        capture_dir: root.join("live"),
        results_file: root.join("live").join("live_predictions.csv"),
        cycle_interval: Duration::from_millis(5),
        stop_timeout,
    }
}

fn traffic(packets: usize) -> CapturedTraffic {
    let mut traffic = CapturedTraffic::new(1, 65535);
    for i in 0..packets {
        traffic.push(CapturedPacket::new(Duration::from_millis(i as u64), 60, vec![0x45; 60]));
    }
    traffic
}

/// Honours the stop signal like the libpcap source: polls it between short reads.
struct PollingSource {
    packets: usize,
}

impl PacketSource for PollingSource {
    fn capture(&self, window: Duration, stop: &StopSignal) -> Result<CapturedTraffic, CaptureError> {
        let deadline = Instant::now() + window;
        while Instant::now() < deadline && !stop.is_triggered() {
            std::thread::sleep(Duration::from_millis(2));
        }
        Ok(traffic(self.packets))
    }
}

/// Ignores the stop signal for a fixed time and tracks overlapping calls.
struct StubbornSource {
    busy_for: Duration,
    active: AtomicUsize,
    max_active: AtomicUsize,
    calls: AtomicUsize,
}

impl StubbornSource {
    fn new(busy_for: Duration) -> Self {
        Self {
            busy_for,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }
}

impl PacketSource for StubbornSource {
    fn capture(&self, _: Duration, _: &StopSignal) -> Result<CapturedTraffic, CaptureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        std::thread::sleep(self.busy_for);
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(CapturedTraffic::new(1, 65535))
    }
}

struct FixedPipeline {
    csv: &'static str,
    runs: AtomicUsize,
}

impl FixedPipeline {
    fn new(csv: &'static str) -> Self {
        Self {
            csv,
            runs: AtomicUsize::new(0),
        }
    }
}

impl PipelineInvoker for FixedPipeline {
    fn run(&self, _: &Path, output: &Path, _: bool) -> Result<ResultTable, PipelineError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        fs::write(output, self.csv).map_err(|e| PipelineError::Table(e.into()))?;
        Ok(ResultTable::load(output)?)
    }
}

/// Alternates between tables of different sizes, some with unknown labels.
struct AlternatingPipeline {
    flip: AtomicBool,
}

impl PipelineInvoker for AlternatingPipeline {
    fn run(&self, _: &Path, output: &Path, _: bool) -> Result<ResultTable, PipelineError> {
        let big = !self.flip.fetch_xor(true, Ordering::SeqCst);
        let csv = if big {
            let mut csv = String::from("id,Label,Attack_Type\n");
            for i in 0..200 {
                let label = match i % 4 {
                    0 => "BENIGN",
                    1 => "ANOMALY",
                    2 => "ATTACK",
                    _ => "unlabelled",
                };
                csv.push_str(&format!("{i},{label},DDoS\n"));
            }
            csv
        } else {
            SCENARIO.to_string()
        };
        fs::write(output, csv).map_err(|e| PipelineError::Table(e.into()))?;
        Ok(ResultTable::load(output)?)
    }
}

async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scenario_three_flows_then_stop() {
    let dir = tempfile::tempdir().unwrap();
    let supervisor = CaptureSupervisor::new(
        Arc::new(PollingSource { packets: 5 }),
        Arc::new(FixedPipeline::new(SCENARIO)),
        settings(dir.path(), Duration::from_secs(1)),
    );
    let reader = supervisor.status_reader();

    assert!(supervisor.start().unwrap());
    assert!(wait_until(Duration::from_secs(5), || supervisor.last_artifact().is_some()).await);

    let snapshot = reader.read();
    assert!(snapshot.running);
    assert_eq!(snapshot.flows, 3);
    assert_eq!(snapshot.summary.benign, 2);
    assert_eq!(snapshot.summary.anomaly, 0);
    assert_eq!(snapshot.summary.attack, 1);
    assert_eq!(snapshot.attack_types.len(), 1);
    assert_eq!(snapshot.attack_types["SYN-flood"], 1);
    assert_eq!(snapshot.all_flows.len(), 3);

    let artifact = snapshot.last_capture.clone().unwrap();
    assert!(dir.path().join("live").join(&artifact).exists());

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["summary"]["BENIGN"], 2);
    assert_eq!(json["all_flows"][2]["Attack_Type"], "SYN-flood");

    supervisor.stop().await;
    assert!(!supervisor.is_running());
    assert!(!reader.read().running);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_launch_one_worker() {
    let dir = tempfile::tempdir().unwrap();
    let supervisor = Arc::new(CaptureSupervisor::new(
        Arc::new(PollingSource { packets: 0 }),
        Arc::new(FixedPipeline::new(SCENARIO)),
        settings(dir.path(), Duration::from_secs(1)),
    ));

    let starts: Vec<_> = (0..32)
        .map(|_| {
            let supervisor = supervisor.clone();
            tokio::spawn(async move { supervisor.start().unwrap() })
        })
        .collect();

    let mut launched = 0;
    for start in starts {
        if start.await.unwrap() {
            launched += 1;
        }
    }

    assert_eq!(launched, 1);
    assert_eq!(supervisor.launches(), 1);
    assert!(supervisor.is_running());
    supervisor.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let supervisor = CaptureSupervisor::new(
        Arc::new(PollingSource { packets: 0 }),
        Arc::new(FixedPipeline::new(SCENARIO)),
        settings(dir.path(), Duration::from_secs(1)),
    );

    supervisor.stop().await;
    assert!(!supervisor.is_running());

    supervisor.start().unwrap();
    supervisor.stop().await;
    supervisor.stop().await;
    assert!(!supervisor.is_running());
    assert_eq!(supervisor.launches(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn stop_wait_is_bounded_and_restart_never_overlaps() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(StubbornSource::new(Duration::from_millis(600)));
    let supervisor = CaptureSupervisor::new(
        source.clone(),
        Arc::new(FixedPipeline::new(SCENARIO)),
        settings(dir.path(), Duration::from_millis(100)),
    );

    supervisor.start().unwrap();
    assert!(wait_until(Duration::from_secs(2), || source.calls.load(Ordering::SeqCst) == 1).await);

    let began = Instant::now();
    supervisor.stop().await;
    let waited = began.elapsed();
    assert!(!supervisor.is_running());
    assert!(waited < Duration::from_millis(450), "stop waited {waited:?}");

    // The first worker is still inside its capture; the second must queue behind it.
    assert!(supervisor.start().unwrap());
    assert!(wait_until(Duration::from_secs(3), || source.calls.load(Ordering::SeqCst) >= 2).await);
    supervisor.stop().await;

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(source.max_active.load(Ordering::SeqCst), 1);
    assert_eq!(supervisor.launches(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn empty_windows_commit_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = Arc::new(FixedPipeline::new(SCENARIO));
    let supervisor = CaptureSupervisor::new(
        Arc::new(PollingSource { packets: 0 }),
        pipeline.clone(),
        settings(dir.path(), Duration::from_secs(1)),
    );

    supervisor.start().unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    supervisor.stop().await;

    assert_eq!(pipeline.runs.load(Ordering::SeqCst), 0);
    assert!(supervisor.last_artifact().is_none());
    let snapshot = supervisor.status_reader().read();
    assert_eq!(snapshot.flows, 0);
    assert!(!dir.path().join("live").join("live_predictions.csv").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn readers_never_see_a_partial_table() {
    let dir = tempfile::tempdir().unwrap();
    let supervisor = CaptureSupervisor::new(
        Arc::new(PollingSource { packets: 1 }),
        Arc::new(AlternatingPipeline {
            flip: AtomicBool::new(false),
        }),
        LiveSettings {
            window: Duration::from_millis(1),
            cycle_interval: Duration::from_millis(2),
            ..settings(dir.path(), Duration::from_secs(1))
        },
    );
    let reader = supervisor.status_reader();

    supervisor.start().unwrap();
    let observed = tokio::task::spawn_blocking(move || {
        let mut sizes = Vec::new();
        let deadline = Instant::now() + Duration::from_millis(400);
        while Instant::now() < deadline {
            let snapshot = reader.read();
            assert_eq!(
                snapshot.flows,
                snapshot.summary.total() as usize + snapshot.unrecognized,
                "label counts disagree with the row count"
            );
            assert_eq!(snapshot.all_flows.len(), snapshot.flows);
            assert!(
                [0, 3, 200].contains(&snapshot.flows),
                "torn table with {} rows",
                snapshot.flows
            );
            sizes.push(snapshot.flows);
        }
        sizes
    })
    .await
    .unwrap();
    supervisor.stop().await;

    assert!(observed.iter().any(|&n| n > 0));
}
