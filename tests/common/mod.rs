// Shared fakes for the integration tests. Not every test binary uses all of them.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use metrics_orchestrator::dashboard::{Clock, DashboardAggregator};
use metrics_orchestrator::errors::{OrchestratorError, OrchestratorResult, Upstream};
use metrics_orchestrator::monitoring::metrics::{CpuInfo, DiskInfo, MemoryInfo};
use metrics_orchestrator::monitoring::{
    AnomalyChecker, AnomalyProvider, AnomalyVerdict, DetectRequest, HistoryBuffer, MetricsFetcher,
    MetricsProvider, SystemSnapshot,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn snapshot_with(cpu_usages: &[f32], memory_percent: f32) -> SystemSnapshot {
    SystemSnapshot {
        hostname: "test-host".to_string(),
        uptime: 4242,
        cpus: cpu_usages
            .iter()
            .enumerate()
            .map(|(i, usage)| CpuInfo {
                name: format!("cpu{}", i),
                usage: *usage,
                frequency: 3000,
            })
            .collect(),
        memory: MemoryInfo {
            total: 16_000_000,
            used: 8_000_000,
            available: 8_000_000,
            percent_used: memory_percent,
        },
        disks: vec![DiskInfo {
            name: "/dev/sda1".to_string(),
            total_space: 500_000,
            available_space: 100_000,
            percent_used: 80.0,
        }],
    }
}

pub struct FakeMetrics {
    snapshot: Mutex<Option<SystemSnapshot>>,
    calls: AtomicUsize,
}

impl FakeMetrics {
    pub fn up(snapshot: SystemSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(Some(snapshot)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn down() -> Self {
        Self {
            snapshot: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_up(&self, snapshot: SystemSnapshot) {
        *self.snapshot.lock().unwrap() = Some(snapshot);
    }

    pub fn set_down(&self) {
        *self.snapshot.lock().unwrap() = None;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsProvider for FakeMetrics {
    async fn fetch_snapshot(&self) -> OrchestratorResult<SystemSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| OrchestratorError::transport(Upstream::Metrics, "connection refused"))
    }
}

pub struct FakeAnomaly {
    verdict: Mutex<Option<AnomalyVerdict>>,
    requests: Mutex<Vec<DetectRequest>>,
}

impl FakeAnomaly {
    pub fn up(verdict: AnomalyVerdict) -> Self {
        Self {
            verdict: Mutex::new(Some(verdict)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn down() -> Self {
        Self {
            verdict: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn set_up(&self, verdict: AnomalyVerdict) {
        *self.verdict.lock().unwrap() = Some(verdict);
    }

    pub fn set_down(&self) {
        *self.verdict.lock().unwrap() = None;
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<DetectRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl AnomalyProvider for FakeAnomaly {
    async fn detect(&self, request: &DetectRequest) -> OrchestratorResult<AnomalyVerdict> {
        self.requests.lock().unwrap().push(request.clone());
        match self.verdict.lock().unwrap().clone() {
            Some(verdict) => Ok(verdict),
            None => Err(OrchestratorError::Upstream {
                upstream: Upstream::Anomaly,
                status: 503,
                body: "detector offline".to_string(),
            }),
        }
    }
}

pub struct FixedClock(AtomicI64);

impl FixedClock {
    pub fn at(unix: i64) -> Self {
        Self(AtomicI64::new(unix))
    }

    pub fn set(&self, unix: i64) {
        self.0.store(unix, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_unix(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Harness {
    pub metrics: Arc<FakeMetrics>,
    pub anomaly: Arc<FakeAnomaly>,
    pub clock: Arc<FixedClock>,
    pub history: Arc<HistoryBuffer>,
    pub aggregator: Arc<DashboardAggregator>,
}

impl Harness {
    pub fn new(metrics: FakeMetrics, anomaly: FakeAnomaly) -> Self {
        let metrics = Arc::new(metrics);
        let anomaly = Arc::new(anomaly);
        let clock = Arc::new(FixedClock::at(1_700_000_000));
        let history = Arc::new(HistoryBuffer::default());

        let fetcher = MetricsFetcher::new(metrics.clone(), Arc::clone(&history));
        let checker = AnomalyChecker::new(anomaly.clone(), Arc::clone(&history), 5);
        let aggregator = Arc::new(DashboardAggregator::new(
            fetcher,
            checker,
            Arc::clone(&history),
            clock.clone(),
        ));

        Self {
            metrics,
            anomaly,
            clock,
            history,
            aggregator,
        }
    }

    /// Both providers up, anomaly provider reporting nothing.
    pub fn healthy() -> Self {
        Self::new(
            FakeMetrics::up(snapshot_with(&[25.0, 35.0], 50.0)),
            FakeAnomaly::up(AnomalyVerdict::neutral()),
        )
    }
}

/// Serves `router` on an ephemeral localhost port.
pub async fn spawn_upstream(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}
