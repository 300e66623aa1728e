/*
* Dashboard aggregation
* ---------------------
* @project: metrics-orchestrator
*
* One dashboard request = one metrics fetch followed by one anomaly check.
* The two outcomes are merged under independent failure policies:
*
*   metrics | anomalies | result
*   --------+-----------+-------------------------------------------------
*   ok      | ok        | fresh metrics + fresh verdict, cached
*   ok      | failed    | fresh metrics + neutral verdict, cached
*   failed  | any       | last cached response if there is one, else error
*
* The check runs even when the fetch failed; it then sees the history as it
* was before this request.
*
* The last-known-good slot is only written by the two fresh branches and is
* swapped whole under its own lock, so readers always get a complete response.
*/

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, warn};

use crate::errors::OrchestratorResult;
use crate::monitoring::{
    AnomalyChecker, AnomalyVerdict, HistoryBuffer, HistorySnapshot, MetricsFetcher, SystemSnapshot,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub current_metrics: SystemSnapshot,
    pub anomalies: AnomalyVerdict,
    pub timestamp: i64,
}

/// Which merge branch produced a dashboard response.
#[derive(Debug, Clone)]
pub enum DashboardOutcome {
    Fresh(Arc<DashboardResponse>),
    /// Fresh metrics, but the anomaly check failed and a neutral verdict was used.
    AnomaliesUnavailable(Arc<DashboardResponse>),
    /// Metrics fetch failed; this is the last known good response.
    Replayed(Arc<DashboardResponse>),
}

impl DashboardOutcome {
    pub fn response(&self) -> &Arc<DashboardResponse> {
        match self {
            DashboardOutcome::Fresh(r)
            | DashboardOutcome::AnomaliesUnavailable(r)
            | DashboardOutcome::Replayed(r) => r,
        }
    }

    pub fn into_response(self) -> Arc<DashboardResponse> {
        match self {
            DashboardOutcome::Fresh(r)
            | DashboardOutcome::AnomaliesUnavailable(r)
            | DashboardOutcome::Replayed(r) => r,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, DashboardOutcome::Replayed(_))
    }
}

/// Source of the unix timestamp stamped on fresh responses.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        Utc::now().timestamp()
    }
}

pub struct DashboardAggregator {
    fetcher: MetricsFetcher,
    checker: AnomalyChecker,
    history: Arc<HistoryBuffer>,
    clock: Arc<dyn Clock>,
    last_known_good: RwLock<Option<Arc<DashboardResponse>>>,
}

impl DashboardAggregator {
    pub fn new(
        fetcher: MetricsFetcher,
        checker: AnomalyChecker,
        history: Arc<HistoryBuffer>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            fetcher,
            checker,
            history,
            clock,
            last_known_good: RwLock::new(None),
        }
    }

    /// Runs one fetch-then-check cycle and merges the outcomes.
    ///
    /// Only fails when the metrics fetch failed and nothing has been cached yet.
    pub async fn aggregate(&self) -> OrchestratorResult<DashboardOutcome> {
        let metrics = self.fetcher.fetch().await;
        let anomalies = self.checker.check().await;

        let current_metrics = match metrics {
            Ok(snapshot) => snapshot,
            Err(e) => {
                return match self.last_known_good().await {
                    Some(cached) => {
                        warn!(
                            error = %e,
                            cached_at = cached.timestamp,
                            "Error fetching metrics, serving last known good data"
                        );
                        Ok(DashboardOutcome::Replayed(cached))
                    }
                    None => {
                        error!(error = %e, "Error fetching metrics and nothing cached yet");
                        Err(e)
                    }
                };
            }
        };

        let (anomalies, degraded) = match anomalies {
            Ok(verdict) => (verdict, false),
            Err(e) => {
                warn!(error = %e, "Error checking anomalies, reporting none");
                (AnomalyVerdict::neutral(), true)
            }
        };

        let response = Arc::new(DashboardResponse {
            current_metrics,
            anomalies,
            timestamp: self.clock.now_unix(),
        });
        *self.last_known_good.write().await = Some(Arc::clone(&response));

        Ok(if degraded {
            DashboardOutcome::AnomaliesUnavailable(response)
        } else {
            DashboardOutcome::Fresh(response)
        })
    }

    pub async fn last_known_good(&self) -> Option<Arc<DashboardResponse>> {
        self.last_known_good.read().await.clone()
    }

    pub async fn history(&self) -> HistorySnapshot {
        self.history.snapshot().await
    }
}
