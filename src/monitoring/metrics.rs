/*
* Hardware metrics intake
* -----------------------
* @project: metrics-orchestrator
*
* This module owns everything between the hardware-metrics provider and the
* rolling history:
*
* 1. SystemSnapshot: one poll of the provider (hostname, uptime, per-core CPU
*    readings, a memory summary and the disk list). Transient, only kept long
*    enough to feed the history and be embedded in the dashboard response.
*
* 2. MetricsProvider: the capability the fetcher depends on. The production
*    implementation lives in `upstream.rs`; tests plug in deterministic fakes.
*
* 3. MetricsFetcher: polls the provider, averages the per-core usage and pushes
*    (mean cpu, memory percent) into the HistoryBuffer.
*
* A snapshot without any CPU readings is still handed back to the caller, it
* just does not contribute a history sample.
*/

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::OrchestratorResult;
use crate::monitoring::history::HistoryBuffer;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CpuInfo {
    pub name: String,
    pub usage: f32,
    pub frequency: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryInfo {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub percent_used: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskInfo {
    pub name: String,
    pub total_space: u64,
    pub available_space: u64,
    pub percent_used: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemSnapshot {
    pub hostname: String,
    pub uptime: u64,
    pub cpus: Vec<CpuInfo>,
    pub memory: MemoryInfo,
    pub disks: Vec<DiskInfo>,
}

impl SystemSnapshot {
    /// Arithmetic mean of all per-core usage readings, `None` without cores.
    pub fn mean_cpu_usage(&self) -> Option<f32> {
        if self.cpus.is_empty() {
            return None;
        }
        let total: f32 = self.cpus.iter().map(|cpu| cpu.usage).sum();
        Some(total / self.cpus.len() as f32)
    }
}

#[async_trait]
pub trait MetricsProvider: Send + Sync {
    async fn fetch_snapshot(&self) -> OrchestratorResult<SystemSnapshot>;
}

pub struct MetricsFetcher {
    provider: Arc<dyn MetricsProvider>,
    history: Arc<HistoryBuffer>,
}

impl MetricsFetcher {
    pub fn new(provider: Arc<dyn MetricsProvider>, history: Arc<HistoryBuffer>) -> Self {
        Self { provider, history }
    }

    /// Polls the provider once and records the derived sample.
    pub async fn fetch(&self) -> OrchestratorResult<SystemSnapshot> {
        let snapshot = self.provider.fetch_snapshot().await?;

        match snapshot.mean_cpu_usage() {
            Some(cpu) => {
                let memory = snapshot.memory.percent_used;
                self.history.append(cpu, memory).await;
                info!(
                    host = %snapshot.hostname,
                    cores = snapshot.cpus.len(),
                    "Fetched metrics - CPU: {:.1}% Memory: {:.1}%",
                    cpu,
                    memory
                );
            }
            None => {
                warn!(
                    host = %snapshot.hostname,
                    "Metrics snapshot has no CPU readings, history not updated"
                );
            }
        }

        Ok(snapshot)
    }
}
