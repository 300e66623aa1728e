//! Rolling CPU/memory history shared by the fetcher, the anomaly checker and `/history`.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// Number of samples kept per series unless configured otherwise.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// An owned copy of both series, oldest sample first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub cpu: Vec<f32>,
    pub memory: Vec<f32>,
}

impl HistorySnapshot {
    pub fn len(&self) -> usize {
        self.cpu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cpu.is_empty()
    }
}

#[derive(Debug, Default)]
struct Series {
    cpu: VecDeque<f32>,
    memory: VecDeque<f32>,
}

/// Fixed-capacity sliding window over two parallel series.
///
/// Both series live behind one lock so a reader can never observe them at
/// different lengths. When an append pushes the window past capacity the
/// oldest pair is dropped.
#[derive(Debug)]
pub struct HistoryBuffer {
    series: Mutex<Series>,
    capacity: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryBuffer {
    /// `capacity` is bounded by `Settings::validate` before it gets here.
    pub fn new(capacity: usize) -> Self {
        Self {
            series: Mutex::new(Series::default()),
            capacity,
        }
    }

    /// Appends one sample to each series, evicting the oldest pair when full.
    pub async fn append(&self, cpu: f32, memory: f32) {
        let mut series = self.series.lock().await;
        series.cpu.push_back(cpu);
        series.memory.push_back(memory);
        if series.cpu.len() > self.capacity {
            series.cpu.pop_front();
            series.memory.pop_front();
        }
        debug_assert_eq!(series.cpu.len(), series.memory.len());
    }

    pub async fn snapshot(&self) -> HistorySnapshot {
        let series = self.series.lock().await;
        HistorySnapshot {
            cpu: series.cpu.iter().copied().collect(),
            memory: series.memory.iter().copied().collect(),
        }
    }

    pub async fn len(&self) -> usize {
        self.series.lock().await.cpu.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
