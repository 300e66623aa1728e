pub mod anomaly_detection;
pub mod history;
pub mod metrics;
pub mod upstream;

pub use anomaly_detection::{AnomalyChecker, AnomalyProvider, AnomalyVerdict, DetectRequest};
pub use history::{HistoryBuffer, HistorySnapshot};
pub use metrics::{MetricsFetcher, MetricsProvider, SystemSnapshot};
pub use upstream::{HttpAnomalyProvider, HttpMetricsProvider};
