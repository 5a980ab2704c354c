#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod format;
pub mod metrics;
pub mod snapshot;

pub use config::HudConfig;
pub use error::{HudError, Result};
pub use metrics::counters::{sample_disk_counters, sample_network_counters, CounterSample};
pub use metrics::history::HistoryStore;
pub use metrics::process::{ProcessLimit, ProcessRow, SortKey, SystemSampler};
pub use metrics::rate::{rate_from, Rate};
pub use metrics::{HostSampler, Metrics, RateTracker, TickReport};
pub use snapshot::{build_snapshot, Snapshot};
