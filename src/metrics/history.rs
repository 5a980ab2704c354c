use super::circular_buffer::CircularBuffer;
use super::smooth::ema;
use log::debug;
use std::collections::HashMap;

/// Smallest history length a store accepts; shorter requests are clamped.
pub const MIN_HISTORY_LEN: usize = 4;

/// Series key for the aggregate CPU percentage.
pub const CPU_SERIES: &str = "cpu";
/// Series key for the memory percentage.
pub const MEMORY_SERIES: &str = "mem";

/// Stands in for the device or interface name in aggregate series, e.g. `disk:*:read`.
/// No kernel device or interface name contains `*`.
pub const TOTAL: &str = "*";

pub fn disk_read_key(device: &str) -> String {
    format!("disk:{device}:read")
}

pub fn disk_write_key(device: &str) -> String {
    format!("disk:{device}:write")
}

pub fn net_rx_key(interface: &str) -> String {
    format!("net:{interface}:rx")
}

pub fn net_tx_key(interface: &str) -> String {
    format!("net:{interface}:tx")
}

/// Read-side smoothing applied by [`HistoryStore::view`]. Never touches stored values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Smoothing {
    pub enabled: bool,
    pub alpha: f64,
}

impl Smoothing {
    pub fn new(enabled: bool, alpha: f64) -> Self {
        let alpha = if alpha.is_nan() { 0.0 } else { alpha.clamp(0.0, 1.0) };
        Self { enabled, alpha }
    }

    pub fn off() -> Self {
        Self::new(false, 0.0)
    }

    pub fn apply(&self, raw: Vec<f64>) -> Vec<f64> {
        if self.enabled && !raw.is_empty() {
            ema(&raw, self.alpha)
        } else {
            raw
        }
    }
}

impl Default for Smoothing {
    fn default() -> Self {
        Self::off()
    }
}

/// Rolling histories for trend visualization, one ring buffer per series key.
///
/// Series are created lazily on first push with the store's current capacity.
/// Each series is owned independently, so writes to one key never touch another.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    series: HashMap<String, CircularBuffer<f64>>,
    capacity: usize,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(60)
    }
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            series: HashMap::new(),
            capacity: clamp_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn push(&mut self, key: &str, value: f64) {
        let capacity = self.capacity;
        match self.series.get_mut(key) {
            Some(buf) => buf.push(value),
            None => {
                let mut buf = CircularBuffer::new(capacity);
                buf.push(value);
                self.series.insert(key.to_string(), buf);
            }
        }
    }

    /// Raw values for `key`, oldest first. Unknown keys yield an empty vector.
    pub fn values(&self, key: &str) -> Vec<f64> {
        self.series
            .get(key)
            .map(|buf| buf.to_vec())
            .unwrap_or_default()
    }

    /// Values for `key` passed through `smoothing`.
    pub fn view(&self, key: &str, smoothing: Smoothing) -> Vec<f64> {
        smoothing.apply(self.values(key))
    }

    pub fn latest(&self, key: &str) -> f64 {
        self.series
            .get(key)
            .and_then(|buf| buf.last().copied())
            .unwrap_or(0.0)
    }

    /// Applies a new capacity to every existing series and to series created later.
    pub fn resize(&mut self, new_capacity: usize) {
        let new_capacity = clamp_capacity(new_capacity);
        if new_capacity == self.capacity {
            return;
        }
        debug!(
            "Resizing history store from {} to {} points",
            self.capacity, new_capacity
        );
        self.capacity = new_capacity;
        for buf in self.series.values_mut() {
            buf.resize(new_capacity);
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.series.contains_key(key)
    }

    /// Drops every series whose key does not satisfy `keep`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.series.retain(|key, _| keep(key));
    }
}

fn clamp_capacity(capacity: usize) -> usize {
    capacity.max(MIN_HISTORY_LEN)
}
