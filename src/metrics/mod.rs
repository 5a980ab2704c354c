pub mod circular_buffer;
pub mod counters;
pub mod gauges;
pub mod history;
pub mod process;
pub mod rate;
pub mod smooth;

use crate::config::HudConfig;
use counters::CounterSample;
use gauges::{CpuSample, MemorySample};
use history::{HistoryStore, Smoothing};
use log::{debug, info};
use process::{ProcessLimit, ProcessRow, SortKey, SystemSampler};
use rate::{rate_from, Rate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// The OS reads one tick needs. [`SystemSampler`] is the real implementation.
pub trait HostSampler {
    fn sample_cpu(&mut self) -> CpuSample;
    fn sample_memory(&mut self) -> MemorySample;
    fn sample_disk_counters_per_device(&mut self) -> BTreeMap<String, CounterSample>;
    fn sample_network_counters_per_interface(&mut self) -> BTreeMap<String, CounterSample>;
    fn sample_processes(&mut self, limit: ProcessLimit, sort_by: SortKey) -> Vec<ProcessRow>;
}

impl HostSampler for SystemSampler {
    fn sample_cpu(&mut self) -> CpuSample {
        SystemSampler::sample_cpu(self)
    }

    fn sample_memory(&mut self) -> MemorySample {
        SystemSampler::sample_memory(self)
    }

    fn sample_disk_counters_per_device(&mut self) -> BTreeMap<String, CounterSample> {
        counters::sample_disk_counters_per_device()
    }

    fn sample_network_counters_per_interface(&mut self) -> BTreeMap<String, CounterSample> {
        SystemSampler::sample_network_counters_per_interface(self)
    }

    fn sample_processes(&mut self, limit: ProcessLimit, sort_by: SortKey) -> Vec<ProcessRow> {
        SystemSampler::sample_processes(self, limit, sort_by)
    }
}

/// Previous counter sample per key, owned by whoever drives the sampling loop.
#[derive(Debug, Clone, Default)]
pub struct RateTracker {
    previous: HashMap<String, CounterSample>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rate between the stored sample for `key` and `current`, without storing anything.
    /// An unseen key yields [`Rate::ZERO`].
    pub fn rate_for(&self, key: &str, current: &CounterSample) -> Rate {
        let rate = match self.previous.get(key) {
            Some(prev) => rate_from(prev, current),
            None => Rate::ZERO,
        };
        if rate.interval == 0.0 && self.previous.contains_key(key) {
            debug!("Non-positive interval for {key}, reporting zero rate");
        }
        rate
    }

    pub fn record(&mut self, key: &str, sample: CounterSample) {
        self.previous.insert(key.to_string(), sample);
    }

    /// Computes the rate for `key` and stores `sample` as its new baseline.
    pub fn observe(&mut self, key: &str, sample: CounterSample) -> Rate {
        let rate = self.rate_for(key, &sample);
        self.record(key, sample);
        rate
    }

    pub fn previous(&self, key: &str) -> Option<&CounterSample> {
        self.previous.get(key)
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        self.previous.retain(|key, _| keep(key));
    }

    pub fn len(&self) -> usize {
        self.previous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }
}

/// Current rates of one device or interface plus its history views.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IoView {
    pub rx_bps: f64,
    pub tx_bps: f64,
    pub rx_history: Vec<f64>,
    pub tx_history: Vec<f64>,
}

/// Everything one tick produced, ready for a renderer.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub ts: f64,
    pub cpu: CpuSample,
    pub memory: MemorySample,
    pub cpu_history: Vec<f64>,
    pub memory_history: Vec<f64>,
    pub disks: BTreeMap<String, IoView>,
    pub nics: BTreeMap<String, IoView>,
    /// All physical devices together.
    pub disk_total: IoView,
    /// All interfaces together, loopback excluded.
    pub net_total: IoView,
    pub processes: Vec<ProcessRow>,
}

#[derive(Debug, Clone, Copy)]
enum IoKind {
    Disk,
    Net,
}

impl IoKind {
    fn tracker_key(self, name: &str) -> String {
        match self {
            IoKind::Disk => format!("disk:{name}"),
            IoKind::Net => format!("net:{name}"),
        }
    }

    /// `(rx, tx)` history keys.
    fn series_keys(self, name: &str) -> (String, String) {
        match self {
            IoKind::Disk => (history::disk_read_key(name), history::disk_write_key(name)),
            IoKind::Net => (history::net_rx_key(name), history::net_tx_key(name)),
        }
    }
}

struct PendingIo {
    kind: IoKind,
    name: String,
    sample: CounterSample,
    rate: Rate,
}

/// Drives sample → rate → history for each tick.
#[derive(Debug, Clone)]
pub struct Metrics {
    rates: RateTracker,
    history: HistoryStore,
    smoothing: Smoothing,
    process_limit: ProcessLimit,
    sort_by: SortKey,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new(&HudConfig::default())
    }
}

impl Metrics {
    pub fn new(config: &HudConfig) -> Self {
        Self {
            rates: RateTracker::new(),
            history: HistoryStore::new(config.history_len),
            smoothing: Smoothing::new(config.smoothing, config.smoothing_alpha),
            process_limit: ProcessLimit::from(config.process_limit),
            sort_by: config.sort_by,
        }
    }

    /// Applies a new configuration without discarding collected history.
    pub fn apply_config(&mut self, config: &HudConfig) {
        self.history.resize(config.history_len);
        self.smoothing = Smoothing::new(config.smoothing, config.smoothing_alpha);
        self.process_limit = ProcessLimit::from(config.process_limit);
        self.sort_by = config.sort_by;
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn rates(&self) -> &RateTracker {
        &self.rates
    }

    pub fn smoothing(&self) -> Smoothing {
        self.smoothing
    }

    /// Runs one tick.
    ///
    /// All samples are taken and all rates computed before any state changes, so
    /// an interrupted tick leaves the tracker and the histories untouched.
    pub fn tick<S: HostSampler + ?Sized>(&mut self, sampler: &mut S) -> TickReport {
        let cpu = sampler.sample_cpu();
        let memory = sampler.sample_memory();
        let disk_samples = sampler.sample_disk_counters_per_device();
        let net_samples = sampler.sample_network_counters_per_interface();
        let processes = sampler.sample_processes(self.process_limit, self.sort_by);

        let disk_sum = counters::aggregate(disk_samples.values(), first_ts(&disk_samples));
        let net_sum = counters::aggregate_network(&net_samples);
        let disk_total = self.pending_one(IoKind::Disk, history::TOTAL.to_string(), disk_sum);
        let net_total = self.pending_one(IoKind::Net, history::TOTAL.to_string(), net_sum);
        let disks = self.pending(IoKind::Disk, disk_samples);
        let nics = self.pending(IoKind::Net, net_samples);
        let ts = disks
            .iter()
            .chain(nics.iter())
            .map(|p| p.sample.ts)
            .next()
            .unwrap_or_else(counters::now_ts);

        let io: Vec<&PendingIo> = disks
            .iter()
            .chain(nics.iter())
            .chain([&disk_total, &net_total])
            .collect();
        self.commit(&cpu, &memory, &io);

        let report = TickReport {
            ts,
            cpu_history: self.history.view(history::CPU_SERIES, self.smoothing),
            memory_history: self.history.view(history::MEMORY_SERIES, self.smoothing),
            disks: self.views(&disks),
            nics: self.views(&nics),
            disk_total: self.view(&disk_total),
            net_total: self.view(&net_total),
            cpu,
            memory,
            processes,
        };
        info!(
            "Tick: cpu={:.1}% mem={:.1}% disk={:.0}/{:.0}B/s net={:.0}/{:.0}B/s disks={} nics={} procs={}",
            report.cpu.percent_total,
            report.memory.percent,
            report.disk_total.rx_bps,
            report.disk_total.tx_bps,
            report.net_total.rx_bps,
            report.net_total.tx_bps,
            report.disks.len(),
            report.nics.len(),
            report.processes.len()
        );
        report
    }

    fn pending_one(&self, kind: IoKind, name: String, sample: CounterSample) -> PendingIo {
        let rate = self.rates.rate_for(&kind.tracker_key(&name), &sample);
        PendingIo {
            kind,
            name,
            sample,
            rate,
        }
    }

    fn pending(&self, kind: IoKind, samples: BTreeMap<String, CounterSample>) -> Vec<PendingIo> {
        samples
            .into_iter()
            .map(|(name, sample)| self.pending_one(kind, name, sample))
            .collect()
    }

    fn commit(&mut self, cpu: &CpuSample, memory: &MemorySample, io: &[&PendingIo]) {
        self.history.push(history::CPU_SERIES, cpu.percent_total);
        self.history.push(history::MEMORY_SERIES, memory.percent);

        for p in io {
            let (rx_key, tx_key) = p.kind.series_keys(&p.name);
            self.rates.record(&p.kind.tracker_key(&p.name), p.sample);
            self.history.push(&rx_key, p.rate.rx_bps);
            self.history.push(&tx_key, p.rate.tx_bps);
        }

        // Devices and interfaces that disappeared lose their baselines and histories.
        let live: Vec<String> = io.iter().map(|p| p.kind.tracker_key(&p.name)).collect();
        self.rates.retain(|key| live.iter().any(|k| k == key));
        self.history.retain(|key| {
            key == history::CPU_SERIES
                || key == history::MEMORY_SERIES
                || live.iter().any(|k| series_belongs_to(key, k))
        });
    }

    fn view(&self, p: &PendingIo) -> IoView {
        let (rx_key, tx_key) = p.kind.series_keys(&p.name);
        IoView {
            rx_bps: p.rate.rx_bps,
            tx_bps: p.rate.tx_bps,
            rx_history: self.history.view(&rx_key, self.smoothing),
            tx_history: self.history.view(&tx_key, self.smoothing),
        }
    }

    fn views(&self, pending: &[PendingIo]) -> BTreeMap<String, IoView> {
        pending
            .iter()
            .map(|p| (p.name.clone(), self.view(p)))
            .collect()
    }
}

fn first_ts(samples: &BTreeMap<String, CounterSample>) -> f64 {
    samples
        .values()
        .map(|s| s.ts)
        .next()
        .unwrap_or_else(counters::now_ts)
}

/// `disk:sda:read` belongs to `disk:sda`.
fn series_belongs_to(series_key: &str, tracker_key: &str) -> bool {
    series_key
        .strip_prefix(tracker_key)
        .is_some_and(|rest| rest.starts_with(':') && !rest[1..].contains(':'))
}
