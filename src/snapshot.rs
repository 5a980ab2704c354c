//! One-shot, JSON-serializable report of the host state.
//!
//! Disk and network fields carry raw cumulative counters: a single report has no
//! earlier sample to derive rates from.

use crate::metrics::counters::{self, CounterSample};
use crate::metrics::gauges::{CpuSample, MemorySample};
use crate::metrics::process::SystemSampler;
use crate::metrics::HostSampler;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::System;

/// Changes whenever the shape of any nested object changes incompatibly.
pub const SCHEMA: &str = "hud.report.v1";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema: String,
    pub timestamp: String,
    pub host: HostInfo,
    pub cpu: CpuSample,
    pub memory: MemorySample,
    pub disk_io: DiskIo,
    pub net_io: NetIo,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostInfo {
    pub hostname: String,
    pub os: String,
    pub kernel: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskIo {
    pub ts: f64,
    pub read_bytes: u64,
    pub write_bytes: u64,
}

impl From<CounterSample> for DiskIo {
    fn from(s: CounterSample) -> Self {
        Self {
            ts: s.ts,
            read_bytes: s.rx_bytes,
            write_bytes: s.tx_bytes,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NetIo {
    pub ts: f64,
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

impl From<CounterSample> for NetIo {
    fn from(s: CounterSample) -> Self {
        Self {
            ts: s.ts,
            bytes_sent: s.tx_bytes,
            bytes_recv: s.rx_bytes,
        }
    }
}

/// Source of the host identity block.
pub trait HostIdentity {
    fn host_info(&self) -> HostInfo;
}

/// Host identity as reported by the OS through sysinfo.
#[derive(Debug, Clone, Copy, Default)]
pub struct SysinfoHost;

impl HostIdentity for SysinfoHost {
    fn host_info(&self) -> HostInfo {
        let kernel = System::kernel_version().unwrap_or_default();
        let os = System::long_os_version()
            .or_else(System::name)
            .unwrap_or_else(|| std::env::consts::OS.to_string());
        HostInfo {
            hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
            os,
            kernel,
        }
    }
}

/// Second-precision UTC time, e.g. `2024-05-01T12:00:00Z`.
pub fn utc_iso(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn now_utc_iso() -> String {
    utc_iso(Utc::now())
}

/// Builds a report from live OS data.
pub fn build_snapshot() -> Snapshot {
    let mut sampler = SystemSampler::new();
    sampler.warm_up();
    build_snapshot_with(&mut sampler, &SysinfoHost)
}

/// Builds a report calling each sampler and the host lookup exactly once.
pub fn build_snapshot_with<S>(sampler: &mut S, host: &dyn HostIdentity) -> Snapshot
where
    S: HostSampler + ?Sized,
{
    let host = host.host_info();
    let cpu = sampler.sample_cpu();
    let memory = sampler.sample_memory();

    let disks = sampler.sample_disk_counters_per_device();
    let disk_ts = disks
        .values()
        .map(|s| s.ts)
        .next()
        .unwrap_or_else(counters::now_ts);
    let disk_io = counters::aggregate(disks.values(), disk_ts);
    let net_io = counters::aggregate_network(&sampler.sample_network_counters_per_interface());

    Snapshot {
        schema: SCHEMA.to_string(),
        timestamp: now_utc_iso(),
        host,
        cpu,
        memory,
        disk_io: disk_io.into(),
        net_io: net_io.into(),
    }
}
