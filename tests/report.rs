use hudmon::metrics::gauges::{CpuSample, MemorySample};
use hudmon::snapshot::{build_snapshot_with, HostIdentity, HostInfo, SCHEMA};
use hudmon::{build_snapshot, CounterSample, HostSampler, ProcessLimit, ProcessRow, SortKey};
use serde_json::Value;
use std::cell::Cell;
use std::collections::BTreeMap;

const TOP_LEVEL_KEYS: [&str; 7] = [
    "schema",
    "timestamp",
    "host",
    "cpu",
    "memory",
    "disk_io",
    "net_io",
];

#[derive(Default)]
struct FixedHost {
    calls: Cell<usize>,
}

impl HostIdentity for FixedHost {
    fn host_info(&self) -> HostInfo {
        self.calls.set(self.calls.get() + 1);
        HostInfo {
            hostname: "box".to_string(),
            os: "TestOS 1.0".to_string(),
            kernel: "6.1.0".to_string(),
        }
    }
}

#[derive(Default)]
struct FixedSampler {
    calls: usize,
}

fn sample(ts: f64, rx: u64, tx: u64) -> CounterSample {
    CounterSample {
        ts,
        rx_bytes: rx,
        tx_bytes: tx,
    }
}

impl HostSampler for FixedSampler {
    fn sample_cpu(&mut self) -> CpuSample {
        self.calls += 1;
        CpuSample::from_raw(42.0, [40.0, 44.0])
    }

    fn sample_memory(&mut self) -> MemorySample {
        self.calls += 1;
        MemorySample::from_bytes(1000, 250, 750)
    }

    fn sample_disk_counters_per_device(&mut self) -> BTreeMap<String, CounterSample> {
        self.calls += 1;
        BTreeMap::from([
            ("sda".to_string(), sample(7.0, 100, 200)),
            ("nvme0n1".to_string(), sample(7.0, 1, 2)),
        ])
    }

    fn sample_network_counters_per_interface(&mut self) -> BTreeMap<String, CounterSample> {
        self.calls += 1;
        BTreeMap::from([
            ("lo".to_string(), sample(7.0, 9999, 9999)),
            ("eth0".to_string(), sample(7.0, 1500, 1100)),
        ])
    }

    fn sample_processes(&mut self, _limit: ProcessLimit, _sort_by: SortKey) -> Vec<ProcessRow> {
        panic!("a snapshot never lists processes");
    }
}

#[test]
fn snapshot_from_fixed_sources() {
    let host = FixedHost::default();
    let mut sampler = FixedSampler::default();
    let snap = build_snapshot_with(&mut sampler, &host);

    assert_eq!(host.calls.get(), 1);
    assert_eq!(sampler.calls, 4);

    assert_eq!(snap.schema, SCHEMA);
    assert_eq!(snap.host.hostname, "box");
    assert_eq!(snap.cpu.percent_total, 42.0);
    assert_eq!(snap.memory.percent, 25.0);
    assert_eq!(snap.disk_io.read_bytes, 101);
    assert_eq!(snap.disk_io.write_bytes, 202);
    assert_eq!(snap.net_io.bytes_recv, 1500);
    assert_eq!(snap.net_io.bytes_sent, 1100);
    assert!(snap.timestamp.ends_with('Z'));
}

#[test]
fn snapshot_json_round_trip_keeps_every_field() {
    let host = FixedHost::default();
    let mut sampler = FixedSampler::default();
    let snap = build_snapshot_with(&mut sampler, &host);

    let json = serde_json::to_string(&snap).unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();
    let object = value.as_object().unwrap();
    let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    let mut expected = TOP_LEVEL_KEYS.to_vec();
    expected.sort_unstable();
    assert_eq!(keys, expected);

    assert_eq!(value["host"]["kernel"], "6.1.0");
    assert_eq!(value["cpu"]["per_cpu"].as_array().unwrap().len(), 2);
    assert_eq!(value["memory"]["available"], 750);
    assert_eq!(value["disk_io"]["read_bytes"], 101);
    assert_eq!(value["net_io"]["bytes_sent"], 1100);

    let back: hudmon::Snapshot = serde_json::from_value(value).unwrap();
    assert_eq!(back, snap);
}

#[test]
fn live_snapshot_has_stable_shape() {
    let snap = build_snapshot();
    let value = serde_json::to_value(&snap).unwrap();
    for key in TOP_LEVEL_KEYS {
        assert!(value.get(key).is_some(), "missing key {key}");
    }
    assert_eq!(value["schema"], SCHEMA);
    for key in ["hostname", "os", "kernel"] {
        assert!(value["host"][key].is_string());
    }
    for key in ["total", "used", "available"] {
        assert!(value["memory"][key].is_u64());
    }
    assert!(value["memory"]["percent"].is_f64());
    assert!(value["disk_io"]["read_bytes"].is_u64());
    assert!(value["net_io"]["bytes_recv"].is_u64());

    assert!((0.0..=100.0).contains(&snap.cpu.percent_total));
    assert!(snap.cpu.per_cpu.iter().all(|v| (0.0..=100.0).contains(v)));
}
