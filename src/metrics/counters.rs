//! Cumulative byte counters for block devices and network interfaces.
//!
//! Every sampler here degrades to zero-valued samples (or an empty map) when the
//! platform does not expose the counters. A missing metric is never an error.

use chrono::Utc;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use sysinfo::Networks;

/// `/proc/diskstats` always counts in 512-byte sectors, whatever the device uses.
const SECTOR_SIZE: u64 = 512;
const DISKSTATS_PATH: &str = "/proc/diskstats";
const LOOPBACK: &str = "lo";

/// Device name prefixes that never represent physical storage.
const VIRTUAL_DEVICE_PREFIXES: &[&str] = &["loop", "ram", "zram", "dm-", "sr", "fd"];

/// Cumulative counter pair captured at `ts`.
///
/// For block devices `rx` is bytes read and `tx` bytes written; for network
/// interfaces `rx` is bytes received and `tx` bytes sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterSample {
    /// Capture time in seconds since the UNIX epoch.
    pub ts: f64,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
}

/// Wall-clock seconds since the UNIX epoch with microsecond resolution.
pub fn now_ts() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// One line of `/proc/diskstats`, reduced to what rate computation needs.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskStat {
    pub device: String,
    pub read_sectors: u64,
    pub write_sectors: u64,
}

/// Parses `/proc/diskstats` content.
///
/// Format: major minor name reads r_merged r_sectors r_time writes w_merged w_sectors ...
pub fn parse_diskstats(content: &str) -> Vec<DiskStat> {
    let mut disks = Vec::new();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 14 {
            continue; // Skip malformed lines
        }

        let get_val =
            |idx: usize| -> u64 { parts.get(idx).and_then(|s| s.parse().ok()).unwrap_or(0) };

        disks.push(DiskStat {
            device: parts[2].to_string(),
            read_sectors: get_val(5),
            write_sectors: get_val(9),
        });
    }

    disks
}

fn is_virtual_device(name: &str) -> bool {
    VIRTUAL_DEVICE_PREFIXES
        .iter()
        .any(|prefix| name.starts_with(prefix))
}

/// `sda1` of `sda`, `nvme0n1p2` of `nvme0n1`, `mmcblk0p1` of `mmcblk0`.
fn is_partition_of(name: &str, parent: &str) -> bool {
    let Some(rest) = name.strip_prefix(parent) else {
        return false;
    };
    let digits = rest.strip_prefix('p').unwrap_or(rest);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Turns parsed diskstats into per-device byte counters, keeping whole physical
/// devices only so that partitions are not counted twice.
pub fn disk_counters_from_stats(stats: &[DiskStat], ts: f64) -> BTreeMap<String, CounterSample> {
    let names: Vec<&str> = stats
        .iter()
        .map(|s| s.device.as_str())
        .filter(|name| !is_virtual_device(name))
        .collect();

    stats
        .iter()
        .filter(|s| names.contains(&s.device.as_str()))
        .filter(|s| {
            !names
                .iter()
                .any(|parent| *parent != s.device && is_partition_of(&s.device, parent))
        })
        .map(|s| {
            (
                s.device.clone(),
                CounterSample {
                    ts,
                    rx_bytes: s.read_sectors.saturating_mul(SECTOR_SIZE),
                    tx_bytes: s.write_sectors.saturating_mul(SECTOR_SIZE),
                },
            )
        })
        .collect()
}

/// Sums per-key samples into one aggregate stamped with `ts`.
pub fn aggregate<'a, I>(samples: I, ts: f64) -> CounterSample
where
    I: IntoIterator<Item = &'a CounterSample>,
{
    let empty = CounterSample {
        ts,
        ..CounterSample::default()
    };
    samples.into_iter().fold(empty, |acc, s| CounterSample {
        ts,
        rx_bytes: acc.rx_bytes.saturating_add(s.rx_bytes),
        tx_bytes: acc.tx_bytes.saturating_add(s.tx_bytes),
    })
}

/// Per-device disk counters. Empty when the platform exposes none.
pub fn sample_disk_counters_per_device() -> BTreeMap<String, CounterSample> {
    if !cfg!(target_os = "linux") {
        return BTreeMap::new();
    }
    match std::fs::read_to_string(DISKSTATS_PATH) {
        Ok(content) => disk_counters_from_stats(&parse_diskstats(&content), now_ts()),
        Err(e) => {
            debug!("Disk counters unavailable ({DISKSTATS_PATH}: {e})");
            BTreeMap::new()
        }
    }
}

/// Aggregate disk counters over all physical devices.
pub fn sample_disk_counters() -> CounterSample {
    let ts = now_ts();
    aggregate(sample_disk_counters_per_device().values(), ts)
}

/// Per-interface network counters, loopback included.
pub fn sample_network_counters_per_interface() -> BTreeMap<String, CounterSample> {
    let networks = Networks::new_with_refreshed_list();
    network_counters_from(&networks)
}

pub(crate) fn network_counters_from(networks: &Networks) -> BTreeMap<String, CounterSample> {
    let ts = now_ts();
    networks
        .iter()
        .map(|(name, data)| {
            (
                name.clone(),
                CounterSample {
                    ts,
                    rx_bytes: data.total_received(),
                    tx_bytes: data.total_transmitted(),
                },
            )
        })
        .collect()
}

/// Aggregate network counters over every interface except loopback.
pub fn sample_network_counters() -> CounterSample {
    aggregate_network(&sample_network_counters_per_interface())
}

pub(crate) fn aggregate_network(per_interface: &BTreeMap<String, CounterSample>) -> CounterSample {
    let ts = per_interface
        .values()
        .map(|s| s.ts)
        .next()
        .unwrap_or_else(now_ts);
    aggregate(
        per_interface
            .iter()
            .filter(|(name, _)| name.as_str() != LOOPBACK)
            .map(|(_, s)| s),
        ts,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISKSTATS: &str = "\
   7       0 loop0 100 0 2000 10 0 0 0 0 0 10 10 0 0 0 0
   8       0 sda 1234 0 1000 100 5678 0 2000 200 0 150 300 0 0 0 0
   8       1 sda1 1000 0 900 80 5000 0 1900 180 0 130 260 0 0 0 0
 259       0 nvme0n1 9999 0 4 500 8888 0 8 400 5 1000 2000 0 0 0 0
 259       1 nvme0n1p1 9999 0 4 500 8888 0 8 400 5 1000 2000 0 0 0 0
 253       0 dm-0 1 0 50 1 1 0 50 1 0 1 1 0 0 0 0
   1       0 ram0 0 0 0 0 0 0 0
";

    #[test]
    fn parses_sectors() {
        let stats = parse_diskstats(DISKSTATS);
        // ram0 has too few fields.
        assert_eq!(stats.len(), 6);
        assert!(stats.iter().all(|s| s.device != "ram0"));
        assert_eq!(stats[1].device, "sda");
        assert_eq!(stats[1].read_sectors, 1000);
        assert_eq!(stats[1].write_sectors, 2000);
    }

    #[test]
    fn keeps_whole_physical_devices_only() {
        let stats = parse_diskstats(DISKSTATS);
        let per_device = disk_counters_from_stats(&stats, 42.0);
        let names: Vec<&str> = per_device.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["nvme0n1", "sda"]);

        let sda = per_device["sda"];
        assert_eq!(sda.ts, 42.0);
        assert_eq!(sda.rx_bytes, 1000 * 512);
        assert_eq!(sda.tx_bytes, 2000 * 512);
    }

    #[test]
    fn aggregate_sums_devices() {
        let stats = parse_diskstats(DISKSTATS);
        let per_device = disk_counters_from_stats(&stats, 1.0);
        let total = aggregate(per_device.values(), 1.0);
        assert_eq!(total.rx_bytes, (1000 + 4) * 512);
        assert_eq!(total.tx_bytes, (2000 + 8) * 512);
    }

    #[test]
    fn empty_input_is_zero() {
        let per_device = disk_counters_from_stats(&parse_diskstats(""), 3.0);
        assert!(per_device.is_empty());
        let total = aggregate(per_device.values(), 3.0);
        assert_eq!(total.rx_bytes, 0);
        assert_eq!(total.tx_bytes, 0);
        assert_eq!(total.ts, 3.0);
    }

    #[test]
    fn partition_detection() {
        assert!(is_partition_of("sda1", "sda"));
        assert!(is_partition_of("nvme0n1p2", "nvme0n1"));
        assert!(is_partition_of("mmcblk0p1", "mmcblk0"));
        assert!(!is_partition_of("sdb", "sda"));
        assert!(!is_partition_of("sda", "sda"));
        assert!(!is_partition_of("nvme0n1", "nvme0"));
    }

    #[test]
    fn network_aggregate_skips_loopback() {
        let mut per_interface = BTreeMap::new();
        per_interface.insert(
            "lo".to_string(),
            CounterSample {
                ts: 5.0,
                rx_bytes: 1_000_000,
                tx_bytes: 1_000_000,
            },
        );
        per_interface.insert(
            "eth0".to_string(),
            CounterSample {
                ts: 5.0,
                rx_bytes: 300,
                tx_bytes: 200,
            },
        );
        let total = aggregate_network(&per_interface);
        assert_eq!(total.ts, 5.0);
        assert_eq!(total.rx_bytes, 300);
        assert_eq!(total.tx_bytes, 200);
    }

    #[test]
    fn live_samplers_never_fail() {
        let disk = sample_disk_counters();
        assert!(disk.ts > 0.0);
        let net = sample_network_counters();
        assert!(net.ts > 0.0);
    }
}
