use super::{flatten_cmdline, normalize_process_cpu, rank_rows, ProcessLimit, ProcessRow, SortKey};
use crate::metrics::counters::{self, CounterSample};
use crate::metrics::gauges::{CpuSample, MemorySample};
use log::debug;
use std::collections::BTreeMap;
use std::time::Instant;
use sysinfo::{
    CpuRefreshKind, MemoryRefreshKind, Networks, Process, ProcessRefreshKind, ProcessStatus,
    ProcessesToUpdate, RefreshKind, System, UpdateKind,
};

/// Long-lived handle on the OS counters.
///
/// CPU percentages (machine-wide and per process) are computed by sysinfo from the
/// difference between two refreshes, so the sampler must be kept across ticks.
pub struct SystemSampler {
    system: System,
    networks: Networks,
    last_update: Instant,
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSampler {
    pub fn new() -> Self {
        let mut system = System::new_with_specifics(
            RefreshKind::nothing()
                .with_cpu(CpuRefreshKind::nothing().with_cpu_usage())
                .with_memory(MemoryRefreshKind::nothing().with_ram()),
        );
        system.refresh_cpu_usage();
        system.refresh_processes_specifics(ProcessesToUpdate::All, true, process_refresh_kind());

        Self {
            system,
            networks: Networks::new_with_refreshed_list(),
            last_update: Instant::now(),
        }
    }

    /// Waits until CPU usage has a meaningful baseline, for one-shot callers.
    pub fn warm_up(&mut self) {
        let elapsed = self.last_update.elapsed();
        if elapsed < sysinfo::MINIMUM_CPU_UPDATE_INTERVAL {
            std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL - elapsed);
        }
    }

    pub fn logical_cores(&self) -> usize {
        self.system.cpus().len().max(1)
    }

    pub fn sample_cpu(&mut self) -> CpuSample {
        self.system.refresh_cpu_usage();
        self.last_update = Instant::now();
        CpuSample::from_raw(
            self.system.global_cpu_usage(),
            self.system.cpus().iter().map(|cpu| cpu.cpu_usage()),
        )
    }

    pub fn sample_memory(&mut self) -> MemorySample {
        self.system.refresh_memory();
        MemorySample::from_bytes(
            self.system.total_memory(),
            self.system.used_memory(),
            self.system.available_memory(),
        )
    }

    /// Per-interface counters from the kept interface table. Interfaces that appeared
    /// since the last call are added and the ones that went away are dropped.
    pub fn sample_network_counters_per_interface(&mut self) -> BTreeMap<String, CounterSample> {
        self.networks.refresh(true);
        counters::network_counters_from(&self.networks)
    }

    /// Takes a fresh process listing, ranked by `sort_by` and cut to `limit`.
    ///
    /// Processes that vanished, cannot be read, or are zombies are skipped.
    pub fn sample_processes(&mut self, limit: ProcessLimit, sort_by: SortKey) -> Vec<ProcessRow> {
        self.system.refresh_cpu_usage();
        self.system
            .refresh_processes_specifics(ProcessesToUpdate::All, true, process_refresh_kind());
        self.last_update = Instant::now();

        let cores = self.logical_cores();
        let mut skipped = 0usize;
        let rows: Vec<ProcessRow> = self
            .system
            .processes()
            .values()
            .filter_map(|process| {
                let row = collect_process_row(process, cores);
                if row.is_none() {
                    skipped += 1;
                }
                row
            })
            .collect();

        debug!(
            "Collected {} processes ({} skipped, limit={:?}, sort_by={})",
            rows.len(),
            skipped,
            limit,
            sort_by
        );
        rank_rows(rows, limit, sort_by)
    }
}

fn process_refresh_kind() -> ProcessRefreshKind {
    ProcessRefreshKind::nothing()
        .with_cpu()
        .with_memory()
        .with_cmd(UpdateKind::OnlyIfNotSet)
}

fn collect_process_row(process: &Process, cores: usize) -> Option<ProcessRow> {
    // Threads show up as processes on Linux; their usage is already in the parent.
    if process.thread_kind().is_some() {
        return None;
    }
    if matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead) {
        return None;
    }

    let pid = process.pid().as_u32();
    let name = {
        let name = process.name().to_string_lossy().into_owned();
        if name.is_empty() {
            format!("pid:{pid}")
        } else {
            name
        }
    };
    let args: Vec<String> = process
        .cmd()
        .iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    Some(ProcessRow {
        pid,
        cmdline: flatten_cmdline(&args, &name),
        name,
        cpu_percent: normalize_process_cpu(process.cpu_usage(), cores),
        rss_bytes: process.memory(),
    })
}
