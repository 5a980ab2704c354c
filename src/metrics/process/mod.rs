mod monitor;

pub use monitor::*;

use super::gauges::normalize_percent;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Longest command line kept for display, ellipsis included.
pub const CMDLINE_MAX_CHARS: usize = 120;
const ELLIPSIS: &str = "...";

/// One process at one instant. Rebuilt from scratch on every sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRow {
    pub pid: u32,
    pub name: String,
    pub cmdline: String,
    /// Share of the whole machine, `[0, 100]`.
    pub cpu_percent: f64,
    pub rss_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Cpu,
    #[serde(alias = "rss")]
    Memory,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(SortKey::Cpu),
            "memory" | "mem" | "rss" => Ok(SortKey::Memory),
            other => Err(format!("unknown sort key '{other}'")),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKey::Cpu => write!(f, "cpu"),
            SortKey::Memory => write!(f, "memory"),
        }
    }
}

/// How many rows a process sample keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessLimit {
    #[default]
    Unlimited,
    Top(usize),
}

impl From<u32> for ProcessLimit {
    /// Zero means "no truncation".
    fn from(limit: u32) -> Self {
        match limit {
            0 => ProcessLimit::Unlimited,
            n => ProcessLimit::Top(n as usize),
        }
    }
}

/// Scales a raw per-process CPU figure (0..100 per core) to a share of the machine.
pub fn normalize_process_cpu(raw: f32, logical_cores: usize) -> f64 {
    let cores = logical_cores.max(1) as f64;
    normalize_percent(raw as f64 / cores)
}

/// Joins argv into one display string, falling back to `name` when empty.
pub fn flatten_cmdline<S: AsRef<str>>(args: &[S], name: &str) -> String {
    let joined = args
        .iter()
        .map(|arg| arg.as_ref())
        .collect::<Vec<&str>>()
        .join(" ");
    let text = joined.trim();
    if text.is_empty() {
        return name.to_string();
    }
    truncate_display(text, CMDLINE_MAX_CHARS)
}

fn truncate_display(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(ELLIPSIS.len());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

fn by_cpu_then_memory(a: &ProcessRow, b: &ProcessRow) -> Ordering {
    b.cpu_percent
        .partial_cmp(&a.cpu_percent)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.rss_bytes.cmp(&a.rss_bytes))
}

/// Sorts rows in place for display and truncates them to `limit`.
pub fn rank_rows(mut rows: Vec<ProcessRow>, limit: ProcessLimit, sort_by: SortKey) -> Vec<ProcessRow> {
    match sort_by {
        SortKey::Cpu => rows.sort_by(by_cpu_then_memory),
        SortKey::Memory => rows.sort_by(|a, b| b.rss_bytes.cmp(&a.rss_bytes)),
    }
    if let ProcessLimit::Top(n) = limit {
        rows.truncate(n);
    }
    rows
}
