use serde::{Deserialize, Serialize};

/// CPU load at one instant. Every value lies in `[0, 100]` with one decimal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuSample {
    pub percent_total: f64,
    /// One entry per logical CPU, in OS order.
    pub per_cpu: Vec<f64>,
}

impl CpuSample {
    pub fn from_raw(total: f32, per_cpu: impl IntoIterator<Item = f32>) -> Self {
        Self {
            percent_total: normalize_percent(total as f64),
            per_cpu: per_cpu
                .into_iter()
                .map(|v| normalize_percent(v as f64))
                .collect(),
        }
    }
}

/// Physical memory usage in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySample {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub percent: f64,
}

impl MemorySample {
    pub fn from_bytes(total: u64, used: u64, available: u64) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            used as f64 / total as f64 * 100.0
        };
        Self {
            total,
            used,
            available,
            percent: normalize_percent(percent),
        }
    }
}

/// Rounds to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Clamps to `[0, 100]` and rounds to one decimal. NaN becomes zero.
pub fn normalize_percent(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    round1(value.clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_values_are_clamped_and_rounded() {
        let cpu = CpuSample::from_raw(12.345, [0.04, 101.0, -3.0, 55.56]);
        assert_eq!(cpu.percent_total, 12.3);
        assert_eq!(cpu.per_cpu, vec![0.0, 100.0, 0.0, 55.6]);
    }

    #[test]
    fn memory_percent_from_bytes() {
        let mem = MemorySample::from_bytes(8_000, 2_000, 6_000);
        assert_eq!(mem.percent, 25.0);
        assert_eq!(mem.available, 6_000);
    }

    #[test]
    fn memory_without_total_is_zero_percent() {
        let mem = MemorySample::from_bytes(0, 0, 0);
        assert_eq!(mem.percent, 0.0);
    }

    #[test]
    fn nan_percent_becomes_zero() {
        assert_eq!(normalize_percent(f64::NAN), 0.0);
        assert_eq!(normalize_percent(f64::INFINITY), 100.0);
    }
}
