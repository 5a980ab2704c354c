use super::counters::CounterSample;
use serde::{Deserialize, Serialize};

/// Bytes-per-second derived from two counter samples.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    /// Seconds between the two samples; zero when the pair was unusable.
    pub interval: f64,
    pub rx_bps: f64,
    pub tx_bps: f64,
}

impl Rate {
    pub const ZERO: Rate = Rate {
        interval: 0.0,
        rx_bps: 0.0,
        tx_bps: 0.0,
    };
}

/// Computes per-second rates between `previous` and `current`.
///
/// A non-positive (or non-finite) time delta yields [`Rate::ZERO`]. A counter that
/// went backwards contributes a zero rate for that field only.
pub fn rate_from(previous: &CounterSample, current: &CounterSample) -> Rate {
    let dt = current.ts - previous.ts;
    if !dt.is_finite() || dt <= 0.0 {
        return Rate::ZERO;
    }

    let rx_delta = current.rx_bytes.saturating_sub(previous.rx_bytes);
    let tx_delta = current.tx_bytes.saturating_sub(previous.tx_bytes);

    Rate {
        interval: dt,
        rx_bps: rx_delta as f64 / dt,
        tx_bps: tx_delta as f64 / dt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ts: f64, rx: u64, tx: u64) -> CounterSample {
        CounterSample {
            ts,
            rx_bytes: rx,
            tx_bytes: tx,
        }
    }

    #[test]
    fn rates_over_three_seconds() {
        let prev = sample(10.0, 1200, 500);
        let curr = sample(13.0, 1500, 1100);
        let r = rate_from(&prev, &curr);
        assert_eq!(r.interval, 3.0);
        assert!((r.tx_bps - 200.0).abs() < 1e-9);
        assert!((r.rx_bps - 100.0).abs() < 1e-9);
    }

    #[test]
    fn zero_interval_is_safe() {
        let r = rate_from(&sample(1.0, 0, 0), &sample(1.0, 1, 1));
        assert_eq!(r, Rate::ZERO);
    }

    #[test]
    fn clock_going_backwards_is_safe() {
        let r = rate_from(&sample(5.0, 0, 0), &sample(4.0, 100, 100));
        assert_eq!(r, Rate::ZERO);
    }

    #[test]
    fn counter_reset_clamps_to_zero() {
        let r = rate_from(&sample(0.0, 5000, 100), &sample(2.0, 10, 300));
        assert_eq!(r.interval, 2.0);
        assert_eq!(r.rx_bps, 0.0);
        assert_eq!(r.tx_bps, 100.0);
    }

    #[test]
    fn nan_timestamp_is_safe() {
        let r = rate_from(&sample(f64::NAN, 0, 0), &sample(1.0, 10, 10));
        assert_eq!(r, Rate::ZERO);
    }
}
