//! Runtime configuration.
//!
//! Resolved once per process: environment overrides win over the config file,
//! which wins over built-in defaults. Out-of-range values are clamped, never rejected.

use crate::error::Result;
use crate::metrics::history::MIN_HISTORY_LEN;
use crate::metrics::process::SortKey;
use log::warn;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "HUDMON_CONFIG";
pub const HISTORY_LEN_ENV: &str = "HUDMON_HISTORY_LEN";
pub const SMOOTHING_ENV: &str = "HUDMON_SMOOTHING";
pub const SMOOTHING_ALPHA_ENV: &str = "HUDMON_SMOOTHING_ALPHA";
pub const LOG_LEVEL_ENV: &str = "HUDMON_LOG_LEVEL";

const MIN_REFRESH_INTERVAL: f64 = 0.1;
const MAX_REFRESH_INTERVAL: f64 = 86_400.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)] // missing keys fall back to the defaults below
pub struct HudConfig {
    /// Seconds between ticks.
    #[serde(deserialize_with = "lenient_refresh_interval")]
    pub refresh_interval: f64,
    /// Rows kept by the process table; 0 keeps all of them.
    #[serde(deserialize_with = "lenient_process_limit")]
    pub process_limit: u32,
    #[serde(deserialize_with = "lenient_sort_key")]
    pub sort_by: SortKey,
    /// Points kept per history series, at least [`MIN_HISTORY_LEN`].
    #[serde(deserialize_with = "lenient_history_len")]
    pub history_len: usize,
    #[serde(deserialize_with = "lenient_smoothing")]
    pub smoothing: bool,
    /// EMA responsiveness in `[0, 1]`.
    #[serde(deserialize_with = "lenient_smoothing_alpha")]
    pub smoothing_alpha: f64,
    pub log_level: Option<String>,
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            refresh_interval: 2.0,
            process_limit: 15,
            sort_by: SortKey::Cpu,
            history_len: 60,
            smoothing: true,
            smoothing_alpha: 0.35,
            log_level: None,
        }
    }
}

impl HudConfig {
    /// Loads the configuration from the process environment and the default file location.
    pub fn load() -> Self {
        Self::load_with(|key| env::var(key).ok())
    }

    /// Same as [`HudConfig::load`] with an injectable environment lookup.
    pub fn load_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = lookup(CONFIG_ENV)
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .or_else(|| default_config_path(&lookup));

        let base = match path {
            Some(path) if path.is_file() => Self::from_file(&path).unwrap_or_else(|e| {
                warn!("Ignoring config file {}: {e}", path.display());
                Self::default()
            }),
            _ => Self::default(),
        };

        base.with_env_overrides(&lookup).clamped()
    }

    /// Reads a TOML file. Keys not present keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: HudConfig = toml::from_str(contents)?;
        Ok(config.clamped())
    }

    fn with_env_overrides<F>(mut self, lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(len) = lookup(HISTORY_LEN_ENV).and_then(|v| v.trim().parse::<i64>().ok()) {
            self.history_len = history_len_from(len);
        }
        if let Some(flag) = lookup(SMOOTHING_ENV).and_then(|v| parse_bool(&v)) {
            self.smoothing = flag;
        }
        if let Some(alpha) = lookup(SMOOTHING_ALPHA_ENV).and_then(|v| v.trim().parse::<f64>().ok()) {
            self.smoothing_alpha = alpha;
        }
        if let Some(level) = lookup(LOG_LEVEL_ENV).filter(|v| !v.trim().is_empty()) {
            self.log_level = Some(level.trim().to_string());
        }
        self
    }

    /// Pulls every field back into its valid range.
    pub fn clamped(mut self) -> Self {
        self.history_len = self.history_len.max(MIN_HISTORY_LEN);
        self.smoothing_alpha = if self.smoothing_alpha.is_nan() {
            Self::default().smoothing_alpha
        } else {
            self.smoothing_alpha.clamp(0.0, 1.0)
        };
        self.refresh_interval = if self.refresh_interval.is_nan() {
            Self::default().refresh_interval
        } else {
            self.refresh_interval.clamp(MIN_REFRESH_INTERVAL, MAX_REFRESH_INTERVAL)
        };
        self
    }

    pub fn log_filter(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn history_len_from(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0).max(MIN_HISTORY_LEN)
}

fn process_limit_from(value: i64) -> u32 {
    if value <= 0 {
        0
    } else {
        u32::try_from(value).unwrap_or(u32::MAX)
    }
}

/// Any value a hand-edited file may hold for a scalar setting.
///
/// A value of the wrong shape keeps that field's default instead of failing the whole file.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    #[allow(dead_code)]
    Other(IgnoredAny),
}

impl Loose {
    fn as_int(&self) -> Option<i64> {
        match self {
            Loose::Int(n) => Some(*n),
            Loose::Float(f) if f.is_finite() => Some(*f as i64),
            Loose::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_float(&self) -> Option<f64> {
        match self {
            Loose::Int(n) => Some(*n as f64),
            Loose::Float(f) => Some(*f),
            Loose::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Loose::Bool(b) => Some(*b),
            Loose::Int(n) => Some(*n != 0),
            Loose::Text(s) => parse_bool(s),
            _ => None,
        }
    }
}

type FieldResult<T, E> = std::result::Result<T, E>;

fn lenient_history_len<'de, D: Deserializer<'de>>(d: D) -> FieldResult<usize, D::Error> {
    let value = Loose::deserialize(d)?.as_int();
    Ok(value.map_or(HudConfig::default().history_len, history_len_from))
}

fn lenient_process_limit<'de, D: Deserializer<'de>>(d: D) -> FieldResult<u32, D::Error> {
    let value = Loose::deserialize(d)?.as_int();
    Ok(value.map_or(HudConfig::default().process_limit, process_limit_from))
}

fn lenient_smoothing<'de, D: Deserializer<'de>>(d: D) -> FieldResult<bool, D::Error> {
    let value = Loose::deserialize(d)?.as_bool();
    Ok(value.unwrap_or(HudConfig::default().smoothing))
}

fn lenient_smoothing_alpha<'de, D: Deserializer<'de>>(d: D) -> FieldResult<f64, D::Error> {
    let value = Loose::deserialize(d)?.as_float();
    Ok(value.unwrap_or(HudConfig::default().smoothing_alpha))
}

fn lenient_refresh_interval<'de, D: Deserializer<'de>>(d: D) -> FieldResult<f64, D::Error> {
    let value = Loose::deserialize(d)?.as_float();
    Ok(value.unwrap_or(HudConfig::default().refresh_interval))
}

fn lenient_sort_key<'de, D: Deserializer<'de>>(d: D) -> FieldResult<SortKey, D::Error> {
    let value = match Loose::deserialize(d)? {
        Loose::Text(s) => s.parse().ok(),
        _ => None,
    };
    Ok(value.unwrap_or_default())
}

fn default_config_path<F>(lookup: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if cfg!(windows) {
        let base = lookup("APPDATA").or_else(|| lookup("USERPROFILE"))?;
        return Some(Path::new(&base).join("HudMon").join("config.toml"));
    }
    let base = lookup("XDG_CONFIG_HOME")
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .or_else(|| lookup("HOME").map(|home| Path::new(&home).join(".config")))?;
    Some(base.join("hudmon").join("config.toml"))
}
