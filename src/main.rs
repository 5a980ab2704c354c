#![warn(clippy::all, rust_2018_idioms)]

use clap::{Parser, Subcommand};
use hudmon::{build_snapshot, HudConfig, Metrics, Result, SystemSampler};
use log::info;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "hudmon", version, about = "Local performance monitoring HUD")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a JSON snapshot of system metrics
    Report {
        /// Pretty-print JSON with indentation
        #[arg(long)]
        pretty: bool,
    },
    /// Sample continuously, printing one JSON line per tick
    Watch {
        /// Stop after this many ticks (0 = until interrupted)
        #[arg(long, default_value_t = 0)]
        ticks: u64,
        /// Seconds between ticks; defaults to the configured refresh interval
        #[arg(long)]
        interval: Option<f64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = HudConfig::load();

    // Logs go to stderr so JSON on stdout stays clean.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.log_filter()))
        .target(env_logger::Target::Stderr)
        .init();

    match cli.command {
        Command::Report { pretty } => report(pretty),
        Command::Watch { ticks, interval } => {
            let mut config = config;
            if let Some(interval) = interval {
                config.refresh_interval = interval;
            }
            watch(&config.clamped(), ticks)
        }
    }
}

fn report(pretty: bool) -> Result<()> {
    let snapshot = build_snapshot();
    let json = if pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{json}");
    Ok(())
}

fn watch(config: &HudConfig, ticks: u64) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    ctrlc::set_handler(move || handler_flag.store(false, Ordering::SeqCst))
        .map_err(|e| hudmon::HudError::Platform(e.to_string()))?;

    let interval = Duration::try_from_secs_f64(config.refresh_interval)
        .unwrap_or_else(|_| Duration::from_secs_f64(HudConfig::default().refresh_interval));
    let mut sampler = SystemSampler::new();
    let mut metrics = Metrics::new(config);
    let stdout = std::io::stdout();

    info!(
        "Watching every {:.1}s (history_len={}, smoothing={})",
        config.refresh_interval, config.history_len, config.smoothing
    );

    let mut done = 0u64;
    while running.load(Ordering::SeqCst) && (ticks == 0 || done < ticks) {
        let report = metrics.tick(&mut sampler);
        let line = serde_json::to_string(&report)?;
        let mut out = stdout.lock();
        writeln!(out, "{line}")?;
        out.flush()?;
        done += 1;

        if ticks != 0 && done >= ticks {
            break;
        }
        std::thread::sleep(interval);
    }

    info!("Stopped after {done} ticks");
    Ok(())
}
