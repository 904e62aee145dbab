mod cli;
mod run;

use std::sync::OnceLock;

use clap::Parser;
use eyre::WrapErr;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

// Keeps the non-blocking file writer alive for the process lifetime.
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

fn init_logging(cfg: &wallbot_config::Logging, json: bool) {
    let level = cfg.level.clone().unwrap_or_else(|| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    match &cfg.file {
        Some(path) => {
            let p = std::path::Path::new(path);
            let dir = p.parent().filter(|d| !d.as_os_str().is_empty());
            let name = p.file_name().map(|n| n.to_string_lossy().into_owned());
            let (dir, name) = match (dir, name) {
                (Some(d), Some(n)) => (d.to_path_buf(), n),
                (None, Some(n)) => (std::path::PathBuf::from("."), n),
                _ => (std::path::PathBuf::from("."), "wallbot.log".to_string()),
            };
            let rotation = match cfg.rotation.as_deref() {
                Some("daily") => Rotation::DAILY,
                Some("hourly") => Rotation::HOURLY,
                _ => Rotation::NEVER,
            };
            let appender = RollingFileAppender::new(rotation, dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = FILE_GUARD.set(guard);
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false);
            if json {
                builder.json().init();
            } else {
                builder.init();
            }
        }
        None => {
            // Keep stdout clean for result lines; logs go to stderr.
            let builder = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr);
            if json {
                builder.json().init();
            } else {
                builder.init();
            }
        }
    }
}

fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    let args = cli::Cli::parse();

    let text = std::fs::read_to_string(&args.config)
        .wrap_err_with(|| format!("read config {:?}", args.config))?;
    let mut cfg = wallbot_config::load_toml(&text)
        .map_err(|e| eyre::eyre!("parse config {:?}: {e}", args.config))?;
    cfg.validate().wrap_err("invalid config")?;

    init_logging(&cfg.logging, args.json);

    // Echo calibration: CLI-provided CSV wins over the persisted table.
    if let Some(csv) = &args.calibration {
        let cal = wallbot_config::load_calibration_csv(csv)?;
        tracing::info!(inch_per_us = cal.inch_per_us, "loaded echo calibration CSV");
        cfg.ranging.inch_per_us = cal.inch_per_us;
    } else if let Some(persisted) = cfg.calibration {
        cfg.ranging.inch_per_us = persisted.inch_per_us;
    }

    run::run(&args, &cfg)
}
