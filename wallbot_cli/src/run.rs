//! Maneuver execution against the simulated hardware.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;

use wallbot_config::Config;
use wallbot_core::config::BotConfig;
use wallbot_core::robot::Robot;
use wallbot_core::sampler::{EdgeSampler, RangeSensor};
use wallbot_core::stepper::MotionStatus;
use wallbot_core::{CenterStatus, SearchStatus, util};
use wallbot_hardware::{SimulatedArena, SimulatedBeacon, SimulatedDrive, SimulatedEchoSource};
use wallbot_traits::Ranger;
use wallbot_traits::clock::MonotonicClock;

use crate::cli::{Cli, Command};

const DEFAULT_WALL_IN: f32 = 24.0;
const DEFAULT_IR_RAW: u16 = 1_000;

fn emit(json: bool, event: &str, fields: serde_json::Value) {
    if json {
        let mut obj = serde_json::json!({ "event": event });
        if let (Some(dst), Some(src)) = (obj.as_object_mut(), fields.as_object()) {
            for (k, v) in src {
                dst.insert(k.clone(), v.clone());
            }
        }
        println!("{obj}");
    } else {
        println!("{event}: {fields}");
    }
}

fn poll_until(
    mut step: impl FnMut() -> eyre::Result<bool>,
    shutdown: &AtomicBool,
    period: Duration,
    max_polls: u64,
) -> eyre::Result<u64> {
    for n in 1..=max_polls {
        if shutdown.load(Ordering::Relaxed) {
            eyre::bail!("interrupted");
        }
        if step()? {
            return Ok(n);
        }
        std::thread::sleep(period);
    }
    eyre::bail!("maneuver did not complete within {max_polls} polls")
}

pub fn run(args: &Cli, cfg: &Config) -> eyre::Result<()> {
    let bot_cfg = BotConfig::from(cfg);
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let s = shutdown.clone();
        ctrlc::set_handler(move || s.store(true, Ordering::Relaxed))
            .wrap_err("install Ctrl-C handler")?;
    }

    let wall_in = args.wall_in.unwrap_or(DEFAULT_WALL_IN);
    let ir_raw = args.ir_raw.unwrap_or(DEFAULT_IR_RAW);
    let period = Duration::from_micros(util::period_us(cfg.runner.poll_hz));
    let max_polls = args.max_polls.unwrap_or(1_000_000);

    if matches!(args.command, Command::SelfCheck) {
        return self_check(args, cfg, &bot_cfg, wall_in, ir_raw, &shutdown);
    }

    let drive = SimulatedDrive::new(
        1.0 / bot_cfg.drive.steps_per_inch(),
        1.0 / bot_cfg.drive.steps_per_degree,
    );
    let pose = drive.pose_handle();
    let arena = SimulatedArena::new(pose.clone(), wall_in);
    let front = SimulatedBeacon::new(ir_raw);
    let rear = SimulatedBeacon::new(ir_raw);
    let mut robot = Robot::new(
        drive,
        arena,
        front,
        rear,
        bot_cfg,
        Arc::new(MonotonicClock::new()),
    )?;

    match args.command {
        Command::Drive { inches } => {
            tracing::info!(inches, "drive start");
            let polls = poll_until(
                || Ok(robot.move_linear(inches)? == MotionStatus::Done),
                &shutdown,
                period,
                max_polls,
            )?;
            let p = pose.get();
            emit(
                args.json,
                "drive complete",
                serde_json::json!({ "inches": inches, "polls": polls, "x_in": p.x_in }),
            );
        }
        Command::Turn { degrees } => {
            tracing::info!(degrees, "turn start");
            let polls = poll_until(
                || Ok(robot.turn(degrees)? == MotionStatus::Done),
                &shutdown,
                period,
                max_polls,
            )?;
            let p = pose.get();
            emit(
                args.json,
                "turn complete",
                serde_json::json!({ "degrees": degrees, "polls": polls, "heading_deg": p.heading_deg }),
            );
        }
        Command::Align => {
            tracing::info!("alignment search start");
            let polls = poll_until(
                || Ok(robot.find_wall_normal()? == SearchStatus::Found),
                &shutdown,
                period,
                max_polls,
            )?;
            let p = pose.get();
            emit(
                args.json,
                "align complete",
                serde_json::json!({ "polls": polls, "heading_deg": p.heading_deg }),
            );
        }
        Command::Center { target } => {
            tracing::info!(target, "centering start");
            let polls = poll_until(
                || Ok(robot.find_standoff(target)? == CenterStatus::Centered),
                &shutdown,
                period,
                max_polls,
            )?;
            let dist = robot.distance()?;
            emit(
                args.json,
                "center complete",
                serde_json::json!({ "target_in": target, "polls": polls, "dist_in": dist }),
            );
        }
        Command::SelfCheck => unreachable!("handled above"),
    }
    Ok(())
}

/// Runs the full capture path end to end: simulated echo pulses through the
/// edge sampler, capture buffers, and distance filter, plus one IR read.
fn self_check(
    args: &Cli,
    cfg: &Config,
    bot_cfg: &BotConfig,
    wall_in: f32,
    ir_raw: u16,
    shutdown: &AtomicBool,
) -> eyre::Result<()> {
    let source = SimulatedEchoSource::new(
        wall_in,
        bot_cfg.ranging.lane_width_in,
        bot_cfg.ranging.sensor_offset_in,
        bot_cfg.ranging.inch_per_us,
    );
    let sampler = EdgeSampler::spawn(
        source,
        bot_cfg.ranging,
        Duration::from_millis(cfg.runner.edge_timeout_ms),
        MonotonicClock::new(),
    );
    let mut sensor = RangeSensor::new(sampler, &bot_cfg.ranging);

    // Give the filter enough cycles to flush the seed sentinels.
    let mut dist = 0.0f32;
    for _ in 0..200 {
        if shutdown.load(Ordering::Relaxed) {
            eyre::bail!("interrupted");
        }
        dist = sensor
            .read_dist()
            .map_err(|e| eyre::eyre!("ranging pipeline: {e}"))?;
        std::thread::sleep(Duration::from_millis(10));
    }
    if (dist - wall_in).abs() > 2.0 {
        eyre::bail!("ranging pipeline off: read {dist:.2} in, simulated {wall_in:.2} in");
    }
    if sensor.sampler().stalled_for_now() > 1_000 {
        eyre::bail!("ranging pipeline stalled");
    }

    let mut beacon = SimulatedBeacon::new(ir_raw);
    let found = wallbot_core::IrBeacon::new(&bot_cfg.ir).found(
        wallbot_traits::IrAdc::read_raw(&mut beacon).map_err(|e| eyre::eyre!("ir read: {e}"))?,
    )?;

    emit(
        args.json,
        "self-check complete",
        serde_json::json!({ "dist_in": dist, "ir_found": found }),
    );
    Ok(())
}
