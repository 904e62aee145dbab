//! Non-blocking stepper pulse actuator.
//!
//! One maneuver = one caller-owned `StepperState` polled to completion. Each
//! poll does at most one unit of work: set the direction outputs, or toggle
//! the shared step line once. Pulse pacing comes from the injected clock, so
//! the loops are fully deterministic under test.

use std::sync::Arc;
use std::time::Instant;

use eyre::WrapErr;
use wallbot_traits::clock::Clock;
use wallbot_traits::{DriveDirection, DriveMotors};

use crate::config::DriveCfg;
use crate::error::{Report, Result, map_hw_error};

/// Progress report for one maneuver; `Done` is returned exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionStatus {
    InProgress,
    Done,
}

/// Caller-owned per-maneuver state. Reset when the maneuver completes, so the
/// same object can be reused for the next maneuver.
#[derive(Debug, Clone, Default)]
pub struct StepperState {
    /// Toggle-to-active transitions counted so far
    pub steps_taken: u32,
    /// Step target, latched on the first poll of a maneuver
    pub required: Option<u32>,
    /// Time of the last step edge (ms since the drive epoch)
    pub last_pulse_ms: Option<u64>,
}

impl StepperState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a maneuver is currently in flight.
    pub fn active(&self) -> bool {
        self.required.is_some()
    }
}

/// Pulse generator over a `DriveMotors` implementation.
pub struct Drive<D: DriveMotors> {
    driver: D,
    cfg: DriveCfg,
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
}

impl<D: DriveMotors> Drive<D> {
    pub fn new(driver: D, cfg: DriveCfg, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let epoch = clock.now();
        Self {
            driver,
            cfg,
            clock,
            epoch,
        }
    }

    pub fn cfg(&self) -> &DriveCfg {
        &self.cfg
    }

    /// Access the underlying driver (used by harnesses and simulations).
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Advance a straight-line maneuver of `inches` (negative = reverse).
    pub fn poll_linear(&mut self, state: &mut StepperState, inches: f32) -> Result<MotionStatus> {
        let dir = if inches >= 0.0 {
            DriveDirection::Forward
        } else {
            DriveDirection::Reverse
        };
        let required = (inches.abs() * self.cfg.steps_per_inch()) as u32;
        self.poll_steps(state, required, dir)
    }

    /// Advance an in-place rotation of `degrees` (positive = clockwise).
    pub fn poll_turn(&mut self, state: &mut StepperState, degrees: f32) -> Result<MotionStatus> {
        let dir = if degrees >= 0.0 {
            DriveDirection::Clockwise
        } else {
            DriveDirection::CounterClockwise
        };
        let required = (degrees.abs() * self.cfg.steps_per_degree) as u32;
        self.poll_steps(state, required, dir)
    }

    fn poll_steps(
        &mut self,
        state: &mut StepperState,
        required: u32,
        dir: DriveDirection,
    ) -> Result<MotionStatus> {
        // First poll of a maneuver: latch the target and set direction
        // before any pulse goes out.
        let required = match state.required {
            Some(n) => n,
            None => {
                self.driver
                    .set_direction(dir)
                    .map_err(|e| Report::new(map_hw_error(e.as_ref())))
                    .wrap_err("set drive direction")?;
                tracing::trace!(?dir, required, "maneuver start");
                state.required = Some(required);
                required
            }
        };

        if state.steps_taken >= required {
            *state = StepperState::new();
            tracing::trace!(steps = required, "maneuver done");
            return Ok(MotionStatus::Done);
        }

        let now_ms = self.clock.ms_since(self.epoch);
        // Gate on the minimum inter-step interval; the first pulse of a
        // maneuver is never gated.
        if let Some(last) = state.last_pulse_ms
            && now_ms.saturating_sub(last) <= self.cfg.step_interval_ms
        {
            return Ok(MotionStatus::InProgress);
        }

        let level = self
            .driver
            .toggle_step()
            .map_err(|e| Report::new(map_hw_error(e.as_ref())))
            .wrap_err("toggle step line")?;
        if level {
            state.steps_taken += 1;
        }
        state.last_pulse_ms = Some(now_ms);
        Ok(MotionStatus::InProgress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::ManualClock;

    struct CountingDrive {
        dir: Option<DriveDirection>,
        level: bool,
        rising: u32,
    }

    impl CountingDrive {
        fn new() -> Self {
            Self {
                dir: None,
                level: false,
                rising: 0,
            }
        }
    }

    impl DriveMotors for CountingDrive {
        fn set_direction(
            &mut self,
            dir: DriveDirection,
        ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
            self.dir = Some(dir);
            Ok(())
        }

        fn toggle_step(&mut self) -> std::result::Result<bool, Box<dyn std::error::Error + Send + Sync>> {
            self.level = !self.level;
            if self.level {
                self.rising += 1;
            }
            Ok(self.level)
        }
    }

    fn drive(cfg: DriveCfg) -> (Drive<CountingDrive>, std::sync::Arc<ManualClock>) {
        let clock = std::sync::Arc::new(ManualClock::new());
        (Drive::new(CountingDrive::new(), cfg, clock.clone()), clock)
    }

    #[test]
    fn truncates_fractional_step_targets() {
        let cfg = DriveCfg::default();
        // 1 inch at 200/12.76 = 15.67 steps/in -> 15 steps, not 16
        let (mut d, clock) = drive(cfg);
        let mut st = StepperState::new();
        let mut done_polls = 0;
        for _ in 0..200 {
            clock.advance(std::time::Duration::from_millis(11));
            if d.poll_linear(&mut st, 1.0).unwrap() == MotionStatus::Done {
                done_polls += 1;
                break;
            }
        }
        assert_eq!(done_polls, 1);
        assert_eq!(d.driver.rising, 15);
    }

    #[test]
    fn negative_turn_selects_counterclockwise() {
        let (mut d, _clock) = drive(DriveCfg::default());
        let mut st = StepperState::new();
        d.poll_turn(&mut st, -10.0).unwrap();
        assert_eq!(d.driver.dir, Some(DriveDirection::CounterClockwise));
    }
}
