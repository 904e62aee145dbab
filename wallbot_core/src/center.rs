//! Proportional-direction standoff centering.
//!
//! Between nudges the controller compares the filtered distance against the
//! target; outside tolerance it issues one fixed-size linear nudge toward the
//! target and re-evaluates once the nudge lands. Termination needs the nudge
//! size to be at or below the tolerance band, which is the caller's
//! configuration obligation; a misconfiguration is logged, not enforced.

use wallbot_traits::{DriveMotors, Ranger};

use crate::config::CenterCfg;
use crate::error::{Report, Result, map_hw_error};
use crate::stepper::{Drive, MotionStatus, StepperState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CenterStatus {
    InProgress,
    Centered,
}

/// Caller-owned centering state.
#[derive(Debug, Clone, Default)]
pub struct CenterState {
    /// Signed inches of the nudge currently in flight
    nudge_in: Option<f32>,
    step: StepperState,
}

impl CenterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance toward `target_in` by at most one unit of work.
    pub fn poll<D: DriveMotors, R: Ranger>(
        &mut self,
        drive: &mut Drive<D>,
        ranger: &mut R,
        target_in: f32,
        cfg: &CenterCfg,
    ) -> Result<CenterStatus> {
        if let Some(t) = self.nudge_in {
            if drive.poll_linear(&mut self.step, t)? == MotionStatus::InProgress {
                return Ok(CenterStatus::InProgress);
            }
            self.nudge_in = None;
        }

        let dist = ranger
            .read_dist()
            .map_err(|e| Report::new(map_hw_error(e.as_ref())))?;
        let err = target_in - dist;
        if err.abs() < cfg.tolerance_in {
            tracing::trace!(dist, target_in, "centered");
            return Ok(CenterStatus::Centered);
        }
        if cfg.step_in > cfg.tolerance_in {
            tracing::warn!(
                step_in = cfg.step_in,
                tolerance_in = cfg.tolerance_in,
                "nudge larger than tolerance band; centering may oscillate"
            );
        }

        // Too far from the wall: positive nudge (forward). Too close: back away.
        let nudge = if dist > target_in {
            cfg.step_in
        } else {
            -cfg.step_in
        };
        self.nudge_in = Some(nudge);
        tracing::trace!(dist, target_in, nudge, "centering nudge");
        // Feed the new nudge on this same poll: the first pulse of a maneuver
        // is never gated, so the direction and first step edge go out with the
        // evaluation that decided them.
        if drive.poll_linear(&mut self.step, nudge)? == MotionStatus::Done {
            self.nudge_in = None;
        }
        Ok(CenterStatus::InProgress)
    }
}
