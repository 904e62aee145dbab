//! Wall-normal alignment: a discrete hill-climb over heading.
//!
//! The robot probes in fixed angular increments, watching the filtered
//! standoff distance. Distance shrinks while rotating toward the wall's
//! normal and grows past it; once a growth is seen after an improvement, the
//! minimum was just overshot and a half-increment back-off recovers it.
//! Assumes a single local minimum of distance versus angle in the search
//! range.

use wallbot_traits::{DriveMotors, Ranger};

use crate::config::SearchCfg;
use crate::error::{Report, Result, map_hw_error};
use crate::stepper::{Drive, MotionStatus, StepperState};

/// Search progress; `Found` is reported exactly once per search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    Searching,
    Found,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchPhase {
    /// Probing one angular increment, then evaluating the distance.
    Stepping,
    /// Recovering the overshoot with a half-increment reverse rotation.
    BackingOff,
}

/// Caller-owned alignment search state.
#[derive(Debug, Clone)]
pub struct SearchState {
    phase: SearchPhase,
    /// Distance at the last evaluation; seeded by the first completed probe.
    prior_in: Option<f32>,
    clockwise: bool,
    /// Set once any probe shrinks the distance; distinguishes "started in
    /// the wrong direction" from "overshot the minimum".
    improving: bool,
    turn: StepperState,
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            phase: SearchPhase::Stepping,
            prior_in: None,
            clockwise: true,
            improving: false,
            turn: StepperState::new(),
        }
    }

    /// Advance the search by at most one unit of work.
    pub fn poll<D: DriveMotors, R: Ranger>(
        &mut self,
        drive: &mut Drive<D>,
        ranger: &mut R,
        cfg: &SearchCfg,
    ) -> Result<SearchStatus> {
        match self.phase {
            SearchPhase::Stepping => {
                let target = if self.clockwise {
                    cfg.increment_deg
                } else {
                    -cfg.increment_deg
                };
                if drive.poll_turn(&mut self.turn, target)? == MotionStatus::InProgress {
                    return Ok(SearchStatus::Searching);
                }

                let dist = ranger
                    .read_dist()
                    .map_err(|e| Report::new(map_hw_error(e.as_ref())))?;
                let Some(prior) = self.prior_in else {
                    self.prior_in = Some(dist);
                    return Ok(SearchStatus::Searching);
                };

                if dist < prior {
                    self.improving = true;
                    self.prior_in = Some(dist);
                    tracing::trace!(dist, prior, "closing on wall normal");
                } else if dist > prior && !self.improving {
                    // First probe made things worse: started the wrong way.
                    self.clockwise = !self.clockwise;
                    self.prior_in = Some(dist);
                    tracing::trace!(dist, prior, clockwise = self.clockwise, "reversing search");
                } else if dist > prior {
                    // Grew after improving: the minimum was just passed.
                    self.phase = SearchPhase::BackingOff;
                    tracing::trace!(dist, prior, "overshot minimum, backing off");
                } else {
                    // Equal readings: keep probing the same way.
                    self.prior_in = Some(dist);
                }
                Ok(SearchStatus::Searching)
            }
            SearchPhase::BackingOff => {
                let half = cfg.increment_deg / 2.0;
                let target = if self.clockwise { -half } else { half };
                if drive.poll_turn(&mut self.turn, target)? == MotionStatus::Done {
                    *self = SearchState::new();
                    return Ok(SearchStatus::Found);
                }
                Ok(SearchStatus::Searching)
            }
        }
    }
}
