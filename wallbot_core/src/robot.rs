//! Sequencer-facing robot facade.
//!
//! Owns the drive, the distance source, both IR channels, and one state
//! object per maneuver. Every operation is poll-until-complete: the caller
//! invokes it once per control-loop iteration until the terminal status comes
//! back, then the state is ready for the next maneuver.

use std::sync::Arc;

use wallbot_traits::clock::Clock;
use wallbot_traits::{DriveMotors, IrAdc, Ranger};

use crate::align::{SearchState, SearchStatus};
use crate::center::{CenterState, CenterStatus};
use crate::config::BotConfig;
use crate::error::{Report, Result, map_hw_error};
use crate::ir::IrBeacon;
use crate::stepper::{Drive, MotionStatus, StepperState};

pub struct Robot<D, R, FI, RI>
where
    D: DriveMotors,
    R: Ranger,
    FI: IrAdc,
    RI: IrAdc,
{
    drive: Drive<D>,
    ranger: R,
    ir_front: FI,
    ir_rear: RI,
    beacon: IrBeacon,
    cfg: BotConfig,
    linear: StepperState,
    turning: StepperState,
    search: SearchState,
    center: CenterState,
}

impl<D, R, FI, RI> Robot<D, R, FI, RI>
where
    D: DriveMotors,
    R: Ranger,
    FI: IrAdc,
    RI: IrAdc,
{
    /// Validated constructor; rejects configurations the control loops
    /// cannot run on.
    pub fn new(
        driver: D,
        ranger: R,
        ir_front: FI,
        ir_rear: RI,
        cfg: BotConfig,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self> {
        cfg.validate().map_err(Report::new)?;
        Ok(Self {
            drive: Drive::new(driver, cfg.drive, clock),
            ranger,
            ir_front,
            ir_rear,
            beacon: IrBeacon::new(&cfg.ir),
            cfg,
            linear: StepperState::new(),
            turning: StepperState::new(),
            search: SearchState::new(),
            center: CenterState::new(),
        })
    }

    pub fn cfg(&self) -> &BotConfig {
        &self.cfg
    }

    /// Advance a straight-line move of `inches` (negative = reverse).
    pub fn move_linear(&mut self, inches: f32) -> Result<MotionStatus> {
        self.drive.poll_linear(&mut self.linear, inches)
    }

    /// Advance an in-place turn of `degrees` (positive = clockwise).
    pub fn turn(&mut self, degrees: f32) -> Result<MotionStatus> {
        self.drive.poll_turn(&mut self.turning, degrees)
    }

    /// Advance the hill-climb toward the wall's normal.
    pub fn find_wall_normal(&mut self) -> Result<SearchStatus> {
        self.search
            .poll(&mut self.drive, &mut self.ranger, &self.cfg.search)
    }

    /// Advance centering at `target_in` inches of standoff.
    pub fn find_standoff(&mut self, target_in: f32) -> Result<CenterStatus> {
        self.center
            .poll(&mut self.drive, &mut self.ranger, target_in, &self.cfg.center)
    }

    /// Whether the front IR channel currently sees the beacon.
    pub fn ir_front_found(&mut self) -> Result<bool> {
        let raw = self
            .ir_front
            .read_raw()
            .map_err(|e| Report::new(map_hw_error(e.as_ref())))?;
        self.beacon.found(raw)
    }

    /// Whether the rear IR channel currently sees the beacon.
    pub fn ir_rear_found(&mut self) -> Result<bool> {
        let raw = self
            .ir_rear
            .read_raw()
            .map_err(|e| Report::new(map_hw_error(e.as_ref())))?;
        self.beacon.found(raw)
    }

    /// Current filtered standoff distance (inches from robot center).
    pub fn distance(&mut self) -> Result<f32> {
        self.ranger
            .read_dist()
            .map_err(|e| Report::new(map_hw_error(e.as_ref())))
    }
}
