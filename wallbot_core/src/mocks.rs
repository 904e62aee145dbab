//! Test and helper mocks for wallbot_core

use std::cell::Cell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use wallbot_traits::clock::Clock;
use wallbot_traits::{DriveDirection, DriveMotors, Ranger};

/// A ranger that always errors; useful where a distance source is required
/// but must never be consulted.
pub struct NoopRanger;

impl Ranger for NoopRanger {
    fn read_dist(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("noop ranger")))
    }
}

/// A ranger that always reports the same distance.
pub struct FixedRanger(pub f32);

impl Ranger for FixedRanger {
    fn read_dist(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.0)
    }
}

/// A ranger that replays a prepared sequence, repeating the final value.
pub struct ScriptRanger {
    values: Vec<f32>,
    idx: usize,
}

impl ScriptRanger {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values, idx: 0 }
    }

    pub fn reads(&self) -> usize {
        self.idx
    }
}

impl Ranger for ScriptRanger {
    fn read_dist(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        let v = self
            .values
            .get(self.idx)
            .or_else(|| self.values.last())
            .copied()
            .ok_or_else(|| -> Box<dyn std::error::Error + Send + Sync> {
                Box::new(std::io::Error::other("empty script"))
            })?;
        self.idx += 1;
        Ok(v)
    }
}

/// Simulated planar pose: lateral position along the lane plus heading.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose {
    pub x_in: f32,
    pub heading_deg: f32,
}

/// Everything a `SpyDrive` was asked to do, in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriveEvent {
    Direction(DriveDirection),
    StepEdge(bool),
}

/// A drive double that records the call sequence and integrates a simulated
/// pose on each toggle-to-active transition.
pub struct SpyDrive {
    pub events: Vec<DriveEvent>,
    pub active_steps: u32,
    dir: Option<DriveDirection>,
    level: bool,
    pose: Rc<Cell<Pose>>,
    inch_per_step: f32,
    deg_per_step: f32,
}

impl SpyDrive {
    pub fn new(inch_per_step: f32, deg_per_step: f32) -> Self {
        Self {
            events: Vec::new(),
            active_steps: 0,
            dir: None,
            level: false,
            pose: Rc::new(Cell::new(Pose::default())),
            inch_per_step,
            deg_per_step,
        }
    }

    /// Shared handle to the integrated pose, for coupling to a `PoseRanger`.
    pub fn pose_handle(&self) -> Rc<Cell<Pose>> {
        self.pose.clone()
    }
}

impl DriveMotors for SpyDrive {
    fn set_direction(
        &mut self,
        dir: DriveDirection,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.dir = Some(dir);
        self.events.push(DriveEvent::Direction(dir));
        Ok(())
    }

    fn toggle_step(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let Some(dir) = self.dir else {
            return Err(Box::new(std::io::Error::other(
                "step toggled before direction was set",
            )));
        };
        self.level = !self.level;
        self.events.push(DriveEvent::StepEdge(self.level));
        if self.level {
            self.active_steps += 1;
            let mut p = self.pose.get();
            match dir {
                DriveDirection::Forward => p.x_in += self.inch_per_step,
                DriveDirection::Reverse => p.x_in -= self.inch_per_step,
                DriveDirection::Clockwise => p.heading_deg += self.deg_per_step,
                DriveDirection::CounterClockwise => p.heading_deg -= self.deg_per_step,
            }
            self.pose.set(p);
        }
        Ok(self.level)
    }
}

/// Distance source computed from a shared simulated pose.
pub struct PoseRanger<F: Fn(Pose) -> f32> {
    pose: Rc<Cell<Pose>>,
    profile: F,
}

impl<F: Fn(Pose) -> f32> PoseRanger<F> {
    pub fn new(pose: Rc<Cell<Pose>>, profile: F) -> Self {
        Self { pose, profile }
    }
}

impl<F: Fn(Pose) -> f32> Ranger for PoseRanger<F> {
    fn read_dist(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        Ok((self.profile)(self.pose.get()))
    }
}

/// Deterministic test clock whose time is advanced manually.
///
/// now() = origin + offset; sleep(d) advances internal time by d without
/// actually sleeping.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Advance the clock by the given duration.
    pub fn advance(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = off.saturating_add(d);
        }
    }

    /// Set the absolute offset relative to origin.
    pub fn set_offset(&self, d: Duration) {
        if let Ok(mut off) = self.offset.lock() {
            *off = d;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let off = self.offset.lock().map(|g| *g).unwrap_or(Duration::ZERO);
        self.origin + off
    }

    fn sleep(&self, d: Duration) {
        self.advance(d);
    }
}
