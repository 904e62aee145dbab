//! Hardware backends and simulations for the wall robot.
//!
//! The simulated types share a planar pose through `Rc<Cell<Pose>>`, so a
//! `SimulatedDrive` moves the same robot a `SimulatedArena` ranges against.
//! The `hardware` feature adds an rppal GPIO backend (Linux only).

pub mod error;
pub use error::HwError;

use std::cell::Cell;
use std::rc::Rc;

use wallbot_traits::{DriveDirection, DriveMotors, IrAdc, Ranger};

/// Simulated planar pose: lateral position in the lane plus heading, with
/// heading 0 facing the tracked wall.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pose {
    pub x_in: f32,
    pub heading_deg: f32,
}

/// Simulated stepper drive that integrates the shared pose one step per
/// toggle-to-active transition.
pub struct SimulatedDrive {
    pose: Rc<Cell<Pose>>,
    dir: Option<DriveDirection>,
    level: bool,
    inch_per_step: f32,
    deg_per_step: f32,
}

impl SimulatedDrive {
    pub fn new(inch_per_step: f32, deg_per_step: f32) -> Self {
        Self {
            pose: Rc::new(Cell::new(Pose::default())),
            dir: None,
            level: false,
            inch_per_step,
            deg_per_step,
        }
    }

    /// Shared handle to the integrated pose for coupling to an arena.
    pub fn pose_handle(&self) -> Rc<Cell<Pose>> {
        self.pose.clone()
    }
}

impl DriveMotors for SimulatedDrive {
    fn set_direction(
        &mut self,
        dir: DriveDirection,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        tracing::trace!(?dir, "sim drive direction");
        self.dir = Some(dir);
        Ok(())
    }

    fn toggle_step(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let Some(dir) = self.dir else {
            return Err(Box::new(HwError::Fault(
                "step toggled before direction was set".into(),
            )));
        };
        self.level = !self.level;
        if self.level {
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

/// Simulated lane: a flat wall ahead of the robot at a fixed position.
///
/// The apparent distance grows as the heading swings off the wall's normal
/// (distance along the view ray of a flat wall), giving the alignment search
/// a single-minimum profile to descend.
pub struct SimulatedArena {
    pose: Rc<Cell<Pose>>,
    wall_x_in: f32,
}

impl SimulatedArena {
    pub fn new(pose: Rc<Cell<Pose>>, wall_x_in: f32) -> Self {
        Self { pose, wall_x_in }
    }
}

impl Ranger for SimulatedArena {
    fn read_dist(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        let p = self.pose.get();
        let d_perp = self.wall_x_in - p.x_in;
        if d_perp <= 0.0 {
            return Err(Box::new(HwError::Fault("robot is through the wall".into())));
        }
        // Transducers lose the echo past ~60 degrees off-normal; clamp there.
        let heading = p.heading_deg.clamp(-60.0, 60.0);
        Ok(d_perp / heading.to_radians().cos())
    }
}

/// Simulated IR channel returning an externally adjustable raw ADC sample.
pub struct SimulatedBeacon {
    raw: Rc<Cell<u16>>,
}

impl SimulatedBeacon {
    pub fn new(raw: u16) -> Self {
        Self {
            raw: Rc::new(Cell::new(raw)),
        }
    }

    pub fn raw_handle(&self) -> Rc<Cell<u16>> {
        self.raw.clone()
    }
}

impl IrAdc for SimulatedBeacon {
    fn read_raw(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.raw.get())
    }
}

/// Simulated change-notification source emitting echo pulse pairs for both
/// ultrasonic channels, timed in real time so a capture thread measures
/// realistic widths. The standoff distance is shared through an atomic (in
/// hundredths of an inch) and may be changed while the source runs.
pub struct SimulatedEchoSource {
    dist_centi_in: std::sync::Arc<std::sync::atomic::AtomicU32>,
    lane_width_in: f32,
    sensor_offset_in: f32,
    inch_per_us: f32,
    /// Pulse schedule position: 0 front-rise, 1 front-fall, 2 rear-rise, 3 rear-fall
    phase: u8,
    levels: wallbot_traits::LineLevels,
}

impl SimulatedEchoSource {
    pub fn new(
        dist_in: f32,
        lane_width_in: f32,
        sensor_offset_in: f32,
        inch_per_us: f32,
    ) -> Self {
        let dist = (dist_in.max(0.0) * 100.0) as u32;
        Self {
            dist_centi_in: std::sync::Arc::new(std::sync::atomic::AtomicU32::new(dist)),
            lane_width_in,
            sensor_offset_in,
            inch_per_us,
            phase: 0,
            levels: wallbot_traits::LineLevels::default(),
        }
    }

    /// Shared handle for adjusting the simulated standoff distance.
    pub fn dist_handle(&self) -> std::sync::Arc<std::sync::atomic::AtomicU32> {
        self.dist_centi_in.clone()
    }

    fn width_us(&self, channel_front: bool) -> u64 {
        let dist = self.dist_centi_in.load(std::sync::atomic::Ordering::Relaxed) as f32 / 100.0;
        let at_face = if channel_front {
            dist - self.sensor_offset_in
        } else {
            self.lane_width_in - dist - self.sensor_offset_in
        };
        (at_face.max(0.1) / self.inch_per_us) as u64
    }
}

impl wallbot_traits::EdgeSource for SimulatedEchoSource {
    fn wait_edge(
        &mut self,
        _timeout: std::time::Duration,
    ) -> Result<Option<wallbot_traits::LineLevels>, Box<dyn std::error::Error + Send + Sync>> {
        use std::time::Duration;
        match self.phase {
            0 => {
                // Idle gap between ranging cycles.
                std::thread::sleep(Duration::from_millis(2));
                self.levels.front_echo = true;
            }
            1 => {
                std::thread::sleep(Duration::from_micros(self.width_us(true)));
                self.levels.front_echo = false;
            }
            2 => {
                std::thread::sleep(Duration::from_millis(2));
                self.levels.rear_echo = true;
            }
            _ => {
                std::thread::sleep(Duration::from_micros(self.width_us(false)));
                self.levels.rear_echo = false;
            }
        }
        self.phase = (self.phase + 1) % 4;
        Ok(Some(self.levels))
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio {
    //! rppal GPIO backend for the drive and the edge inputs.

    use rppal::gpio::{Gpio, InputPin, Level, OutputPin, Trigger};
    use std::time::Duration;

    use wallbot_traits::{DriveDirection, DriveMotors, EdgeSource, LineLevels};

    use crate::HwError;

    fn gpio_err(e: rppal::gpio::Error) -> Box<dyn std::error::Error + Send + Sync> {
        Box::new(HwError::Gpio(e.to_string()))
    }

    /// Paired stepper drivers on three pins: one shared step line, one
    /// direction line per wheel. Opposed direction levels produce the
    /// in-place turns.
    pub struct GpioDrive {
        step: OutputPin,
        dir_left: OutputPin,
        dir_right: OutputPin,
        level: bool,
    }

    impl GpioDrive {
        pub fn new(step_pin: u8, dir_left_pin: u8, dir_right_pin: u8) -> Result<Self, HwError> {
            let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
            let get = |pin: u8| -> Result<OutputPin, HwError> {
                Ok(gpio
                    .get(pin)
                    .map_err(|e| HwError::Gpio(e.to_string()))?
                    .into_output())
            };
            Ok(Self {
                step: get(step_pin)?,
                dir_left: get(dir_left_pin)?,
                dir_right: get(dir_right_pin)?,
                level: false,
            })
        }
    }

    impl DriveMotors for GpioDrive {
        fn set_direction(
            &mut self,
            dir: DriveDirection,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            let (left, right) = match dir {
                DriveDirection::Forward => (Level::High, Level::High),
                DriveDirection::Reverse => (Level::Low, Level::Low),
                DriveDirection::Clockwise => (Level::High, Level::Low),
                DriveDirection::CounterClockwise => (Level::Low, Level::High),
            };
            self.dir_left.write(left);
            self.dir_right.write(right);
            Ok(())
        }

        fn toggle_step(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
            self.level = !self.level;
            if self.level {
                self.step.set_high();
            } else {
                self.step.set_low();
            }
            Ok(self.level)
        }
    }

    /// Change-notification source over the IR and echo input pins.
    pub struct GpioEdgeSource {
        ir: InputPin,
        rear: InputPin,
        front: InputPin,
    }

    impl GpioEdgeSource {
        pub fn new(ir_pin: u8, rear_pin: u8, front_pin: u8) -> Result<Self, HwError> {
            let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
            let get = |pin: u8| -> Result<InputPin, HwError> {
                let mut p = gpio
                    .get(pin)
                    .map_err(|e| HwError::Gpio(e.to_string()))?
                    .into_input();
                p.set_interrupt(Trigger::Both)
                    .map_err(|e| HwError::Gpio(e.to_string()))?;
                Ok(p)
            };
            Ok(Self {
                ir: get(ir_pin)?,
                rear: get(rear_pin)?,
                front: get(front_pin)?,
            })
        }
    }

    impl EdgeSource for GpioEdgeSource {
        fn wait_edge(
            &mut self,
            timeout: Duration,
        ) -> Result<Option<LineLevels>, Box<dyn std::error::Error + Send + Sync>> {
            let gpio = Gpio::new().map_err(gpio_err)?;
            let pins = [&self.ir, &self.rear, &self.front];
            match gpio.poll_interrupts(&pins, false, Some(timeout)) {
                Ok(Some(_)) => Ok(Some(LineLevels {
                    ir: self.ir.is_high(),
                    rear_echo: self.rear.is_high(),
                    front_echo: self.front.is_high(),
                })),
                Ok(None) => Ok(None),
                Err(e) => Err(gpio_err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_drive_integrates_pose_per_active_step() {
        let mut drive = SimulatedDrive::new(0.05, 0.5);
        let pose = drive.pose_handle();
        drive.set_direction(DriveDirection::Forward).unwrap();
        // Two full electrical cycles = two mechanical steps.
        for _ in 0..4 {
            drive.toggle_step().unwrap();
        }
        assert!((pose.get().x_in - 0.10).abs() < 1e-6);

        drive.set_direction(DriveDirection::CounterClockwise).unwrap();
        for _ in 0..4 {
            drive.toggle_step().unwrap();
        }
        assert!((pose.get().heading_deg + 1.0).abs() < 1e-6);
    }

    #[test]
    fn step_before_direction_is_a_fault() {
        let mut drive = SimulatedDrive::new(0.05, 0.5);
        assert!(drive.toggle_step().is_err());
    }

    #[test]
    fn arena_distance_is_minimal_at_the_normal() {
        let mut drive = SimulatedDrive::new(0.05, 1.0);
        let mut arena = SimulatedArena::new(drive.pose_handle(), 24.0);
        let at_normal = arena.read_dist().unwrap();
        assert!((at_normal - 24.0).abs() < 1e-4);

        drive.set_direction(DriveDirection::Clockwise).unwrap();
        for _ in 0..20 {
            drive.toggle_step().unwrap();
        }
        let off_normal = arena.read_dist().unwrap();
        assert!(off_normal > at_normal, "{off_normal} vs {at_normal}");
    }

    #[test]
    fn beacon_reports_the_shared_raw_value() {
        let mut beacon = SimulatedBeacon::new(1_000);
        let raw = beacon.raw_handle();
        assert_eq!(beacon.read_raw().unwrap(), 1_000);
        raw.set(3_000);
        assert_eq!(beacon.read_raw().unwrap(), 3_000);
    }
}
