pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Travel/rotation directions for a differential stepper drive.
///
/// `Forward`/`Reverse` run both wheels the same way; `Clockwise`/
/// `CounterClockwise` run them opposed for an in-place turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveDirection {
    Forward,
    Reverse,
    Clockwise,
    CounterClockwise,
}

/// Paired stepper drivers behind a two-call surface: latch a direction,
/// then toggle the shared step line one edge at a time.
pub trait DriveMotors {
    fn set_direction(
        &mut self,
        dir: DriveDirection,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Flip the step output and return the new electrical level
    /// (`true` = active/high).
    fn toggle_step(&mut self) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

/// Filtered standoff distance source, in inches from the robot center.
pub trait Ranger {
    fn read_dist(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>>;
}

/// Raw analog sample source for one IR phototransistor channel.
pub trait IrAdc {
    fn read_raw(&mut self) -> Result<u16, Box<dyn std::error::Error + Send + Sync>>;
}

/// Sampled levels of the watched digital inputs at the moment of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineLevels {
    pub ir: bool,
    pub rear_echo: bool,
    pub front_echo: bool,
}

/// Blocking source of change-notification edges on the watched inputs.
///
/// `wait_edge` blocks until any watched line changes or the timeout expires;
/// `Ok(None)` means timeout, which is not an error.
pub trait EdgeSource {
    fn wait_edge(
        &mut self,
        timeout: std::time::Duration,
    ) -> Result<Option<LineLevels>, Box<dyn std::error::Error + Send + Sync>>;
}
