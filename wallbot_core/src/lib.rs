#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Control core for a wall-following competition robot (hardware-agnostic).
//!
//! All hardware interactions go through the `wallbot_traits` seams:
//! `DriveMotors` for the paired steppers, `Ranger`/`EdgeSource` for the
//! ultrasonic pipeline, `IrAdc` for the beacon channels, and `Clock` for
//! pulse pacing.
//!
//! ## Architecture
//!
//! - **Capture**: change-notification edge handling into rolling buffers
//!   (`ranging` module), published as owned snapshots
//! - **Filtering**: carry-blended echo averaging and center correction
//!   (`distance` module)
//! - **Detection**: IR beacon percent mapping and presence (`ir` module)
//! - **Actuation**: non-blocking stepper pulse generation (`stepper` module)
//! - **Maneuvers**: wall-normal hill-climb (`align`) and standoff centering
//!   (`center`), both caller-owned state machines
//! - **Facade**: the sequencer-facing `Robot` (`robot` module)
//!
//! Every operation is poll-until-complete: at most one small unit of work per
//! call, so an outer sequencer stays responsive without threads of its own.

pub mod align;
pub mod center;
pub mod config;
pub mod distance;
pub mod error;
pub mod ir;
pub mod mocks;
pub mod ranging;
pub mod robot;
pub mod sampler;
pub mod stepper;
pub mod util;

pub use align::{SearchState, SearchStatus};
pub use center::{CenterState, CenterStatus};
pub use config::{BotConfig, CenterCfg, DriveCfg, IrCfg, RangingCfg, SearchCfg};
pub use distance::DistanceFilter;
pub use error::{BotError, BuildError};
pub use ir::IrBeacon;
pub use ranging::{EdgeCapture, EdgeEvent, RangingSnapshot, RollingBuffer, UltraChannel};
pub use robot::Robot;
pub use sampler::{EdgeSampler, RangeSensor};
pub use stepper::{Drive, MotionStatus, StepperState};
