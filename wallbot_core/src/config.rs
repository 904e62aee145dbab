//! Runtime configuration structs for the control core.
//!
//! These mirror the TOML schemas in `wallbot_config`; `From` impls map the
//! parsed file into the core's own types so the core never touches serde.

use crate::error::BuildError;

/// Stepper drive geometry and pulse timing.
#[derive(Debug, Clone, Copy)]
pub struct DriveCfg {
    pub steps_per_rev: u32,
    pub wheel_circumference_in: f32,
    pub steps_per_degree: f32,
    /// Minimum time between step edges (ms)
    pub step_interval_ms: u64,
}

impl Default for DriveCfg {
    fn default() -> Self {
        Self {
            steps_per_rev: 200,
            wheel_circumference_in: 12.76,
            steps_per_degree: 1.055,
            step_interval_ms: 10,
        }
    }
}

impl DriveCfg {
    /// Steps per inch of linear travel. Kept fractional; step targets are
    /// truncated once, at maneuver start.
    #[inline]
    pub fn steps_per_inch(&self) -> f32 {
        self.steps_per_rev as f32 / self.wheel_circumference_in
    }
}

/// Ultrasonic capture geometry and echo conversion.
#[derive(Debug, Clone, Copy)]
pub struct RangingCfg {
    /// Rolling window per ultrasonic channel (samples)
    pub window: usize,
    /// Buffered IR transition timestamps (samples)
    pub ir_window: usize,
    /// Sentinel echo width used to seed empty buffers (us)
    pub no_echo_us: u32,
    /// Echoes wider than this are dropped as invalid (us)
    pub max_echo_us: u32,
    /// Round-trip speed-of-sound conversion (inches per microsecond)
    pub inch_per_us: f32,
    /// Transducer face to robot center (inches)
    pub sensor_offset_in: f32,
    /// Wall-to-wall lane width (inches)
    pub lane_width_in: f32,
}

impl Default for RangingCfg {
    fn default() -> Self {
        Self {
            window: 8,
            ir_window: 8,
            no_echo_us: 2_000,
            max_echo_us: 25_000,
            inch_per_us: 0.00676,
            sensor_offset_in: 4.5,
            lane_width_in: 48.0,
        }
    }
}

/// IR beacon ADC-to-percent mapping and presence threshold.
#[derive(Debug, Clone, Copy)]
pub struct IrCfg {
    pub slope: f32,
    pub intercept: f32,
    pub found_threshold_pct: f32,
    /// ADC full-scale; raw samples above this are rejected
    pub adc_max: u16,
}

impl Default for IrCfg {
    fn default() -> Self {
        Self {
            slope: -0.0298,
            intercept: 122.1,
            found_threshold_pct: 70.0,
            adc_max: 4095,
        }
    }
}

/// Wall-normal hill-climb search.
#[derive(Debug, Clone, Copy)]
pub struct SearchCfg {
    /// Angular probe increment (degrees)
    pub increment_deg: f32,
}

impl Default for SearchCfg {
    fn default() -> Self {
        Self { increment_deg: 1.0 }
    }
}

/// Standoff centering controller.
#[derive(Debug, Clone, Copy)]
pub struct CenterCfg {
    pub tolerance_in: f32,
    pub step_in: f32,
}

impl Default for CenterCfg {
    fn default() -> Self {
        Self {
            tolerance_in: 0.1,
            step_in: 0.09,
        }
    }
}

/// Full control-core configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct BotConfig {
    pub drive: DriveCfg,
    pub ranging: RangingCfg,
    pub ir: IrCfg,
    pub search: SearchCfg,
    pub center: CenterCfg,
}

impl BotConfig {
    /// Reject configurations the control loops cannot run on. The file-level
    /// validation in `wallbot_config` catches the same problems earlier; this
    /// guards programmatic construction.
    pub fn validate(&self) -> Result<(), BuildError> {
        if self.drive.steps_per_rev == 0 {
            return Err(BuildError::InvalidConfig("drive.steps_per_rev must be > 0"));
        }
        if !(self.drive.wheel_circumference_in > 0.0) {
            return Err(BuildError::InvalidConfig(
                "drive.wheel_circumference_in must be > 0",
            ));
        }
        if !(self.drive.steps_per_degree > 0.0) {
            return Err(BuildError::InvalidConfig(
                "drive.steps_per_degree must be > 0",
            ));
        }
        if self.ranging.window == 0 {
            return Err(BuildError::InvalidConfig("ranging.window must be >= 1"));
        }
        if self.ranging.ir_window == 0 {
            return Err(BuildError::InvalidConfig("ranging.ir_window must be >= 1"));
        }
        if self.ranging.no_echo_us > self.ranging.max_echo_us {
            return Err(BuildError::InvalidConfig(
                "ranging.no_echo_us must not exceed ranging.max_echo_us",
            ));
        }
        if !(self.ranging.inch_per_us > 0.0) {
            return Err(BuildError::InvalidConfig("ranging.inch_per_us must be > 0"));
        }
        if !(self.ranging.lane_width_in > 0.0) {
            return Err(BuildError::InvalidConfig("ranging.lane_width_in must be > 0"));
        }
        if self.ir.slope == 0.0 || !self.ir.slope.is_finite() {
            return Err(BuildError::InvalidConfig("ir.slope must be finite, non-zero"));
        }
        if !(0.0..=100.0).contains(&self.ir.found_threshold_pct) {
            return Err(BuildError::InvalidConfig(
                "ir.found_threshold_pct must be in [0, 100]",
            ));
        }
        if self.ir.adc_max == 0 {
            return Err(BuildError::InvalidConfig("ir.adc_max must be >= 1"));
        }
        if !(self.search.increment_deg > 0.0) {
            return Err(BuildError::InvalidConfig("search.increment_deg must be > 0"));
        }
        if !(self.center.tolerance_in > 0.0) {
            return Err(BuildError::InvalidConfig("center.tolerance_in must be > 0"));
        }
        if !(self.center.step_in > 0.0) {
            return Err(BuildError::InvalidConfig("center.step_in must be > 0"));
        }
        Ok(())
    }
}

impl From<&wallbot_config::DriveCfg> for DriveCfg {
    fn from(c: &wallbot_config::DriveCfg) -> Self {
        Self {
            steps_per_rev: c.steps_per_rev,
            wheel_circumference_in: c.wheel_circumference_in,
            steps_per_degree: c.steps_per_degree,
            step_interval_ms: c.step_interval_ms,
        }
    }
}

impl From<&wallbot_config::RangingCfg> for RangingCfg {
    fn from(c: &wallbot_config::RangingCfg) -> Self {
        Self {
            window: c.window,
            ir_window: c.ir_window,
            no_echo_us: c.no_echo_us,
            max_echo_us: c.max_echo_us,
            inch_per_us: c.inch_per_us,
            sensor_offset_in: c.sensor_offset_in,
            lane_width_in: c.lane_width_in,
        }
    }
}

impl From<&wallbot_config::IrCfg> for IrCfg {
    fn from(c: &wallbot_config::IrCfg) -> Self {
        Self {
            slope: c.slope,
            intercept: c.intercept,
            found_threshold_pct: c.found_threshold_pct,
            adc_max: c.adc_max,
        }
    }
}

impl From<&wallbot_config::SearchCfg> for SearchCfg {
    fn from(c: &wallbot_config::SearchCfg) -> Self {
        Self {
            increment_deg: c.increment_deg,
        }
    }
}

impl From<&wallbot_config::CenterCfg> for CenterCfg {
    fn from(c: &wallbot_config::CenterCfg) -> Self {
        Self {
            tolerance_in: c.tolerance_in,
            step_in: c.step_in,
        }
    }
}

impl From<&wallbot_config::Config> for BotConfig {
    fn from(c: &wallbot_config::Config) -> Self {
        Self {
            drive: (&c.drive).into(),
            ranging: (&c.ranging).into(),
            ir: (&c.ir).into(),
            search: (&c.search).into(),
            center: (&c.center).into(),
        }
    }
}
