#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and echo-calibration parsing for the wall robot.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The calibration CSV loader enforces headers and fits the
//!   microseconds-to-inches line by least squares.
use serde::Deserialize;

/// Echo calibration CSV schema.
///
/// Expected headers:
/// micros,inches
///
/// Example:
/// micros,inches
/// 1480,10.0
/// 3550,24.0
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct CalibrationRow {
    pub micros: i64,
    pub inches: f32,
}

#[derive(Debug, Deserialize)]
pub struct Pins {
    pub motor_step: u8,
    pub motor_dir_left: u8,
    pub motor_dir_right: u8,
    pub echo_front: u8,
    pub echo_rear: u8,
    pub ir_notify: u8,
}

/// Stepper drive geometry and pulse timing.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
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

/// Ultrasonic buffer geometry and echo conversion.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct RangingCfg {
    /// Rolling window per channel (samples)
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
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
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
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
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
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
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

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct RunnerCfg {
    /// Control loop polling rate (Hz)
    pub poll_hz: u32,
    /// Max time to wait for an input edge per capture iteration (ms)
    pub edge_timeout_ms: u64,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            poll_hz: 200,
            edge_timeout_ms: 50,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub drive: DriveCfg,
    #[serde(default)]
    pub ranging: RangingCfg,
    #[serde(default)]
    pub ir: IrCfg,
    #[serde(default)]
    pub search: SearchCfg,
    #[serde(default)]
    pub center: CenterCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub runner: RunnerCfg,
    /// Optional persisted echo calibration; preferred over CSV when present.
    #[serde(default)]
    pub calibration: Option<PersistedCalibration>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct PersistedCalibration {
    /// inches per microsecond of echo width
    pub inch_per_us: f32,
    /// additive offset in inches (rarely needed; default 0.0)
    #[serde(default)]
    pub offset_in: f32,
}

impl From<PersistedCalibration> for Calibration {
    fn from(p: PersistedCalibration) -> Self {
        Calibration {
            inch_per_us: p.inch_per_us,
            offset_in: p.offset_in,
        }
    }
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Fitted echo-width-to-distance line: inches = inch_per_us * micros + offset_in.
#[derive(Debug, Clone, Copy)]
pub struct Calibration {
    pub inch_per_us: f32,
    pub offset_in: f32,
}

impl Calibration {
    /// Build Calibration from measured rows using ordinary least squares.
    /// Fits inches = a*micros + b over all points.
    pub fn from_rows(rows: Vec<CalibrationRow>) -> eyre::Result<Self> {
        if rows.len() < 2 {
            eyre::bail!("calibration requires at least two rows, got {}", rows.len());
        }

        // Ensure strictly increasing echo widths, no duplicates
        for i in 1..rows.len() {
            let d = rows[i].micros - rows[i - 1].micros;
            if d == 0 {
                eyre::bail!(
                    "calibration rows have duplicate micros values at index {} and {}",
                    i - 1,
                    i
                );
            }
            if d < 0 {
                eyre::bail!("calibration micros values must be strictly increasing");
            }
        }

        // OLS fit in f64 for numerical stability
        let n = rows.len() as f64;
        let sum_x: f64 = rows.iter().map(|r| r.micros as f64).sum();
        let sum_y: f64 = rows.iter().map(|r| f64::from(r.inches)).sum();
        let mean_x = sum_x / n;
        let mean_y = sum_y / n;
        let mut sxx = 0.0f64;
        let mut sxy = 0.0f64;
        for r in &rows {
            let x = r.micros as f64 - mean_x;
            let y = f64::from(r.inches) - mean_y;
            sxx += x * x;
            sxy += x * y;
        }
        if !sxx.is_finite() || sxx == 0.0 {
            eyre::bail!("calibration cannot determine slope (degenerate X variance)");
        }
        let a = sxy / sxx;
        if !a.is_finite() || a <= 0.0 {
            eyre::bail!("calibration produced non-positive slope (distance must grow with echo width)");
        }
        let b = mean_y - a * mean_x;
        if !b.is_finite() {
            eyre::bail!("calibration produced non-finite intercept");
        }

        Ok(Calibration {
            inch_per_us: a as f32,
            offset_in: b as f32,
        })
    }
}

impl TryFrom<Vec<CalibrationRow>> for Calibration {
    type Error = eyre::Report;
    fn try_from(rows: Vec<CalibrationRow>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

pub fn load_calibration_csv(path: &std::path::Path) -> eyre::Result<Calibration> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open calibration CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["micros", "inches"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "calibration CSV must have headers 'micros,inches', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<CalibrationRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }

    Calibration::try_from(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Drive
        if self.drive.steps_per_rev == 0 {
            eyre::bail!("drive.steps_per_rev must be > 0");
        }
        if !(self.drive.wheel_circumference_in > 0.0) {
            eyre::bail!("drive.wheel_circumference_in must be > 0");
        }
        if !(self.drive.steps_per_degree > 0.0) {
            eyre::bail!("drive.steps_per_degree must be > 0");
        }
        if self.drive.step_interval_ms == 0 {
            eyre::bail!("drive.step_interval_ms must be >= 1");
        }

        // Ranging
        if self.ranging.window == 0 {
            eyre::bail!("ranging.window must be >= 1");
        }
        if self.ranging.ir_window == 0 {
            eyre::bail!("ranging.ir_window must be >= 1");
        }
        if self.ranging.max_echo_us == 0 {
            eyre::bail!("ranging.max_echo_us must be >= 1");
        }
        if self.ranging.no_echo_us > self.ranging.max_echo_us {
            eyre::bail!("ranging.no_echo_us must not exceed ranging.max_echo_us");
        }
        if !(self.ranging.inch_per_us > 0.0) {
            eyre::bail!("ranging.inch_per_us must be > 0");
        }
        if self.ranging.sensor_offset_in < 0.0 {
            eyre::bail!("ranging.sensor_offset_in must be >= 0");
        }
        if !(self.ranging.lane_width_in > 0.0) {
            eyre::bail!("ranging.lane_width_in must be > 0");
        }

        // IR
        if self.ir.slope == 0.0 || !self.ir.slope.is_finite() {
            eyre::bail!("ir.slope must be finite and non-zero");
        }
        if !self.ir.intercept.is_finite() {
            eyre::bail!("ir.intercept must be finite");
        }
        if self.ir.found_threshold_pct < 0.0 || self.ir.found_threshold_pct > 100.0 {
            eyre::bail!("ir.found_threshold_pct must be in [0.0, 100.0]");
        }
        if self.ir.adc_max == 0 {
            eyre::bail!("ir.adc_max must be >= 1");
        }

        // Search
        if !(self.search.increment_deg > 0.0) {
            eyre::bail!("search.increment_deg must be > 0");
        }

        // Center
        if !(self.center.tolerance_in > 0.0) {
            eyre::bail!("center.tolerance_in must be > 0");
        }
        if !(self.center.step_in > 0.0) {
            eyre::bail!("center.step_in must be > 0");
        }

        // Runner
        if self.runner.poll_hz == 0 {
            eyre::bail!("runner.poll_hz must be > 0");
        }
        if self.runner.edge_timeout_ms == 0 {
            eyre::bail!("runner.edge_timeout_ms must be >= 1");
        }

        // Persisted calibration
        if let Some(c) = self.calibration
            && !(c.inch_per_us > 0.0)
        {
            eyre::bail!("calibration.inch_per_us must be > 0");
        }

        Ok(())
    }
}
