//! IR beacon strength mapping and presence detection.

use crate::config::IrCfg;
use crate::error::{BotError, Result};

/// Affine ADC-to-percent mapping with an inclusive presence threshold.
#[derive(Debug, Clone, Copy)]
pub struct IrBeacon {
    cfg: IrCfg,
}

impl IrBeacon {
    pub fn new(cfg: &IrCfg) -> Self {
        Self { cfg: *cfg }
    }

    /// Percent signal strength for a raw ADC sample, clamped to 0..=100.
    /// Samples above ADC full-scale are rejected as out of range.
    pub fn percent(&self, raw: u16) -> Result<f32> {
        if raw > self.cfg.adc_max {
            return Err(BotError::OutOfRange(raw).into());
        }
        let pct = self.cfg.slope * f32::from(raw) + self.cfg.intercept;
        Ok(pct.clamp(0.0, 100.0))
    }

    /// Whether the beacon is considered present; inclusive at the threshold.
    pub fn found(&self, raw: u16) -> Result<bool> {
        Ok(self.percent(raw)? >= self.cfg.found_threshold_pct)
    }
}

/// Estimated beacon pulse rate from buffered IR transition timestamps (ms).
///
/// Zero entries are seed values from before the first transition and are
/// skipped. Two transitions per pulse period halve the raw edge rate. Returns
/// `None` when fewer than two real timestamps are buffered or the spacing is
/// degenerate.
pub fn beacon_rate_hz(stamps_ms: &[u64]) -> Option<f32> {
    let real: Vec<u64> = stamps_ms.iter().copied().filter(|&t| t > 0).collect();
    if real.len() < 2 {
        return None;
    }
    let span = real.last()? - real.first()?;
    if span == 0 {
        return None;
    }
    let edges_per_ms = (real.len() - 1) as f32 / span as f32;
    Some(edges_per_ms * 1_000.0 / 2.0)
}
