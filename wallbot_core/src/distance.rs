//! Carry-blended distance filter over published ranging snapshots.

use crate::config::RangingCfg;
use crate::ranging::RangingSnapshot;

/// Converts a `RangingSnapshot` into one centered standoff distance.
///
/// Per channel the N buffered echo widths are summed together with one value
/// carried over from the previous read, and divided by N+1 in integer
/// microseconds; the result becomes the next carry. The carry widens the
/// effective averaging window by one sample across successive reads. Pure
/// apart from the carry update; never fails.
#[derive(Debug, Clone)]
pub struct DistanceFilter {
    cfg: RangingCfg,
    carry_front_us: u64,
    carry_rear_us: u64,
}

impl DistanceFilter {
    pub fn new(cfg: &RangingCfg) -> Self {
        Self {
            cfg: *cfg,
            carry_front_us: u64::from(cfg.no_echo_us),
            carry_rear_us: u64::from(cfg.no_echo_us),
        }
    }

    fn blend(&self, samples: &[u32], carry: u64) -> u64 {
        let n = self.cfg.window.max(1) as u64;
        let sum: u64 = samples.iter().map(|&v| u64::from(v)).sum::<u64>() + carry;
        sum / (n + 1)
    }

    /// Blended front-channel echo width (us) without touching the carries.
    pub fn blended_front_us(&self, snap: &RangingSnapshot) -> u64 {
        self.blend(&snap.front_us, self.carry_front_us)
    }

    /// Centered wall distance in inches for the given snapshot.
    ///
    /// The front reading (toward the tracked wall) and the rear reading
    /// (toward the opposite wall of the lane) are each corrected by the
    /// transducer-to-center mounting offset and averaged, so the result is
    /// measured from the robot's geometric center.
    pub fn read_dist(&mut self, snap: &RangingSnapshot) -> f32 {
        let front_avg = self.blend(&snap.front_us, self.carry_front_us);
        let rear_avg = self.blend(&snap.rear_us, self.carry_rear_us);
        self.carry_front_us = front_avg;
        self.carry_rear_us = rear_avg;

        let front_in = front_avg as f32 * self.cfg.inch_per_us;
        let rear_in = rear_avg as f32 * self.cfg.inch_per_us;
        let off = self.cfg.sensor_offset_in;
        let via_front = front_in + off;
        let via_rear = self.cfg.lane_width_in - rear_in - off;
        let dist = (via_front + via_rear) / 2.0;
        tracing::trace!(front_in, rear_in, dist, "distance read");
        dist
    }
}
