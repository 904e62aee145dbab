//! Background edge sampling: the interrupt-context analogue.
//!
//! Spawns a thread that owns the `EdgeSource` and the `EdgeCapture`, pushes a
//! complete `RangingSnapshot` via a bounded channel after every handled edge,
//! and tracks the last-echo timestamp for dropout detection.
//!
//! Safety: each `EdgeSampler` spawns exactly one thread that is shut down
//! when the sampler is dropped, preventing thread leaks.
use crossbeam_channel as xch;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use wallbot_traits::EdgeSource;
use wallbot_traits::clock::Clock;

use crate::config::RangingCfg;
use crate::distance::DistanceFilter;
use crate::ranging::{EdgeCapture, EdgeEvent, RangingSnapshot};

pub struct EdgeSampler {
    rx: xch::Receiver<RangingSnapshot>,
    last_echo: Arc<AtomicU64>,
    epoch: Instant,
    /// Shutdown flag for immediate response (atomic for lock-free check)
    shutdown: Arc<AtomicBool>,
    /// Join handle for graceful thread cleanup
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl EdgeSampler {
    pub fn spawn<E: EdgeSource + Send + 'static, C: Clock + Send + Sync + 'static>(
        mut source: E,
        cfg: RangingCfg,
        timeout: Duration,
        clock: C,
    ) -> Self {
        let (tx, rx) = xch::bounded(1);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let last_echo = Arc::new(AtomicU64::new(0));
        let last_echo_clone = last_echo.clone();
        let epoch = clock.now();

        let join_handle = std::thread::spawn(move || {
            let mut capture = EdgeCapture::new(&cfg);
            loop {
                // Immediate shutdown check (lock-free atomic)
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("edge sampler thread received shutdown signal");
                    break;
                }

                match source.wait_edge(timeout) {
                    Ok(Some(levels)) => {
                        let now_us = clock.us_since(epoch);
                        let now_ms = clock.ms_since(epoch);
                        let Some(event) = capture.on_edge(levels, now_us, now_ms) else {
                            continue;
                        };
                        if matches!(event, EdgeEvent::Echo(..)) {
                            last_echo_clone.store(now_ms, Ordering::Relaxed);
                        }
                        tracing::trace!(?event, "edge handled");
                        // Non-blocking publish: if an unread snapshot is
                        // still queued, keep it; the next edge retries.
                        match tx.try_send(capture.snapshot()) {
                            Ok(()) | Err(xch::TrySendError::Full(_)) => {}
                            Err(xch::TrySendError::Disconnected(_)) => {
                                tracing::debug!(
                                    "edge sampler consumer disconnected, exiting thread"
                                );
                                break;
                            }
                        }
                    }
                    Ok(None) => {
                        // Timeout waiting for an edge; nothing to record.
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "edge source error; continuing");
                    }
                }
            }
            tracing::trace!("edge sampler thread exiting cleanly");
        });

        Self {
            rx,
            last_echo,
            epoch,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Most recent published snapshot, if any arrived since the last call.
    pub fn latest(&self) -> Option<RangingSnapshot> {
        self.rx.try_iter().last()
    }

    pub fn stalled_for(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.last_echo.load(Ordering::Relaxed))
    }

    /// Time since the last accepted echo, using this sampler's epoch and a
    /// real monotonic clock. Large values mean the transducers went silent.
    pub fn stalled_for_now(&self) -> u64 {
        let now_ms = {
            let dur = Instant::now().saturating_duration_since(self.epoch);
            (dur.as_millis().min(u128::from(u64::MAX))) as u64
        };
        now_ms.saturating_sub(self.last_echo.load(Ordering::Relaxed))
    }
}

impl Drop for EdgeSampler {
    fn drop(&mut self) {
        // Signal shutdown immediately (atomic store is very fast)
        self.shutdown.store(true, Ordering::Relaxed);

        // The thread exits after at most one wait_edge timeout.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("edge sampler thread joined successfully");
                }
                Err(e) => {
                    // Thread panicked; log but don't propagate (we're in Drop)
                    tracing::warn!(?e, "edge sampler thread panicked during shutdown");
                }
            }
        }
    }
}

/// A `Ranger` built from an `EdgeSampler` and a `DistanceFilter`: drains the
/// newest snapshot if one arrived, then reads the filtered distance from the
/// last snapshot seen.
pub struct RangeSensor {
    sampler: EdgeSampler,
    filter: DistanceFilter,
    last: RangingSnapshot,
}

impl RangeSensor {
    pub fn new(sampler: EdgeSampler, cfg: &RangingCfg) -> Self {
        Self {
            sampler,
            filter: DistanceFilter::new(cfg),
            last: RangingSnapshot::seeded(cfg),
        }
    }

    pub fn sampler(&self) -> &EdgeSampler {
        &self.sampler
    }

    /// Most recent snapshot this sensor has consumed.
    pub fn snapshot(&self) -> &RangingSnapshot {
        &self.last
    }
}

impl wallbot_traits::Ranger for RangeSensor {
    fn read_dist(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(snap) = self.sampler.latest() {
            self.last = snap;
        }
        Ok(self.filter.read_dist(&self.last))
    }
}
