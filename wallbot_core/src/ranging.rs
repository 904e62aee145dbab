//! Edge capture for the ultrasonic and IR inputs.
//!
//! `EdgeCapture` is the change-notification handler: it owns the rolling
//! sample buffers and is the only code that mutates them. Consumers never see
//! the buffers directly; they get complete owned `RangingSnapshot` copies, so
//! a reader can never observe a buffer mid-update.

use std::collections::VecDeque;

use wallbot_traits::LineLevels;

use crate::config::RangingCfg;

/// Which ultrasonic transducer produced an echo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UltraChannel {
    Front,
    Rear,
}

/// Fixed-capacity FIFO of the N most recent samples. Seeded full, so it is
/// never empty after construction; every push evicts the oldest entry.
#[derive(Debug, Clone)]
pub struct RollingBuffer<T: Copy> {
    buf: VecDeque<T>,
    cap: usize,
}

impl<T: Copy> RollingBuffer<T> {
    pub fn new(cap: usize, seed: T) -> Self {
        let cap = cap.max(1);
        let mut buf = VecDeque::with_capacity(cap);
        for _ in 0..cap {
            buf.push_back(seed);
        }
        Self { buf, cap }
    }

    pub fn push(&mut self, v: T) {
        if self.buf.len() == self.cap {
            self.buf.pop_front();
        }
        self.buf.push_back(v);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buf.iter()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.buf.iter().copied().collect()
    }
}

/// Owned copy of all capture buffers, published after each handled edge.
#[derive(Debug, Clone, Default)]
pub struct RangingSnapshot {
    /// Oldest-first echo widths (us)
    pub front_us: Vec<u32>,
    pub rear_us: Vec<u32>,
    /// Oldest-first IR transition timestamps (ms)
    pub ir_stamps_ms: Vec<u64>,
    /// Echoes rejected as wider than the configured maximum
    pub dropped_echoes: u32,
}

impl RangingSnapshot {
    /// Snapshot equivalent to a freshly seeded capture; useful as an initial
    /// value before the first edge arrives.
    pub fn seeded(cfg: &RangingCfg) -> Self {
        Self {
            front_us: vec![cfg.no_echo_us; cfg.window.max(1)],
            rear_us: vec![cfg.no_echo_us; cfg.window.max(1)],
            ir_stamps_ms: vec![0; cfg.ir_window.max(1)],
            dropped_echoes: 0,
        }
    }
}

/// What a single capture invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeEvent {
    /// IR line toggled; its timestamp was buffered.
    IrPulse,
    /// An echo pulse opened on this channel.
    EchoStart(UltraChannel),
    /// An echo pulse closed; its width (us) was buffered.
    Echo(UltraChannel, u32),
    /// An echo pulse closed but was wider than `max_echo_us`; not buffered.
    EchoDropped(UltraChannel, u32),
}

/// Change-notification handler state.
///
/// Identifies the edge source by comparing sampled levels against the last
/// known levels, in fixed priority order: IR beacon first, then the rear
/// ultrasonic, then the front. Exactly one source is handled per invocation;
/// simultaneous transitions on lower-priority lines are picked up on their
/// next edge.
#[derive(Debug)]
pub struct EdgeCapture {
    cfg: RangingCfg,
    levels: LineLevels,
    front: RollingBuffer<u32>,
    rear: RollingBuffer<u32>,
    ir_stamps: RollingBuffer<u64>,
    front_start_us: Option<u64>,
    rear_start_us: Option<u64>,
    dropped: u32,
}

impl EdgeCapture {
    pub fn new(cfg: &RangingCfg) -> Self {
        Self {
            cfg: *cfg,
            levels: LineLevels::default(),
            front: RollingBuffer::new(cfg.window, cfg.no_echo_us),
            rear: RollingBuffer::new(cfg.window, cfg.no_echo_us),
            ir_stamps: RollingBuffer::new(cfg.ir_window, 0),
            front_start_us: None,
            rear_start_us: None,
            dropped: 0,
        }
    }

    /// Handle one edge given the sampled line levels and the current clocks.
    /// Returns `None` when no watched line differs from the last known state.
    pub fn on_edge(&mut self, levels: LineLevels, now_us: u64, now_ms: u64) -> Option<EdgeEvent> {
        if levels.ir != self.levels.ir {
            self.levels.ir = levels.ir;
            self.ir_stamps.push(now_ms);
            return Some(EdgeEvent::IrPulse);
        }
        if levels.rear_echo != self.levels.rear_echo {
            self.levels.rear_echo = levels.rear_echo;
            return Some(self.on_ultra_edge(UltraChannel::Rear, levels.rear_echo, now_us));
        }
        if levels.front_echo != self.levels.front_echo {
            self.levels.front_echo = levels.front_echo;
            return Some(self.on_ultra_edge(UltraChannel::Front, levels.front_echo, now_us));
        }
        None
    }

    fn on_ultra_edge(&mut self, ch: UltraChannel, rising: bool, now_us: u64) -> EdgeEvent {
        let start = match ch {
            UltraChannel::Front => &mut self.front_start_us,
            UltraChannel::Rear => &mut self.rear_start_us,
        };
        if rising {
            // A rising edge while a pulse is still open restarts the measurement.
            *start = Some(now_us);
            return EdgeEvent::EchoStart(ch);
        }
        let Some(t0) = start.take() else {
            // Falling edge with no recorded start (initial line state); ignore.
            return EdgeEvent::EchoDropped(ch, 0);
        };
        let elapsed = now_us.saturating_sub(t0).min(u64::from(u32::MAX)) as u32;
        if elapsed > self.cfg.max_echo_us {
            self.dropped = self.dropped.saturating_add(1);
            tracing::warn!(?ch, elapsed_us = elapsed, "dropping over-wide echo");
            return EdgeEvent::EchoDropped(ch, elapsed);
        }
        match ch {
            UltraChannel::Front => self.front.push(elapsed),
            UltraChannel::Rear => self.rear.push(elapsed),
        }
        EdgeEvent::Echo(ch, elapsed)
    }

    /// Last known levels of the watched lines.
    pub fn levels(&self) -> LineLevels {
        self.levels
    }

    /// Complete owned copy of all buffers and counters.
    pub fn snapshot(&self) -> RangingSnapshot {
        RangingSnapshot {
            front_us: self.front.to_vec(),
            rear_us: self.rear.to_vec(),
            ir_stamps_ms: self.ir_stamps.to_vec(),
            dropped_echoes: self.dropped,
        }
    }
}
