//! Mutable per-node simulation state

use nsim_graph::{Signal, NUM_SIGNAL_TYPES};

use crate::SIGNAL_INBOX_SIZE;

/// Bounded queue of signals waiting for the node's next update
///
/// Never holds more than its capacity; a full inbox refuses new signals
/// instead of blocking.
#[derive(Debug, Clone)]
pub struct Inbox {
    signals: Vec<Signal>,
    capacity: usize,
}

impl Inbox {
    /// Create an inbox with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(SIGNAL_INBOX_SIZE)
    }

    /// Create an inbox holding at most `capacity` signals
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            signals: Vec::new(),
            capacity,
        }
    }

    /// Queue a signal; returns `false` (and drops it) when full
    pub fn push(&mut self, signal: Signal) -> bool {
        if self.is_full() {
            return false;
        }
        self.signals.push(signal);
        true
    }

    /// Number of outstanding signals
    pub fn len(&self) -> usize {
        self.signals.len()
    }

    /// True if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// True if the next push would be refused
    pub fn is_full(&self) -> bool {
        self.signals.len() >= self.capacity
    }

    /// Maximum number of queued signals
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Queued signals, oldest first
    pub fn signals(&self) -> &[Signal] {
        &self.signals
    }

    /// Remove and return everything queued so far
    pub fn take(&mut self) -> Vec<Signal> {
        std::mem::take(&mut self.signals)
    }

    /// Drop everything and release the buffer
    pub fn clear(&mut self) {
        self.signals = Vec::new();
    }
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters and inbox of one node on one worker
#[derive(Debug, Clone, Default)]
pub struct NodeState {
    /// Pending signals
    pub inbox: Inbox,
    /// Per-type input counts (reported for nerves)
    pub inputs: [u64; NUM_SIGNAL_TYPES],
    /// Per-type output counts (reported for nerves)
    pub outputs: [u64; NUM_SIGNAL_TYPES],
    /// Lifetime count of signals drained from the inbox
    pub total_received: u64,
    /// Signals handled since the current tick began
    pub signals_this_tick: u32,
    /// Signals handled during the previous tick
    pub signals_last_tick: u32,
}

impl NodeState {
    /// Fresh state with an empty inbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals seen over the current and previous tick
    pub fn recent_signals(&self) -> u32 {
        self.signals_last_tick.saturating_add(self.signals_this_tick)
    }

    /// Start a new tick
    pub fn roll_tick(&mut self) {
        self.signals_last_tick = self.signals_this_tick;
        self.signals_this_tick = 0;
    }
}
