//! Per-worker routing and update counters

use core::fmt;
use core::ops::AddAssign;

/// Counters collected by one worker over a run
///
/// Nothing here influences the simulation; the counters exist so that
/// dropped and duplicated work is visible instead of silent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorkerStats {
    /// Signals queued into a locally owned inbox
    pub delivered_local: u64,
    /// Signals handed to the transport for another worker
    pub sent_remote: u64,
    /// Signal records taken off the transport
    pub received_remote: u64,
    /// Signals addressed to an identifier no worker owns
    pub dropped_unknown_owner: u64,
    /// Signals refused by a full inbox
    pub dropped_inbox_full: u64,
    /// Signals discarded by overload throttling
    pub dropped_overload: u64,
    /// Wire records that failed validation or were not ours
    pub rejected_records: u64,
    /// Fan-outs abandoned on a non-conducting edge
    pub aborted_fires: u64,
    /// Updates of nerves owned by another worker
    pub foreign_nerve_updates: u64,
}

impl WorkerStats {
    /// Total signals lost for any reason
    pub fn total_dropped(&self) -> u64 {
        self.dropped_unknown_owner
            + self.dropped_inbox_full
            + self.dropped_overload
            + self.rejected_records
    }
}

impl AddAssign for WorkerStats {
    fn add_assign(&mut self, rhs: Self) {
        self.delivered_local += rhs.delivered_local;
        self.sent_remote += rhs.sent_remote;
        self.received_remote += rhs.received_remote;
        self.dropped_unknown_owner += rhs.dropped_unknown_owner;
        self.dropped_inbox_full += rhs.dropped_inbox_full;
        self.dropped_overload += rhs.dropped_overload;
        self.rejected_records += rhs.rejected_records;
        self.aborted_fires += rhs.aborted_fires;
        self.foreign_nerve_updates += rhs.foreign_nerve_updates;
    }
}

impl fmt::Display for WorkerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "local={} sent={} received={} dropped={} (unknown={}, full={}, overload={}, rejected={}) aborted_fires={} foreign_nerve_updates={}",
            self.delivered_local,
            self.sent_remote,
            self.received_remote,
            self.total_dropped(),
            self.dropped_unknown_owner,
            self.dropped_inbox_full,
            self.dropped_overload,
            self.rejected_records,
            self.aborted_fires,
            self.foreign_nerve_updates,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate() {
        let mut total = WorkerStats::default();
        total += WorkerStats {
            delivered_local: 3,
            dropped_inbox_full: 2,
            ..Default::default()
        };
        total += WorkerStats {
            delivered_local: 1,
            rejected_records: 4,
            ..Default::default()
        };
        assert_eq!(total.delivered_local, 4);
        assert_eq!(total.total_dropped(), 6);
    }
}
