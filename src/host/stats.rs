/// Counters shared by the real-time callbacks and the monitor thread
///
/// The callbacks only ever bump an atomic. Turning counts into log lines
/// happens on the monitor thread.
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::Stream;

#[derive(Debug, Default)]
pub struct HostStats {
    clock_overruns: AtomicU64,
    surface_overruns: AtomicU64,
    instrument_overruns: AtomicU64,
    queue_dropped: AtomicU64,
    failed_blocks: AtomicU64,
}

/// Plain copy of the counters at one moment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Input events lost to a full input ring, per stream.
    pub clock_overruns: u64,
    pub surface_overruns: u64,
    pub instrument_overruns: u64,
    /// Instrument events lost to a full deferred queue.
    pub queue_dropped: u64,
    pub failed_blocks: u64,
}

impl HostStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// An input callback found its ring full.
    pub fn record_overrun(&self, stream: Stream) {
        self.overruns(stream).fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dropped(&self, count: u64) {
        self.queue_dropped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed_blocks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            clock_overruns: self.clock_overruns.load(Ordering::Relaxed),
            surface_overruns: self.surface_overruns.load(Ordering::Relaxed),
            instrument_overruns: self.instrument_overruns.load(Ordering::Relaxed),
            queue_dropped: self.queue_dropped.load(Ordering::Relaxed),
            failed_blocks: self.failed_blocks.load(Ordering::Relaxed),
        }
    }

    fn overruns(&self, stream: Stream) -> &AtomicU64 {
        match stream {
            Stream::Clock => &self.clock_overruns,
            Stream::Surface => &self.surface_overruns,
            Stream::Instrument => &self.instrument_overruns,
        }
    }
}

impl StatsSnapshot {
    /// Counts accumulated since `earlier`.
    pub fn since(&self, earlier: &StatsSnapshot) -> StatsSnapshot {
        StatsSnapshot {
            clock_overruns: self.clock_overruns.wrapping_sub(earlier.clock_overruns),
            surface_overruns: self.surface_overruns.wrapping_sub(earlier.surface_overruns),
            instrument_overruns: self
                .instrument_overruns
                .wrapping_sub(earlier.instrument_overruns),
            queue_dropped: self.queue_dropped.wrapping_sub(earlier.queue_dropped),
            failed_blocks: self.failed_blocks.wrapping_sub(earlier.failed_blocks),
        }
    }

    pub fn overruns(&self, stream: Stream) -> u64 {
        match stream {
            Stream::Clock => self.clock_overruns,
            Stream::Surface => self.surface_overruns,
            Stream::Instrument => self.instrument_overruns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overruns_are_counted_per_stream() {
        let stats = HostStats::new();
        stats.record_overrun(Stream::Clock);
        stats.record_overrun(Stream::Clock);
        stats.record_overrun(Stream::Instrument);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.overruns(Stream::Clock), 2);
        assert_eq!(snapshot.overruns(Stream::Surface), 0);
        assert_eq!(snapshot.overruns(Stream::Instrument), 1);
    }

    #[test]
    fn test_since_reports_only_new_counts() {
        let stats = HostStats::new();
        stats.record_dropped(3);
        stats.record_failure();
        let earlier = stats.snapshot();

        stats.record_dropped(2);
        stats.record_overrun(Stream::Surface);
        let delta = stats.snapshot().since(&earlier);
        assert_eq!(
            delta,
            StatsSnapshot {
                surface_overruns: 1,
                queue_dropped: 2,
                ..Default::default()
            }
        );
        assert_eq!(stats.snapshot().since(&stats.snapshot()), StatsSnapshot::default());
    }
}
