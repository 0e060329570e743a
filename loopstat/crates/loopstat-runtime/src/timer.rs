//! Loop Timer - scoped timing of loop bodies
//!
//! Records the elapsed whole milliseconds as an `Int` when the timer is
//! stopped or dropped, whichever comes first.

use std::time::{Duration, Instant};

use crate::collector::StatCollector;
use crate::error::Result;

/// Default category for timings
pub const TIME_CATEGORY: &str = "Time";

/// Scoped timer recording into one slot of a collector
///
/// ```rust
/// use loopstat_runtime::{LoopTimer, StatCollector};
///
/// let collector = StatCollector::with_threads(1).unwrap();
/// {
///     let _timer = LoopTimer::start(&collector, 0, "mainLoop");
///     // loop body
/// }
/// assert_eq!(collector.record_count(), 1);
/// ```
pub struct LoopTimer<'a> {
    collector: &'a StatCollector,
    tid: usize,
    loop_name: &'a str,
    category: &'a str,
    start: Instant,
    recorded: bool,
}

impl<'a> LoopTimer<'a> {
    /// Start timing `loop_name` for slot `tid`
    pub fn start(collector: &'a StatCollector, tid: usize, loop_name: &'a str) -> Self {
        Self {
            collector,
            tid,
            loop_name,
            category: TIME_CATEGORY,
            start: Instant::now(),
            recorded: false,
        }
    }

    /// Record under `category` instead of `Time`
    pub fn with_category(mut self, category: &'a str) -> Self {
        self.category = category;
        self
    }

    /// Time since start
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Record now and return the recorded milliseconds
    pub fn stop(mut self) -> Result<i64> {
        self.finish()
    }

    fn finish(&mut self) -> Result<i64> {
        let ms = i64::try_from(self.elapsed().as_millis()).unwrap_or(i64::MAX);
        self.recorded = true;
        self.collector
            .record(self.tid, self.loop_name, self.category, ms)?;
        Ok(ms)
    }
}

impl Drop for LoopTimer<'_> {
    fn drop(&mut self) {
        if self.recorded {
            return;
        }
        if let Err(err) = self.finish() {
            log::warn!("loop timer for {} not recorded: {}", self.loop_name, err);
        }
    }
}
