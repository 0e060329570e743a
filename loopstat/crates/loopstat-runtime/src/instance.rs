//! Loop instance tracking
//!
//! Every loop name carries an instance number so that repeated executions of
//! the same loop are reported separately. Counters live in a vector sorted by
//! symbol; loop names are few and `begin` is rare next to `record`, so one
//! lock around the whole vector is enough.

use loopstat_util::Symbol;
use parking_lot::Mutex;

/// Per-loop instance counters
#[derive(Debug, Default)]
pub struct InstanceTracker {
    counters: Mutex<Vec<(Symbol, u32)>>,
}

impl InstanceTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new instance of `loop_name`, returning its number
    ///
    /// The first call for a loop returns 0, then 1, 2, ...
    pub fn begin(&self, loop_name: Symbol) -> u32 {
        let mut counters = self.counters.lock();
        match counters.binary_search_by_key(&loop_name, |(sym, _)| *sym) {
            Ok(pos) => {
                let count = &mut counters[pos].1;
                *count = count.wrapping_add(1);
                *count
            },
            Err(pos) => {
                counters.insert(pos, (loop_name, 0));
                0
            },
        }
    }

    /// Current instance of `loop_name`, 0 if it was never begun
    pub fn current(&self, loop_name: Symbol) -> u32 {
        let counters = self.counters.lock();
        counters
            .binary_search_by_key(&loop_name, |(sym, _)| *sym)
            .map_or(0, |pos| counters[pos].1)
    }

    /// Number of loops that have begun at least once
    pub fn len(&self) -> usize {
        self.counters.lock().len()
    }

    /// Returns true if no loop has begun
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
