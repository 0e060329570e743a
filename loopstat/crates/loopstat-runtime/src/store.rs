//! Per-thread record stores
//!
//! One append-only list per thread slot, each behind its own lock. A worker
//! normally appends to its own slot; posting into another slot is allowed and
//! simply contends on that slot's lock.
//!
//! # Thread Binding
//!
//! Workers that want to record without passing their slot id around call
//! [`bind_current_thread`] once. The binding lives in a thread-local and is
//! read back by [`current_thread_id`].

use std::cell::Cell;

use parking_lot::Mutex;

use crate::error::{Result, StatError};
use crate::record::Record;

thread_local! {
    static CURRENT_SLOT: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Bind the calling OS thread to a slot id
///
/// Rebinding replaces the previous id. The binding is not tied to any
/// collector; it is validated against the slot count when used.
pub fn bind_current_thread(tid: usize) {
    CURRENT_SLOT.with(|slot| slot.set(Some(tid)));
}

/// Remove the calling thread's slot binding
pub fn unbind_current_thread() {
    CURRENT_SLOT.with(|slot| slot.set(None));
}

/// Slot id bound to the calling thread, if any
pub fn current_thread_id() -> Option<usize> {
    CURRENT_SLOT.with(Cell::get)
}

/// One thread slot's records
#[derive(Debug, Default)]
pub struct ThreadStore {
    records: Mutex<Vec<Record>>,
}

impl ThreadStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one record; the lock is held for the push only
    #[inline]
    pub fn push(&self, record: Record) {
        self.records.lock().push(record);
    }

    /// Number of records in this slot
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns true if this slot holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of this slot's records in insertion order
    pub fn snapshot(&self) -> Vec<Record> {
        self.records.lock().clone()
    }
}

/// Fixed set of thread slots
#[derive(Debug)]
pub struct ThreadStores {
    slots: Box<[ThreadStore]>,
}

impl ThreadStores {
    /// Allocate `count` empty slots
    pub fn new(count: usize) -> Self {
        Self {
            slots: (0..count).map(|_| ThreadStore::new()).collect(),
        }
    }

    /// Number of slots
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if there are no slots
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot for `tid`
    pub fn get(&self, tid: usize) -> Result<&ThreadStore> {
        self.slots.get(tid).ok_or(StatError::ThreadOutOfRange {
            thread: tid,
            slots: self.slots.len(),
        })
    }

    /// Total records across all slots
    pub fn record_count(&self) -> usize {
        self.slots.iter().map(ThreadStore::len).sum()
    }

    /// Copy every slot, locking one slot at a time
    ///
    /// Index `i` of the result holds slot `i`'s records in insertion order.
    pub fn snapshot(&self) -> Vec<Vec<Record>> {
        self.slots.iter().map(ThreadStore::snapshot).collect()
    }
}
