//! Symbol module - String interning for loop and category names.
//!
//! This module provides the [`Symbol`] type, a compact (4-byte) handle to a
//! string interned in a [`SymbolTable`]. Symbols turn name comparison into an
//! integer comparison, which is what lets the statistics runtime group records
//! by `(loop, instance, category)` without touching string data.
//!
//! # Overview
//!
//! - **Memory efficiency**: each distinct name is stored once per table
//! - **Fast comparison**: O(1) handle comparison
//! - **Thread safety**: the table is `Sync + Send` and interns concurrently
//! - **Stable handles**: a symbol never changes meaning while its table lives
//!
//! # Performance Characteristics
//!
//! | Operation | Complexity | Notes |
//! |-----------|------------|-------|
//! | `SymbolTable::intern()` (hit) | O(1) | shard read lock only |
//! | `SymbolTable::intern()` (miss) | O(1) | shard write lock + index push |
//! | `SymbolTable::lookup()` | O(1) | never inserts |
//! | `Symbol` comparison | O(1) | index comparison only |
//! | `SymbolTable::resolve()` | O(1) | index into the reverse table |
//!
//! # Ownership
//!
//! Unlike a process-wide interner, a [`SymbolTable`] is owned by its creator.
//! Handles from one table are meaningless in another; resolving a foreign
//! handle yields `None` rather than a wrong string.
//!
//! # Examples
//!
//! ```
//! use loopstat_util::symbol::SymbolTable;
//!
//! let table = SymbolTable::new();
//! let s1 = table.intern("mainLoop");
//! let s2 = table.intern("mainLoop");
//! let s3 = table.intern("Time");
//!
//! assert_eq!(s1, s2);
//! assert_ne!(s1, s3);
//! assert_eq!(table.resolve(s3).as_deref(), Some("Time"));
//! ```

use std::fmt;

mod table;

pub use table::SymbolTable;

/// Statistics about a symbol table for profiling
///
/// # Fields
///
/// * `count` - Number of distinct interned strings
/// * `capacity` - Map capacity (number of slots across shards)
/// * `hits` - Interns that found an existing entry
/// * `misses` - Interns that allocated a new entry
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InternerStats {
    /// Number of interned strings
    pub count: usize,
    /// Map capacity
    pub capacity: usize,
    /// Number of interns that hit an existing entry
    pub hits: usize,
    /// Number of interns that created a new entry
    pub misses: usize,
}

impl InternerStats {
    /// Create new stats with the given values
    pub const fn new(count: usize, capacity: usize, hits: usize, misses: usize) -> Self {
        Self {
            count,
            capacity,
            hits,
            misses,
        }
    }

    /// Load factor (count / capacity), 0.0 for an unallocated table
    pub fn load_factor(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.count as f64 / self.capacity as f64
        }
    }

    /// Hit rate (hits / (hits + misses)), 0.0 before any intern
    ///
    /// # Examples
    ///
    /// ```
    /// use loopstat_util::symbol::InternerStats;
    ///
    /// let stats = InternerStats::new(10, 64, 90, 10);
    /// assert_eq!(stats.hit_rate(), 0.9);
    /// ```
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_operations();
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Total number of intern calls
    pub fn total_operations(&self) -> usize {
        self.hits + self.misses
    }
}

/// Symbol - An interned loop or category name
///
/// A Symbol is a 4-byte handle into the [`SymbolTable`] that produced it.
/// Equality of symbols from the same table is equality of the strings they
/// name.
///
/// Ordering follows handle order, which is the order in which names were
/// first interned. Reports rely on this to be deterministic for a given
/// recording sequence.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Symbol {
    /// Index into the owning table's reverse map
    pub(crate) index: u32,
}

static_assertions::assert_eq_size!(Symbol, u32);

impl Symbol {
    /// The maximum index value for a symbol
    pub const MAX_INDEX: u32 = u32::MAX;

    /// Get the raw index value
    ///
    /// Useful for serialization or debugging.
    #[inline]
    pub fn as_u32(self) -> u32 {
        self.index
    }

    /// Create a symbol from a raw index
    ///
    /// The result only means something to the table that issued `index`;
    /// resolving an unknown index returns `None`.
    #[inline]
    pub fn from_u32(index: u32) -> Self {
        Self { index }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.index)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}
