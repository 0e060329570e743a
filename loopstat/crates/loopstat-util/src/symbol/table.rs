//! Symbol table implementation using DashMap for concurrent access.
//!
//! - Sharded concurrent text → handle map (DashMap + AHasher)
//! - O(1) handle → text through a reverse vector
//! - Hit/miss counters for profiling
//!
//! # Thread Safety
//!
//! Interning a name that is already present takes a shard read lock only.
//! Interning a new name holds that shard's entry while the reverse vector is
//! extended, so two threads racing on the same new name always agree on one
//! handle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ahash::RandomState;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::RwLock;

use super::{InternerStats, Symbol};
use crate::error::{SymbolError, SymbolResult};

/// Default number of slots reserved up front.
///
/// Loop and category names are few; this avoids rehashing for typical runs.
const DEFAULT_CAPACITY: usize = 64;

/// Thread-safe symbol table
///
/// Maps each distinct string to exactly one [`Symbol`] for the lifetime of
/// the table. There is no removal operation.
pub struct SymbolTable {
    /// Text → handle
    by_text: DashMap<Arc<str>, Symbol, RandomState>,

    /// Handle → text; index `i` holds the string for `Symbol { index: i }`
    by_index: RwLock<Vec<Arc<str>>>,

    /// Interns that found an existing entry
    hits: AtomicUsize,

    /// Interns that created a new entry
    misses: AtomicUsize,
}

impl SymbolTable {
    /// Create a new empty symbol table
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a table with room for `capacity` names
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            by_text: DashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            by_index: RwLock::new(Vec::with_capacity(capacity)),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    /// Intern a string, returning its symbol
    ///
    /// Repeated calls with equal text return the identical symbol.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` distinct strings are interned. Use
    /// [`SymbolTable::try_intern`] to observe that condition as an error.
    pub fn intern(&self, text: &str) -> Symbol {
        match self.try_intern(text) {
            Ok(symbol) => symbol,
            Err(err) => panic!("{}", err),
        }
    }

    /// Intern a string, reporting handle exhaustion as an error
    pub fn try_intern(&self, text: &str) -> SymbolResult<Symbol> {
        // Fast path: already interned
        if let Some(entry) = self.by_text.get(text) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(*entry.value());
        }

        match self.by_text.entry(Arc::from(text)) {
            // Another thread inserted it between the probe and the entry call
            Entry::Occupied(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Ok(*entry.get())
            }
            Entry::Vacant(entry) => {
                let mut by_index = self.by_index.write();
                let count = by_index.len();
                let index = u32::try_from(count).map_err(|_| SymbolError::Exhausted { count })?;
                let symbol = Symbol { index };
                by_index.push(Arc::clone(entry.key()));
                entry.insert(symbol);
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(symbol)
            }
        }
    }

    /// Look up a string without interning it
    pub fn lookup(&self, text: &str) -> Option<Symbol> {
        self.by_text.get(text).map(|entry| *entry.value())
    }

    /// Get the string for a symbol issued by this table
    pub fn resolve(&self, symbol: Symbol) -> Option<Arc<str>> {
        self.by_index.read().get(symbol.index as usize).cloned()
    }

    /// Get the string for a symbol, failing for foreign handles
    pub fn try_resolve(&self, symbol: Symbol) -> SymbolResult<Arc<str>> {
        self.resolve(symbol).ok_or(SymbolError::NotFound {
            index: symbol.index,
        })
    }

    /// Number of distinct interned strings
    pub fn len(&self) -> usize {
        self.by_index.read().len()
    }

    /// Returns true if nothing has been interned
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get statistics about the table for profiling
    pub fn stats(&self) -> InternerStats {
        InternerStats {
            count: self.len(),
            capacity: self.by_text.capacity(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolTable")
            .field("len", &self.len())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_intern_same_string() {
        let table = SymbolTable::new();
        let s1 = table.intern("hello");
        let s2 = table.intern("hello");
        assert_eq!(s1, s2);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_intern_different_strings() {
        let table = SymbolTable::new();
        let s1 = table.intern("hello");
        let s2 = table.intern("world");
        assert_ne!(s1, s2);
    }

    #[test]
    fn test_handles_follow_first_use() {
        let table = SymbolTable::new();
        assert_eq!(table.intern("a").as_u32(), 0);
        assert_eq!(table.intern("b").as_u32(), 1);
        assert_eq!(table.intern("a").as_u32(), 0);
    }

    #[test]
    fn test_lookup_does_not_insert() {
        let table = SymbolTable::new();
        assert_eq!(table.lookup("missing"), None);
        assert!(table.is_empty());

        let sym = table.intern("present");
        assert_eq!(table.lookup("present"), Some(sym));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_resolve() {
        let table = SymbolTable::new();
        let sym = table.intern("test_string");
        assert_eq!(table.resolve(sym).as_deref(), Some("test_string"));
    }

    #[test]
    fn test_resolve_foreign_handle() {
        let table = SymbolTable::new();
        let other = SymbolTable::new();
        other.intern("x");
        let foreign = other.intern("y");

        assert_eq!(table.resolve(foreign), None);
        assert_eq!(
            table.try_resolve(foreign),
            Err(SymbolError::NotFound { index: 1 })
        );
    }

    #[test]
    fn test_tables_are_independent() {
        let t1 = SymbolTable::new();
        let t2 = SymbolTable::new();
        t1.intern("only_in_t1");
        assert_eq!(t2.lookup("only_in_t1"), None);
    }

    #[test]
    fn test_stats_tracking() {
        let table = SymbolTable::new();
        table.intern("new_unique_string");
        let stats = table.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);

        table.intern("new_unique_string");
        let stats = table.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.count, 1);
        assert!(stats.capacity >= stats.count);
    }

    #[test]
    fn test_empty_string() {
        let table = SymbolTable::new();
        let s = table.intern("");
        assert_eq!(table.resolve(s).as_deref(), Some(""));
    }

    #[test]
    fn test_unicode_strings() {
        let table = SymbolTable::new();
        for text in ["你好", "世界", "🦀", "こんにちは", "Привет"] {
            let sym = table.intern(text);
            assert_eq!(table.resolve(sym).as_deref(), Some(text));
        }
    }

    #[test]
    fn test_concurrent_same_string() {
        let table = Arc::new(SymbolTable::new());
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let table = Arc::clone(&table);
                thread::spawn(move || table.intern("concurrent_same"))
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for symbol in &results[1..] {
            assert_eq!(results[0], *symbol);
        }
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_thread_safety_stress() {
        const THREADS: usize = 16;
        const ITERATIONS: usize = 100;

        let table = Arc::new(SymbolTable::new());
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let table = Arc::clone(&table);
                thread::spawn(move || {
                    (0..ITERATIONS)
                        .map(|i| table.intern(&format!("stress_{}", i)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        // Every thread interned the same names, so every thread saw the same handles
        for symbols in &results[1..] {
            assert_eq!(symbols, &results[0]);
        }
        assert_eq!(table.len(), ITERATIONS);
        for (i, sym) in results[0].iter().enumerate() {
            assert_eq!(table.resolve(*sym).as_deref(), Some(format!("stress_{}", i).as_str()));
        }
    }
}
