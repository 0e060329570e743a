//! loopstat-util - Core Utilities and Foundation Types
//!
//! ============================================================================
//! MODULE OVERVIEW
//! ============================================================================
//!
//! Foundation types shared by the loopstat runtime. Today that is the symbol
//! table used to name loops and statistic categories.
//!
//! DESIGN PRINCIPLES:
//! ------------------
//! 1. IDENTITY OVER CONTENT
//!    Loop and category names are compared by handle, never by text, once
//!    they have been interned.
//!
//! 2. NO HIDDEN GLOBALS
//!    Tables are owned by whoever creates them. Two collectors in one process
//!    never share handles by accident.
//
// ============================================================================
// STRING INTERNING (SYMBOL)
// ============================================================================
//
// Let S be the set of loop and category names seen by a collector.
// Let I: S → ℕ be the interning function.
//
// Properties:
// - ∀s₁, s₂ ∈ S: I(s₁) = I(s₂) ⟺ s₁ = s₂  (injective mapping)
// - I(s) is fixed for the lifetime of the table
//
// MEMORY LAYOUT:
// --------------
// ```
// by_text (DashMap, sharded):          by_index (RwLock<Vec>):
// ┌──────────────┬────────┐            ┌───────┬──────────────┐
// │ "mainLoop"   │ Sym(0) │ ─────────▶ │ 0     │ "mainLoop"   │
// │ "Time"       │ Sym(1) │            │ 1     │ "Time"       │
// │ "Iterations" │ Sym(2) │            │ 2     │ "Iterations" │
// └──────────────┴────────┘            └───────┴──────────────┘
// ```
//
// Both sides share one `Arc<str>` per name, so every string is stored once.

pub mod error;
pub mod symbol;

pub use error::{SymbolError, SymbolResult};
pub use symbol::{InternerStats, Symbol, SymbolTable};
