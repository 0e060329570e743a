//! # loopstat-runtime - Per-Thread Statistics for Parallel Loops
//!
//! Worker threads record named measurements while they run; at shutdown the
//! runtime merges every thread's records into one report, and in a
//! multi-host run gathers every host's report onto a single sink.
//!
//! ## Overview
//!
//! - **Lock-per-slot recording**: each thread slot has its own lock, so
//!   workers writing their own slots never contend
//! - **Interned names**: loop and category names become 4-byte handles
//! - **Loop instances**: repeated runs of one loop are reported separately
//! - **Typed values**: integers, floats and text are kept as recorded
//! - **One-sink gather**: peers fire their report at host 0 and move on
//!
//! ## Quick Start
//!
//! ```rust
//! use loopstat_runtime::{ReportFormat, StatCollector};
//!
//! fn main() -> Result<(), loopstat_runtime::StatError> {
//!     let collector = StatCollector::with_threads(2)?;
//!
//!     collector.begin_loop_instance("mainLoop")?;
//!     collector.record(0, "mainLoop", "time", 5i64)?;
//!     collector.record(1, "mainLoop", "time", 7i64)?;
//!
//!     let report = collector.render_local_report(ReportFormat::Tabular)?;
//!     assert!(report.text.contains("STAT,0,mainLoop,0,time,2,12,5,7"));
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   Worker Threads                      │
//! │   record(0, ..)     record(1, ..)     record(2, ..)   │
//! │        │                 │                 │          │
//! │        ▼                 ▼                 ▼          │
//! │  ┌──────────┐      ┌──────────┐      ┌──────────┐    │
//! │  │ Slot 0   │      │ Slot 1   │      │ Slot 2   │    │
//! │  │ Mutex<V> │      │ Mutex<V> │      │ Mutex<V> │    │
//! │  └──────────┘      └──────────┘      └──────────┘    │
//! │        names ──▶ SymbolTable    loops ──▶ Instances  │
//! └────────────────────────┬─────────────────────────────┘
//!                          │ shutdown
//!                          ▼
//! ┌──────────────────────────────────────────────────────┐
//! │  Local Reporter: group by (loop, instance, category) │
//! └────────────────────────┬─────────────────────────────┘
//!                          │
//!          host 0 ◀── HOST_REPORT frames ── hosts 1..N
//! ```
//!
//! ## Thread Safety
//!
//! [`StatCollector`] is `Send + Sync`. Reports assume recording has
//! stopped; they take each slot lock only long enough to copy it.

// Core
pub mod collector;
pub mod config;
pub mod error;

// Recording
pub mod instance;
pub mod record;
pub mod store;
pub mod timer;

// Reporting
pub mod net;
pub mod report;

// Monitoring
pub mod logging;

pub use collector::StatCollector;
pub use config::{CollectorConfig, ConfigError, MAX_THREADS};
pub use error::{Result, StatError};
pub use instance::InstanceTracker;
pub use logging::{EventLevel, EventLog, EventLogConfig, ReportEvent};
pub use net::{
    handle_receives, handle_receives_up_to, Frame, HandlerId, HostReportEnvelope, InProcessEndpoint, InProcessNetwork,
    Transport,
};
pub use record::{AggregationKey, Record, StatKind, StatValue};
pub use report::{
    BuildSummary, DistributedReport, GatherSummary, HostRole, LocalReport, PendingReceives,
    ReportFormat, ReportPhase, SINK_HOST,
};
pub use store::{bind_current_thread, current_thread_id, unbind_current_thread, ThreadStore, ThreadStores};
pub use timer::LoopTimer;

pub use loopstat_util::{Symbol, SymbolTable};

/// loopstat-runtime version string from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
