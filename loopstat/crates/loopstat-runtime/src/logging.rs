//! Report Event Logging
//!
//! Structured events emitted while reports are built and gathered, useful for:
//! - Diagnosing a sink that waits on a missing host
//! - Verifying that every peer report arrived exactly once
//! - Timing the reporting phase at shutdown
//!
//! Events are kept in an in-memory buffer and forwarded to the `log` facade,
//! so the embedding binary decides where they end up.
//!
//! Log Levels:
//! - WARN: Gather timeouts, duplicate peer reports
//! - INFO: Report start/finish, local report built
//! - DEBUG: Phase transitions, frames sent and received

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::report::ReportPhase;

/// Severity of a report event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl From<EventLevel> for log::Level {
    fn from(level: EventLevel) -> Self {
        match level {
            EventLevel::Error => log::Level::Error,
            EventLevel::Warn => log::Level::Warn,
            EventLevel::Info => log::Level::Info,
            EventLevel::Debug => log::Level::Debug,
            EventLevel::Trace => log::Level::Trace,
        }
    }
}

/// Report event types
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    /// A distributed report call started on this host
    ReportStarted { host_id: u32, host_count: u32 },

    /// Report state machine moved to a new phase
    PhaseChanged {
        host_id: u32,
        from: ReportPhase,
        to: ReportPhase,
    },

    /// Local report text rendered
    LocalReportBuilt {
        host_id: u32,
        records: usize,
        rows: usize,
        skipped: usize,
    },

    /// Sink received one peer's report
    PeerReportReceived {
        host_id: u32,
        from: u32,
        bytes: usize,
        pending: usize,
        duplicate: bool,
    },

    /// Non-sink handed its report to the transport
    ReportSent { host_id: u32, dest: u32, bytes: usize },

    /// Sink stopped waiting with hosts still missing
    GatherTimedOut {
        host_id: u32,
        missing: Vec<u32>,
        waited_ms: u64,
    },

    /// Report call completed
    ReportFinished {
        host_id: u32,
        duration_ms: f64,
        complete: bool,
    },
}

impl ReportEvent {
    /// Severity of this event
    pub fn level(&self) -> EventLevel {
        match self {
            ReportEvent::GatherTimedOut { .. } => EventLevel::Warn,
            ReportEvent::PeerReportReceived { duplicate: true, .. } => EventLevel::Warn,
            ReportEvent::ReportStarted { .. }
            | ReportEvent::LocalReportBuilt { .. }
            | ReportEvent::ReportFinished { .. } => EventLevel::Info,
            ReportEvent::PhaseChanged { .. }
            | ReportEvent::PeerReportReceived { .. }
            | ReportEvent::ReportSent { .. } => EventLevel::Debug,
        }
    }

    /// JSON representation used when `json` output is enabled
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ReportEvent::ReportStarted {
                host_id,
                host_count,
            } => serde_json::json!({
                "type": "report_started",
                "host_id": host_id,
                "host_count": host_count
            }),
            ReportEvent::PhaseChanged { host_id, from, to } => serde_json::json!({
                "type": "phase_changed",
                "host_id": host_id,
                "from": from.to_string(),
                "to": to.to_string()
            }),
            ReportEvent::LocalReportBuilt {
                host_id,
                records,
                rows,
                skipped,
            } => serde_json::json!({
                "type": "local_report_built",
                "host_id": host_id,
                "records": records,
                "rows": rows,
                "skipped": skipped
            }),
            ReportEvent::PeerReportReceived {
                host_id,
                from,
                bytes,
                pending,
                duplicate,
            } => serde_json::json!({
                "type": "peer_report_received",
                "host_id": host_id,
                "from": from,
                "bytes": bytes,
                "pending": pending,
                "duplicate": duplicate
            }),
            ReportEvent::ReportSent {
                host_id,
                dest,
                bytes,
            } => serde_json::json!({
                "type": "report_sent",
                "host_id": host_id,
                "dest": dest,
                "bytes": bytes
            }),
            ReportEvent::GatherTimedOut {
                host_id,
                missing,
                waited_ms,
            } => serde_json::json!({
                "type": "gather_timed_out",
                "host_id": host_id,
                "missing": missing,
                "waited_ms": waited_ms
            }),
            ReportEvent::ReportFinished {
                host_id,
                duration_ms,
                complete,
            } => serde_json::json!({
                "type": "report_finished",
                "host_id": host_id,
                "duration_ms": duration_ms,
                "complete": complete
            }),
        }
    }
}

impl fmt::Display for ReportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportEvent::ReportStarted {
                host_id,
                host_count,
            } => write!(f, "[stats] Host {}: report started ({} hosts)", host_id, host_count),
            ReportEvent::PhaseChanged { host_id, from, to } => {
                write!(f, "[stats] Host {}: {} -> {}", host_id, from, to)
            },
            ReportEvent::LocalReportBuilt {
                host_id,
                records,
                rows,
                skipped,
            } => write!(
                f,
                "[stats] Host {}: local report built ({} records, {} rows, {} skipped)",
                host_id, records, rows, skipped
            ),
            ReportEvent::PeerReportReceived {
                host_id,
                from,
                bytes,
                pending,
                duplicate,
            } => {
                if *duplicate {
                    write!(
                        f,
                        "[stats] Host {}: duplicate report from host {} ({} bytes), not counted",
                        host_id, from, bytes
                    )
                } else {
                    write!(
                        f,
                        "[stats] Host {}: report from host {} ({} bytes), {} pending",
                        host_id, from, bytes, pending
                    )
                }
            },
            ReportEvent::ReportSent {
                host_id,
                dest,
                bytes,
            } => write!(
                f,
                "[stats] Host {}: sent report to host {} ({} bytes)",
                host_id, dest, bytes
            ),
            ReportEvent::GatherTimedOut {
                host_id,
                missing,
                waited_ms,
            } => write!(
                f,
                "[stats] Host {}: gave up after {}ms, missing hosts {:?}",
                host_id, waited_ms, missing
            ),
            ReportEvent::ReportFinished {
                host_id,
                duration_ms,
                complete,
            } => write!(
                f,
                "[stats] Host {}: report finished ({:.2}ms, {})",
                host_id,
                duration_ms,
                if *complete { "complete" } else { "partial" }
            ),
        }
    }
}

/// Event log configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventLogConfig {
    /// Minimum level that is buffered and forwarded
    pub level: EventLevel,

    /// Forward events as JSON objects instead of text
    pub json: bool,

    /// Prefix human-readable events with a local timestamp
    pub timestamps: bool,

    /// Start enabled
    pub enabled: bool,
}

impl Default for EventLogConfig {
    fn default() -> Self {
        Self {
            level: EventLevel::Info,
            json: false,
            timestamps: false,
            enabled: true,
        }
    }
}

/// Event log owned by one collector
pub struct EventLog {
    config: EventLogConfig,
    events: Mutex<Vec<(Instant, ReportEvent)>>,
    enabled: AtomicBool,
}

impl EventLog {
    /// Create new event log
    pub fn new(config: EventLogConfig) -> Self {
        let enabled = AtomicBool::new(config.enabled);
        Self {
            config,
            events: Mutex::new(Vec::new()),
            enabled,
        }
    }

    /// Enable logging
    pub fn enable(&self) {
        self.enabled.store(true, Ordering::Relaxed);
    }

    /// Disable logging
    pub fn disable(&self) {
        self.enabled.store(false, Ordering::Relaxed);
    }

    /// Check if logging is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    /// Configuration this log was built with
    pub fn config(&self) -> &EventLogConfig {
        &self.config
    }

    /// Log a report event
    pub fn log(&self, event: ReportEvent) {
        if !self.is_enabled() {
            return;
        }

        let level = event.level();
        if level > self.config.level {
            return;
        }

        self.forward(level, &event);
        self.events.lock().push((Instant::now(), event));
    }

    fn forward(&self, level: EventLevel, event: &ReportEvent) {
        let level = log::Level::from(level);
        if !log::log_enabled!(target: "loopstat::events", level) {
            return;
        }

        if self.config.json {
            log::log!(target: "loopstat::events", level, "{}", event.to_json());
        } else if self.config.timestamps {
            let now = chrono::Local::now();
            log::log!(
                target: "loopstat::events",
                level,
                "[{}] {}",
                now.format("%Y-%m-%d %H:%M:%S%.3f"),
                event
            );
        } else {
            log::log!(target: "loopstat::events", level, "{}", event);
        }
    }

    /// Get all buffered events, oldest first
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().iter().map(|(_, e)| e.clone()).collect()
    }

    /// Get buffered events with the instant they were logged
    pub fn timed_events(&self) -> Vec<(Instant, ReportEvent)> {
        self.events.lock().clone()
    }

    /// Clear all events
    pub fn clear(&self) {
        self.events.lock().clear();
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(EventLogConfig::default())
    }
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLog")
            .field("config", &self.config)
            .field("enabled", &self.is_enabled())
            .field("events", &self.event_count())
            .finish()
    }
}
