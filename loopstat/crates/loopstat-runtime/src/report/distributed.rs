//! Distributed Reporter - gathers every host's report on the sink
//!
//! # Protocol
//!
//! ```text
//!             IDLE
//!               │
//!          BUILDING_LOCAL          every host renders its own report
//!           │         │
//!   WAITING_FOR_PEERS  SENDING     sink: print own, drain peers
//!           │         │            peer: send to sink, flush, return
//!              DONE
//! ```
//!
//! The sink (host 0) counts down one pending receive per distinct peer and
//! prints each peer's text verbatim as it arrives. A repeated report from a
//! peer that was already counted is logged and discarded. Peers never wait
//! for an acknowledgement.
//!
//! Merging happens at text level: in the structured format the sink's
//! output is one JSON array per host, back to back.
//!
//! With a gather timeout configured, the sink stops waiting once the timeout
//! expires and appends a `# PARTIAL REPORT` trailer naming the missing hosts.
//! Without one it waits for as long as a peer stays silent.

use std::fmt;
use std::io::Write;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use super::local::{self, LocalReport};
use super::ReportFormat;
use crate::collector::StatCollector;
use crate::error::{Result, StatError};
use crate::logging::{EventLog, ReportEvent};
use crate::net::{handle_receives_up_to, Frame, HandlerId, HostReportEnvelope, Transport};

/// Host that emits the consolidated report
pub const SINK_HOST: u32 = 0;

/// Trailer prefix written when the sink gives up on missing hosts
pub const PARTIAL_REPORT_MARKER: &str = "# PARTIAL REPORT";

/// Report state machine phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportPhase {
    Idle,
    BuildingLocal,
    WaitingForPeers,
    Sending,
    Done,
}

impl ReportPhase {
    /// Whether `next` may follow `self`
    pub fn can_advance_to(self, next: ReportPhase) -> bool {
        matches!(
            (self, next),
            (ReportPhase::Idle, ReportPhase::BuildingLocal)
                | (ReportPhase::BuildingLocal, ReportPhase::WaitingForPeers)
                | (ReportPhase::BuildingLocal, ReportPhase::Sending)
                | (ReportPhase::WaitingForPeers, ReportPhase::Done)
                | (ReportPhase::Sending, ReportPhase::Done)
        )
    }
}

impl fmt::Display for ReportPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReportPhase::Idle => "IDLE",
            ReportPhase::BuildingLocal => "BUILDING_LOCAL",
            ReportPhase::WaitingForPeers => "WAITING_FOR_PEERS",
            ReportPhase::Sending => "SENDING",
            ReportPhase::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Role of a host in one report call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostRole {
    Sink,
    Peer,
}

impl HostRole {
    pub fn of(host_id: u32) -> Self {
        if host_id == SINK_HOST {
            HostRole::Sink
        } else {
            HostRole::Peer
        }
    }
}

/// Peer reports the sink still expects during one report call
///
/// Starts at `host_count - 1` and drops by one per distinct peer. A second
/// report from the same host, or one claiming to come from the sink or from
/// a host outside the run, is not counted and is not printed.
#[derive(Debug, Clone)]
pub struct PendingReceives {
    host_count: u32,
    initial: usize,
    received: IndexMap<u32, usize, FxBuildHasher>,
}

impl PendingReceives {
    pub fn new(host_count: u32) -> Self {
        let initial = host_count.saturating_sub(1) as usize;
        Self {
            host_count,
            initial,
            received: IndexMap::with_capacity_and_hasher(initial, FxBuildHasher),
        }
    }

    /// Count at the start of the call
    pub fn initial(&self) -> usize {
        self.initial
    }

    /// Reports still expected
    pub fn remaining(&self) -> usize {
        self.initial - self.received.len()
    }

    pub fn is_complete(&self) -> bool {
        self.remaining() == 0
    }

    /// Note a report from `from`; returns true if it was counted
    pub fn record(&mut self, from: u32, bytes: usize) -> bool {
        if from == SINK_HOST || from >= self.host_count || self.received.contains_key(&from) {
            return false;
        }
        self.received.insert(from, bytes);
        true
    }

    /// Counted peers in arrival order
    pub fn received_from(&self) -> Vec<u32> {
        self.received.keys().copied().collect()
    }

    /// Peers not heard from, ascending
    pub fn missing(&self) -> Vec<u32> {
        (1..self.host_count)
            .filter(|host| !self.received.contains_key(host))
            .collect()
    }
}

/// Outcome of one distributed report call on one host
#[derive(Debug, Clone, PartialEq)]
pub struct GatherSummary {
    pub host_id: u32,
    pub role: HostRole,
    /// Pending receives at the start of the call (0 on peers)
    pub initial_pending: usize,
    /// Pending receives when the call returned
    pub pending: usize,
    /// Peers whose reports were counted, in arrival order
    pub received_from: Vec<u32>,
    /// Peers still missing when the call returned
    pub missing: Vec<u32>,
    /// Repeated peer reports, discarded
    pub duplicates: usize,
    /// Time the sink spent draining peers
    pub waited: Duration,
    /// Every phase visited, starting with `Idle`
    pub phases: Vec<ReportPhase>,
}

impl GatherSummary {
    /// True unless the sink stopped with hosts missing
    pub fn is_complete(&self) -> bool {
        self.pending == 0
    }

    /// Turn a partial gather into [`StatError::GatherTimeout`]
    pub fn into_result(self) -> Result<Self> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(StatError::GatherTimeout {
                missing: self.missing,
                waited_ms: u64::try_from(self.waited.as_millis()).unwrap_or(u64::MAX),
            })
        }
    }
}

/// Text and summary of one distributed report call
///
/// On the sink `text` is the consolidated report; on a peer it is the text
/// that host contributed.
#[derive(Debug, Clone, PartialEq)]
pub struct DistributedReport {
    pub text: String,
    pub summary: GatherSummary,
}

impl DistributedReport {
    pub fn is_sink(&self) -> bool {
        self.summary.role == HostRole::Sink
    }
}

struct PhaseTracker<'a> {
    host_id: u32,
    current: ReportPhase,
    history: Vec<ReportPhase>,
    events: &'a EventLog,
}

impl<'a> PhaseTracker<'a> {
    fn new(host_id: u32, events: &'a EventLog) -> Self {
        Self {
            host_id,
            current: ReportPhase::Idle,
            history: vec![ReportPhase::Idle],
            events,
        }
    }

    fn advance(&mut self, next: ReportPhase) -> Result<()> {
        if !self.current.can_advance_to(next) {
            return Err(StatError::InvalidState {
                expected: format!("a successor of {}", self.current),
                actual: next.to_string(),
            });
        }
        self.events.log(ReportEvent::PhaseChanged {
            host_id: self.host_id,
            from: self.current,
            to: next,
        });
        self.current = next;
        self.history.push(next);
        Ok(())
    }
}

/// Spin, then sleep with doubling intervals while the inbox stays empty
struct Backoff {
    idle: usize,
    sleep_us: u64,
}

impl Backoff {
    const SPIN_ITERATIONS: usize = 50;
    const MIN_SLEEP_US: u64 = 10;
    const MAX_SLEEP_US: u64 = 1000;

    fn new() -> Self {
        Self {
            idle: 0,
            sleep_us: Self::MIN_SLEEP_US,
        }
    }

    fn reset(&mut self) {
        self.idle = 0;
        self.sleep_us = Self::MIN_SLEEP_US;
    }

    /// Wait a little; never sleeps past `budget`
    fn snooze(&mut self, budget: Option<Duration>) {
        self.idle += 1;
        if self.idle < Self::SPIN_ITERATIONS {
            std::hint::spin_loop();
            return;
        }

        let mut nap = Duration::from_micros(self.sleep_us);
        if let Some(budget) = budget {
            nap = nap.min(budget);
        }
        std::thread::sleep(nap);
        self.sleep_us = (self.sleep_us * 2).min(Self::MAX_SLEEP_US);
    }
}

/// Run one distributed report call
///
/// The sink writes the consolidated report to `out` as it is assembled;
/// peers write nothing. Returns this host's local report and the summary.
pub(crate) fn gather<T, W>(
    collector: &StatCollector,
    transport: &T,
    format: ReportFormat,
    out: &mut W,
) -> Result<(LocalReport, GatherSummary)>
where
    T: Transport + ?Sized,
    W: Write + ?Sized,
{
    let started = Instant::now();
    let host_id = transport.host_id();
    let host_count = transport.host_count();
    let events = collector.events();

    events.log(ReportEvent::ReportStarted {
        host_id,
        host_count,
    });

    let mut phases = PhaseTracker::new(host_id, events);
    phases.advance(ReportPhase::BuildingLocal)?;

    let local = local::render(host_id, collector.symbols(), &collector.snapshot(), format)?;
    events.log(ReportEvent::LocalReportBuilt {
        host_id,
        records: local.summary.records,
        rows: local.summary.rows,
        skipped: local.summary.skipped,
    });

    let role = HostRole::of(host_id);
    let mut pending = PendingReceives::new(host_count);
    let mut duplicates = 0;
    let mut waited = Duration::ZERO;

    match role {
        HostRole::Sink => {
            phases.advance(ReportPhase::WaitingForPeers)?;
            out.write_all(local.text.as_bytes())?;

            let drain_started = Instant::now();
            duplicates = drain(
                transport,
                &mut pending,
                out,
                events,
                collector.gather_timeout(),
            )?;
            waited = drain_started.elapsed();

            if !pending.is_complete() {
                let missing = pending.missing();
                writeln!(out, "{}: missing hosts {:?}", PARTIAL_REPORT_MARKER, missing)?;
                events.log(ReportEvent::GatherTimedOut {
                    host_id,
                    missing,
                    waited_ms: u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                });
            }
            out.flush()?;
        },
        HostRole::Peer => {
            phases.advance(ReportPhase::Sending)?;
            let frame = HostReportEnvelope::new(host_id, local.text.as_str()).into_frame()?;
            let bytes = frame.body.len();
            transport.send(SINK_HOST, frame)?;
            transport.flush()?;
            events.log(ReportEvent::ReportSent {
                host_id,
                dest: SINK_HOST,
                bytes,
            });
        },
    }

    phases.advance(ReportPhase::Done)?;

    let (initial_pending, remaining, received_from, missing) = match role {
        HostRole::Sink => (
            pending.initial(),
            pending.remaining(),
            pending.received_from(),
            pending.missing(),
        ),
        HostRole::Peer => (0, 0, Vec::new(), Vec::new()),
    };

    let summary = GatherSummary {
        host_id,
        role,
        initial_pending,
        pending: remaining,
        received_from,
        missing,
        duplicates,
        waited,
        phases: phases.history,
    };

    events.log(ReportEvent::ReportFinished {
        host_id,
        duration_ms: started.elapsed().as_secs_f64() * 1000.0,
        complete: summary.is_complete(),
    });

    Ok((local, summary))
}

/// Service the inbox until every peer reported or the timeout expired
///
/// The deadline is checked before every batch, so a steady stream of
/// frames cannot hold the sink past it. Returns the number of duplicate
/// reports seen.
fn drain<T, W>(
    transport: &T,
    pending: &mut PendingReceives,
    out: &mut W,
    events: &EventLog,
    timeout: Option<Duration>,
) -> Result<usize>
where
    T: Transport + ?Sized,
    W: Write + ?Sized,
{
    let host_id = transport.host_id();
    let start = Instant::now();
    let mut backoff = Backoff::new();
    let mut duplicates = 0;

    while !pending.is_complete() {
        let budget = match timeout {
            Some(limit) => {
                let elapsed = start.elapsed();
                if elapsed >= limit {
                    break;
                }
                Some(limit - elapsed)
            },
            None => None,
        };

        let handled = handle_receives_up_to(transport, DRAIN_BATCH, |frame| {
            if let FrameOutcome::Duplicate = on_frame(host_id, frame, pending, out, events)? {
                duplicates += 1;
            }
            Ok(())
        })?;

        if handled > 0 {
            backoff.reset();
        } else {
            backoff.snooze(budget);
        }
    }

    Ok(duplicates)
}

/// Frames handled between two deadline checks
const DRAIN_BATCH: usize = 64;

/// What the landing pad did with one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameOutcome {
    Counted,
    Duplicate,
    Dropped,
}

/// Landing pad for inbound frames
///
/// Only the first report from each peer reaches `out`; repeats are logged
/// and discarded.
fn on_frame<W: Write + ?Sized>(
    host_id: u32,
    frame: Frame,
    pending: &mut PendingReceives,
    out: &mut W,
    events: &EventLog,
) -> Result<FrameOutcome> {
    if frame.handler != HandlerId::HOST_REPORT {
        log::warn!(
            "host {}: dropping frame for {} from host {}",
            host_id,
            frame.handler,
            frame.sender
        );
        return Ok(FrameOutcome::Dropped);
    }

    let envelope = match HostReportEnvelope::decode(&frame.body) {
        Ok(envelope) => envelope,
        Err(err) => {
            log::warn!(
                "host {}: dropping malformed report from host {}: {}",
                host_id,
                frame.sender,
                err
            );
            return Ok(FrameOutcome::Dropped);
        },
    };

    let counted = pending.record(envelope.sender, envelope.payload.len());
    if counted {
        out.write_all(envelope.payload.as_bytes())?;
    }

    events.log(ReportEvent::PeerReportReceived {
        host_id,
        from: envelope.sender,
        bytes: envelope.payload.len(),
        pending: pending.remaining(),
        duplicate: !counted,
    });

    Ok(if counted {
        FrameOutcome::Counted
    } else {
        FrameOutcome::Duplicate
    })
}
