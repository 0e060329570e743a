//! StatCollector - the runtime-wide statistics collector
//!
//! Owns the symbol table, instance tracker, thread stores and event log for
//! one host. Share it between workers with `Arc`; every recording method
//! takes `&self`.
//!
//! # Recording vs Reporting
//!
//! `record` may run from any number of threads at once. Reporting copies
//! the stores one slot at a time and expects recording to have stopped; a
//! record that races with a report lands in it or not, but never corrupts it.

use std::io::Write;
use std::time::Duration;

use loopstat_util::SymbolTable;

use crate::config::CollectorConfig;
use crate::error::{Result, StatError};
use crate::instance::InstanceTracker;
use crate::logging::EventLog;
use crate::net::Transport;
use crate::record::{Record, StatValue};
use crate::report::local::{self, BuildSummary, LocalReport};
use crate::report::{distributed, DistributedReport, GatherSummary, ReportFormat};
use crate::store::{current_thread_id, ThreadStores};

/// Statistics collector for one host
pub struct StatCollector {
    config: CollectorConfig,
    symbols: SymbolTable,
    instances: InstanceTracker,
    stores: ThreadStores,
    events: EventLog,
}

impl StatCollector {
    /// Create a collector with `config.threads` empty slots
    pub fn new(config: CollectorConfig) -> Result<Self> {
        config.validate()?;

        log::debug!(
            "stat collector: host {}, {} thread slots",
            config.host_id,
            config.threads
        );

        Ok(Self {
            symbols: SymbolTable::new(),
            instances: InstanceTracker::new(),
            stores: ThreadStores::new(config.threads),
            events: EventLog::new(config.events.clone()),
            config,
        })
    }

    /// Collector with default config and `threads` slots
    pub fn with_threads(threads: usize) -> Result<Self> {
        Self::new(CollectorConfig::default().with_threads(threads))
    }

    /// Record `value` under `loop_name`/`category` into slot `tid`
    ///
    /// The record carries the loop's current instance. `tid` may name
    /// another thread's slot.
    pub fn record(
        &self,
        tid: usize,
        loop_name: &str,
        category: &str,
        value: impl Into<StatValue>,
    ) -> Result<()> {
        let store = self.stores.get(tid)?;
        let loop_name = self.symbols.try_intern(loop_name)?;
        let category = self.symbols.try_intern(category)?;
        let instance = self.instances.current(loop_name);

        store.push(Record {
            loop_name,
            category,
            instance,
            value: value.into(),
        });
        Ok(())
    }

    /// Record into the slot bound to the calling thread
    pub fn record_local(
        &self,
        loop_name: &str,
        category: &str,
        value: impl Into<StatValue>,
    ) -> Result<()> {
        let tid = current_thread_id().ok_or(StatError::UnboundThread)?;
        self.record(tid, loop_name, category, value)
    }

    /// Start a new instance of `loop_name`, returning its number
    pub fn begin_loop_instance(&self, loop_name: &str) -> Result<u32> {
        let symbol = self.symbols.try_intern(loop_name)?;
        Ok(self.instances.begin(symbol))
    }

    /// Current instance of `loop_name`, 0 if it never began
    ///
    /// Never interns `loop_name`.
    pub fn current_instance(&self, loop_name: &str) -> u32 {
        self.symbols
            .lookup(loop_name)
            .map_or(0, |symbol| self.instances.current(symbol))
    }

    /// Number of thread slots
    pub fn thread_count(&self) -> usize {
        self.stores.len()
    }

    /// Host id used by local reports
    pub fn host_id(&self) -> u32 {
        self.config.host_id
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    /// Names seen so far
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Total records across all slots
    pub fn record_count(&self) -> usize {
        self.stores.record_count()
    }

    /// Report events logged by this collector
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub(crate) fn gather_timeout(&self) -> Option<Duration> {
        self.config.gather_timeout()
    }

    /// Copy of every slot's records, slot `i` at index `i`
    pub fn snapshot(&self) -> Vec<Vec<Record>> {
        self.stores.snapshot()
    }

    /// Render this host's report
    pub fn render_local_report(&self, format: ReportFormat) -> Result<LocalReport> {
        local::render(self.config.host_id, &self.symbols, &self.snapshot(), format)
    }

    /// Write this host's report to `out`
    pub fn write_local_report<W: Write + ?Sized>(
        &self,
        format: ReportFormat,
        out: &mut W,
    ) -> Result<BuildSummary> {
        let summary = local::write(self.config.host_id, &self.symbols, &self.snapshot(), format, out)?;
        out.flush()?;
        Ok(summary)
    }

    /// Run the distributed report over `transport`
    ///
    /// On the sink the returned text is the consolidated report. On a peer
    /// it is that host's own contribution, already sent to the sink.
    pub fn render_distributed_report<T: Transport + ?Sized>(
        &self,
        transport: &T,
        format: ReportFormat,
    ) -> Result<DistributedReport> {
        let mut buf = Vec::new();
        let (local, summary) = distributed::gather(self, transport, format, &mut buf)?;
        let text = match summary.role {
            distributed::HostRole::Sink => String::from_utf8(buf)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?,
            distributed::HostRole::Peer => local.text,
        };
        Ok(DistributedReport { text, summary })
    }

    /// Run the distributed report, streaming the sink's output to `out`
    ///
    /// Peers write nothing to `out`.
    pub fn write_distributed_report<T, W>(
        &self,
        transport: &T,
        format: ReportFormat,
        out: &mut W,
    ) -> Result<GatherSummary>
    where
        T: Transport + ?Sized,
        W: Write + ?Sized,
    {
        let (_, summary) = distributed::gather(self, transport, format, out)?;
        Ok(summary)
    }
}

impl std::fmt::Debug for StatCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatCollector")
            .field("host_id", &self.config.host_id)
            .field("threads", &self.stores.len())
            .field("symbols", &self.symbols.len())
            .field("loops", &self.instances.len())
            .field("records", &self.record_count())
            .finish()
    }
}
