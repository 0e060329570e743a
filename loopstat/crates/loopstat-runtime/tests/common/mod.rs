//! Shared fixtures for loopstat-runtime integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use loopstat_runtime::{
    CollectorConfig, DistributedReport, InProcessEndpoint, InProcessNetwork, ReportFormat,
    StatCollector,
};

/// Upper bound for tests that must finish even if a peer never reports
pub const TEST_TIMEOUT: Duration = Duration::from_secs(30);

/// ============================================================================
/// COLLECTOR FIXTURE
/// ============================================================================

/// One collector with a fixed number of slots
pub struct StatFixture {
    pub collector: Arc<StatCollector>,
}

impl StatFixture {
    pub fn with_threads(threads: usize) -> Self {
        Self::with_config(CollectorConfig::default().with_threads(threads))
    }

    pub fn with_config(config: CollectorConfig) -> Self {
        let collector = StatCollector::new(config)
            .unwrap_or_else(|e| panic!("collector should accept valid config: {}", e));
        Self {
            collector: Arc::new(collector),
        }
    }

    pub fn record(&self, tid: usize, loop_name: &str, category: &str, value: i64) {
        self.collector
            .record(tid, loop_name, category, value)
            .unwrap_or_else(|e| panic!("record into slot {} failed: {}", tid, e));
    }

    pub fn tabular(&self) -> String {
        self.report(ReportFormat::Tabular)
    }

    pub fn report(&self, format: ReportFormat) -> String {
        self.collector
            .render_local_report(format)
            .unwrap_or_else(|e| panic!("local report failed: {}", e))
            .text
    }

    /// Data rows of the tabular report, header dropped
    pub fn rows(&self) -> Vec<String> {
        self.tabular().lines().skip(1).map(str::to_owned).collect()
    }
}

/// ============================================================================
/// CLUSTER FIXTURE
/// ============================================================================

/// Collectors plus connected in-process endpoints, one per host
pub struct Cluster {
    pub hosts: Vec<(Arc<StatCollector>, InProcessEndpoint)>,
}

impl Cluster {
    pub fn new(host_count: u32, threads: usize) -> Self {
        Self::with_config(host_count, CollectorConfig::default().with_threads(threads))
    }

    pub fn with_config(host_count: u32, config: CollectorConfig) -> Self {
        let hosts = InProcessNetwork::build(host_count)
            .into_iter()
            .map(|endpoint| {
                let config = config.clone().with_host_id(endpoint_id(&endpoint));
                let collector = StatCollector::new(config)
                    .unwrap_or_else(|e| panic!("collector should accept valid config: {}", e));
                (Arc::new(collector), endpoint)
            })
            .collect();
        Self { hosts }
    }

    pub fn collector(&self, host: usize) -> &StatCollector {
        &self.hosts[host].0
    }

    /// Run the distributed report on every host, each on its own thread
    ///
    /// Hosts listed in `silent` skip the call, as if they had crashed.
    /// Results are indexed by host id; silent hosts yield `None`.
    pub fn report(self, format: ReportFormat, silent: &[u32]) -> Vec<Option<DistributedReport>> {
        let handles: Vec<_> = self
            .hosts
            .into_iter()
            .enumerate()
            .map(|(host, (collector, endpoint))| {
                let skip = silent.contains(&(host as u32));
                thread::spawn(move || {
                    if skip {
                        drop(endpoint);
                        return None;
                    }
                    let report = collector
                        .render_distributed_report(&endpoint, format)
                        .unwrap_or_else(|e| panic!("host {} report failed: {}", host, e));
                    Some(report)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| panic!("host thread panicked")))
            .collect()
    }
}

fn endpoint_id(endpoint: &InProcessEndpoint) -> u32 {
    use loopstat_runtime::Transport;
    endpoint.host_id()
}
