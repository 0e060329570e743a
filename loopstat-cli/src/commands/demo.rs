//! Demo command implementation.
//!
//! Simulates a multi-host run inside one process: every host is an OS thread
//! with its own collector and rayon worker pool, and the hosts gather their
//! reports over an in-process network. The sink's consolidated report goes
//! to stdout or to the requested file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use loopstat_runtime::{
    CollectorConfig, GatherSummary, InProcessEndpoint, InProcessNetwork, LoopTimer, ReportFormat,
    StatCollector, StatError, Transport, SINK_HOST,
};
use rayon::prelude::*;

use crate::error::{CliError, Result};

/// Work items handed to each worker per loop instance
const ITEMS_PER_WORKER: usize = 4;

/// Arguments for the demo command.
#[derive(Debug, Clone)]
pub struct DemoArgs {
    /// Number of simulated hosts, sink included.
    pub hosts: u32,
    /// Worker threads (and stat slots) per host.
    pub threads: usize,
    /// Distinct loop names.
    pub loops: usize,
    /// Instances of each loop.
    pub iterations: usize,
    /// Report format.
    pub format: ReportFormat,
    /// Sink's bounded wait for peers, 0 to wait forever.
    pub timeout_ms: u64,
    /// Write the report here instead of stdout.
    pub output: Option<PathBuf>,
    /// Host that skips sending its report.
    pub drop_host: Option<u32>,
    /// Fail if the report is partial.
    pub strict: bool,
}

/// What a demo run produced.
#[derive(Debug, Clone)]
pub struct DemoOutcome {
    /// The sink's gather summary.
    pub summary: GatherSummary,
    /// Wall time of the whole run.
    pub elapsed: Duration,
}

/// Run the demo, writing the sink's report to stdout or `args.output`.
pub fn run_demo(args: &DemoArgs, base: &CollectorConfig) -> Result<DemoOutcome> {
    match &args.output {
        Some(path) => {
            let file = BufWriter::new(File::create(path)?);
            run_demo_with_writer(args, base, file)
        },
        None => run_demo_with_writer(args, base, io::stdout()),
    }
}

/// Run the demo, writing the sink's report to `out`.
pub fn run_demo_with_writer<W: Write + Send>(
    args: &DemoArgs,
    base: &CollectorConfig,
    mut out: W,
) -> Result<DemoOutcome> {
    validate(args)?;

    let config = base
        .clone()
        .with_threads(args.threads)
        .with_gather_timeout(Duration::from_millis(args.timeout_ms));
    config.validate().map_err(StatError::from)?;

    tracing::info!(
        hosts = args.hosts,
        threads = args.threads,
        loops = args.loops,
        iterations = args.iterations,
        "starting simulated run"
    );

    let started = Instant::now();
    let endpoints = InProcessNetwork::build(args.hosts);

    let results = thread::scope(|scope| -> Result<Vec<(u32, Result<Option<GatherSummary>>)>> {
        let mut sink_out = Some(&mut out);
        let mut handles = Vec::with_capacity(endpoints.len());

        for endpoint in endpoints {
            let host = endpoint.host_id();
            let config = config.clone().with_host_id(host);
            let out = if host == SINK_HOST { sink_out.take() } else { None };
            let handle = thread::Builder::new()
                .name(format!("host-{}", host))
                .spawn_scoped(scope, move || run_host(host, endpoint, config, args, out))?;
            handles.push((host, handle));
        }

        Ok(handles
            .into_iter()
            .map(|(host, handle)| {
                let result = handle.join().unwrap_or_else(|_| {
                    Err(CliError::HostFailed {
                        host,
                        reason: "thread panicked".to_string(),
                    })
                });
                (host, result)
            })
            .collect())
    })?;

    let mut sink_summary = None;
    for (host, result) in results {
        if let Some(summary) = result? {
            if host == SINK_HOST {
                sink_summary = Some(summary);
            }
        }
    }
    let summary = sink_summary.ok_or_else(|| CliError::HostFailed {
        host: SINK_HOST,
        reason: "sink produced no report".to_string(),
    })?;

    if !summary.is_complete() {
        tracing::warn!(missing = ?summary.missing, "report is partial");
        if args.strict {
            return Err(summary.into_result().err().map_or_else(
                || CliError::Validation("partial report".to_string()),
                CliError::from,
            ));
        }
    }

    Ok(DemoOutcome {
        summary,
        elapsed: started.elapsed(),
    })
}

fn validate(args: &DemoArgs) -> Result<()> {
    if args.hosts == 0 {
        return Err(CliError::Validation("--hosts must be at least 1".to_string()));
    }
    if args.threads == 0 {
        return Err(CliError::Validation("--threads must be at least 1".to_string()));
    }
    if let Some(host) = args.drop_host {
        if host == SINK_HOST {
            return Err(CliError::Validation(
                "--drop-host cannot name the sink (host 0)".to_string(),
            ));
        }
        if host >= args.hosts {
            return Err(CliError::Validation(format!(
                "--drop-host {} is not one of the {} hosts",
                host, args.hosts
            )));
        }
        if args.timeout_ms == 0 {
            return Err(CliError::Validation(
                "--drop-host requires --timeout-ms, or the sink would wait forever".to_string(),
            ));
        }
    }
    Ok(())
}

fn run_host<W: Write + ?Sized>(
    host: u32,
    endpoint: InProcessEndpoint,
    config: CollectorConfig,
    args: &DemoArgs,
    out: Option<&mut W>,
) -> Result<Option<GatherSummary>> {
    let collector = StatCollector::new(config)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(args.threads)
        .thread_name(move |i| format!("host{}-worker{}", host, i))
        .build()
        .map_err(|e| CliError::HostFailed {
            host,
            reason: e.to_string(),
        })?;

    simulate(&collector, &pool, args)?;
    tracing::debug!(host, records = collector.record_count(), "host finished work");

    if args.drop_host == Some(host) {
        tracing::warn!(host, "skipping report");
        return Ok(None);
    }

    let summary = match out {
        Some(out) => collector.write_distributed_report(&endpoint, args.format, out)?,
        None => collector.write_distributed_report(&endpoint, args.format, &mut io::sink())?,
    };
    Ok(Some(summary))
}

fn simulate(collector: &StatCollector, pool: &rayon::ThreadPool, args: &DemoArgs) -> Result<()> {
    let items = args.threads * ITEMS_PER_WORKER;
    for l in 0..args.loops {
        let name = format!("loop{}", l);
        for _ in 0..args.iterations {
            collector.begin_loop_instance(&name)?;
            pool.install(|| {
                (0..items)
                    .into_par_iter()
                    .try_for_each(|item| work_item(collector, &name, item))
            })?;
        }
    }
    Ok(())
}

fn work_item(collector: &StatCollector, loop_name: &str, item: usize) -> Result<()> {
    let tid = rayon::current_thread_index().unwrap_or(0);
    let timer = LoopTimer::start(collector, tid, loop_name);

    let checksum = (0..(item as u64 + 1) * 1000).fold(0u64, |acc, x| acc.wrapping_add(x * x));

    collector.record(tid, loop_name, "Iterations", 1i64)?;
    collector.record(tid, loop_name, "Ratio", (checksum % 1000) as f64 / 1000.0)?;
    collector.record(tid, loop_name, "Mode", if item % 2 == 0 { "push" } else { "pull" })?;
    timer.stop()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(hosts: u32) -> DemoArgs {
        DemoArgs {
            hosts,
            threads: 2,
            loops: 1,
            iterations: 2,
            format: ReportFormat::Tabular,
            timeout_ms: 0,
            output: None,
            drop_host: None,
            strict: false,
        }
    }

    fn run(args: &DemoArgs) -> (String, Result<DemoOutcome>) {
        let mut out = Vec::new();
        let result = run_demo_with_writer(args, &CollectorConfig::default(), &mut out);
        (String::from_utf8(out).unwrap(), result)
    }

    #[test]
    fn test_every_host_reports() {
        let (text, result) = run(&args(3));
        let outcome = result.unwrap();

        assert!(outcome.summary.is_complete());
        assert_eq!(text.matches("STATTYPE").count(), 3);
        for host in 0..3 {
            // 2 workers x 4 items, once per instance
            for instance in 0..2 {
                let prefix = format!("STAT,{},loop0,{},Iterations,", host, instance);
                let row = text.lines().find(|l| l.starts_with(&prefix)).unwrap();
                let sum: i64 = row.split(',').nth(6).unwrap().parse().unwrap();
                assert_eq!(sum, 8);
            }
        }
    }

    #[test]
    fn test_dropped_host_gives_partial_report() {
        let mut a = args(3);
        a.drop_host = Some(2);
        a.timeout_ms = 50;

        let (text, result) = run(&a);
        let outcome = result.unwrap();
        assert_eq!(outcome.summary.missing, vec![2]);
        assert!(text.ends_with("# PARTIAL REPORT: missing hosts [2]\n"));
    }

    #[test]
    fn test_strict_fails_on_partial_report() {
        let mut a = args(2);
        a.drop_host = Some(1);
        a.timeout_ms = 20;
        a.strict = true;

        let (_, result) = run(&a);
        assert!(matches!(
            result,
            Err(CliError::Stats(StatError::GatherTimeout { .. }))
        ));
    }

    #[test]
    fn test_validation() {
        let mut a = args(0);
        assert!(matches!(run(&a).1, Err(CliError::Validation(_))));

        a = args(2);
        a.drop_host = Some(0);
        assert!(matches!(run(&a).1, Err(CliError::Validation(_))));

        a = args(2);
        a.drop_host = Some(1);
        assert!(matches!(run(&a).1, Err(CliError::Validation(_))));

        a = args(2);
        a.drop_host = Some(5);
        a.timeout_ms = 10;
        assert!(matches!(run(&a).1, Err(CliError::Validation(_))));
    }

    #[test]
    fn test_records_format() {
        let mut a = args(1);
        a.format = ReportFormat::Records;
        let (text, result) = run(&a);
        result.unwrap();

        assert!(text.starts_with("HOST,LOOP,INSTANCE,CATEGORY,THREAD,VAL\n"));
        assert!(text.contains(",Mode,"));
        assert!(text.contains(",Ratio,"));
        assert!(text.contains(",Time,"));
    }
}
