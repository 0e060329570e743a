//! Local Reporter - merges one host's thread slots into a report
//!
//! # Grouping Rules
//!
//! - Rows are keyed by [`AggregationKey`] and emitted in key order.
//! - A key takes the kind of the first record seen for it, scanning slots in
//!   index order and each slot in insertion order. Records of any other kind
//!   under that key are skipped and counted in [`BuildSummary::skipped`].
//! - Only `Int` keys appear in the tabular form. `N` is the number of slots
//!   that recorded at least one `Int` under the key. A slot whose values
//!   cancel out still counts and prints a `0` column, so `N` can exceed the
//!   number of non-zero columns.
//! - `SUM` and each `Tk` add with wrapping arithmetic, and the first
//!   overflow is logged.
//! - Thread columns run from `T0` to the highest slot holding any record.
//!   An empty host still prints the header with `T0`.

use std::io::{self, Write};
use std::sync::Arc;

use loopstat_util::{Symbol, SymbolTable};
use rustc_hash::FxHashMap;
use serde::Serialize;

use super::ReportFormat;
use crate::error::Result;
use crate::record::{AggregationKey, Record, StatKind, StatValue};

/// Row tag of the tabular form
pub const STAT_TYPE: &str = "STAT";

/// What a render pass produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Records scanned across all slots
    pub records: usize,
    /// Rows or objects written, header excluded
    pub rows: usize,
    /// Records dropped for disagreeing with their key's kind
    pub skipped: usize,
    /// Highest thread column printed
    pub max_thread: usize,
    /// Some integer sum wrapped
    pub overflowed: bool,
}

/// Rendered report for one host
#[derive(Debug, Clone, PartialEq)]
pub struct LocalReport {
    pub text: String,
    pub summary: BuildSummary,
}

/// Render `slots` into a string
///
/// `slots[i]` holds thread slot `i`'s records in insertion order.
pub fn render(
    host_id: u32,
    symbols: &SymbolTable,
    slots: &[Vec<Record>],
    format: ReportFormat,
) -> Result<LocalReport> {
    let mut buf = Vec::new();
    let summary = write(host_id, symbols, slots, format, &mut buf)?;
    let text = String::from_utf8(buf).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    Ok(LocalReport { text, summary })
}

/// Render `slots` directly into `out`
pub fn write<W: Write + ?Sized>(
    host_id: u32,
    symbols: &SymbolTable,
    slots: &[Vec<Record>],
    format: ReportFormat,
    out: &mut W,
) -> Result<BuildSummary> {
    let mut summary = BuildSummary {
        records: slots.iter().map(Vec::len).sum(),
        ..BuildSummary::default()
    };

    match format {
        ReportFormat::Tabular => write_tabular(host_id, symbols, slots, out, &mut summary)?,
        ReportFormat::Structured => write_structured(host_id, symbols, slots, out, &mut summary)?,
        ReportFormat::Records => write_records(host_id, symbols, slots, out, &mut summary)?,
    }

    log::debug!(
        "host {}: rendered {} report ({} records, {} rows, {} skipped)",
        host_id,
        format,
        summary.records,
        summary.rows,
        summary.skipped
    );
    Ok(summary)
}

fn name(symbols: &SymbolTable, symbol: Symbol) -> Arc<str> {
    symbols
        .resolve(symbol)
        .unwrap_or_else(|| Arc::from(symbol.to_string()))
}

/// Accumulated integer row for one key
struct KeyRow {
    kind: StatKind,
    sum: i64,
    threads: Vec<i64>,
    contributors: usize,
    last_slot: Option<usize>,
}

impl KeyRow {
    fn new(kind: StatKind, columns: usize) -> Self {
        Self {
            kind,
            sum: 0,
            threads: vec![0; columns],
            contributors: 0,
            last_slot: None,
        }
    }

    /// Returns false if either sum wrapped
    fn add(&mut self, tid: usize, value: i64) -> bool {
        if self.last_slot != Some(tid) {
            self.last_slot = Some(tid);
            self.contributors += 1;
        }

        let (sum, sum_wrapped) = self.sum.overflowing_add(value);
        let (cell, cell_wrapped) = self.threads[tid].overflowing_add(value);
        self.sum = sum;
        self.threads[tid] = cell;
        !(sum_wrapped || cell_wrapped)
    }
}

fn write_tabular<W: Write + ?Sized>(
    host_id: u32,
    symbols: &SymbolTable,
    slots: &[Vec<Record>],
    out: &mut W,
    summary: &mut BuildSummary,
) -> Result<()> {
    let max_thread = slots.iter().rposition(|s| !s.is_empty()).unwrap_or(0);
    summary.max_thread = max_thread;

    let mut rows: FxHashMap<AggregationKey, KeyRow> = FxHashMap::default();
    for (tid, records) in slots.iter().enumerate() {
        for record in records {
            let kind = record.value.kind();
            let row = rows
                .entry(record.key())
                .or_insert_with(|| KeyRow::new(kind, max_thread + 1));

            if row.kind != kind {
                summary.skipped += 1;
                continue;
            }

            let StatValue::Int(value) = record.value else {
                continue;
            };

            if !row.add(tid, value) && !summary.overflowed {
                summary.overflowed = true;
                log::warn!(
                    "host {}: integer sum for {}/{}/{} overflowed and wrapped",
                    host_id,
                    name(symbols, record.loop_name),
                    record.instance,
                    name(symbols, record.category)
                );
            }
        }
    }

    if summary.skipped > 0 {
        log::warn!(
            "host {}: skipped {} records whose kind differs from their key's first value",
            host_id,
            summary.skipped
        );
    }

    write!(out, "STATTYPE,HOST,LOOP,INSTANCE,CATEGORY,N,SUM")?;
    for tid in 0..=max_thread {
        write!(out, ",T{}", tid)?;
    }
    writeln!(out)?;

    let mut keys: Vec<AggregationKey> = rows
        .iter()
        .filter(|(_, row)| row.kind == StatKind::Int)
        .map(|(key, _)| *key)
        .collect();
    keys.sort_unstable();

    for key in keys {
        let Some(row) = rows.get(&key) else {
            continue;
        };
        write!(
            out,
            "{},{},{},{},{},{},{}",
            STAT_TYPE,
            host_id,
            name(symbols, key.loop_name),
            key.instance,
            name(symbols, key.category),
            row.contributors,
            row.sum
        )?;
        for value in &row.threads {
            write!(out, ",{}", value)?;
        }
        writeln!(out)?;
        summary.rows += 1;
    }

    Ok(())
}

#[derive(Serialize)]
struct StructuredRow<'a> {
    #[serde(rename = "HOST")]
    host: u32,
    #[serde(rename = "LOOP")]
    loop_name: &'a str,
    #[serde(rename = "INSTANCE")]
    instance: u32,
    #[serde(rename = "CATEGORY")]
    category: &'a str,
    #[serde(rename = "THREAD")]
    thread: usize,
    #[serde(rename = "VALUE")]
    value: &'a StatValue,
}

fn write_structured<W: Write + ?Sized>(
    host_id: u32,
    symbols: &SymbolTable,
    slots: &[Vec<Record>],
    out: &mut W,
    summary: &mut BuildSummary,
) -> Result<()> {
    writeln!(out, "[")?;
    for (tid, records) in slots.iter().enumerate() {
        for record in records {
            let loop_name = name(symbols, record.loop_name);
            let category = name(symbols, record.category);
            let row = StructuredRow {
                host: host_id,
                loop_name: &loop_name,
                instance: record.instance,
                category: &category,
                thread: tid,
                value: &record.value,
            };
            if summary.rows > 0 {
                writeln!(out, ",")?;
            }
            serde_json::to_writer(&mut *out, &row)?;
            summary.rows += 1;
        }
    }
    if summary.rows > 0 {
        writeln!(out)?;
    }
    writeln!(out, "]")?;
    Ok(())
}

fn write_records<W: Write + ?Sized>(
    host_id: u32,
    symbols: &SymbolTable,
    slots: &[Vec<Record>],
    out: &mut W,
    summary: &mut BuildSummary,
) -> Result<()> {
    writeln!(out, "HOST,LOOP,INSTANCE,CATEGORY,THREAD,VAL")?;
    for (tid, records) in slots.iter().enumerate() {
        for record in records {
            writeln!(
                out,
                "{},{},{},{},{},{}",
                host_id,
                name(symbols, record.loop_name),
                record.instance,
                name(symbols, record.category),
                tid,
                record.value
            )?;
            summary.rows += 1;
        }
    }
    Ok(())
}
