//! Report Module - Rendering and Gathering Statistics
//!
//! Reporting runs once, serially, after workers have quiesced:
//!
//! - [`local`] merges every thread slot of one host into text
//! - [`distributed`] ships each host's text to the sink (host 0), which
//!   emits the one consolidated report
//!
//! # Formats
//!
//! | Format | Granularity | Columns |
//! |--------|-------------|---------|
//! | `Tabular` | one row per key, integers only | `STATTYPE,HOST,LOOP,INSTANCE,CATEGORY,N,SUM,T0..` |
//! | `Structured` | one JSON object per record | `HOST,LOOP,INSTANCE,CATEGORY,THREAD,VALUE` |
//! | `Records` | one CSV row per record | `HOST,LOOP,INSTANCE,CATEGORY,THREAD,VAL` |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

pub mod distributed;
pub mod local;

pub use distributed::{
    DistributedReport, GatherSummary, HostRole, PendingReceives, ReportPhase, SINK_HOST,
};
pub use local::{BuildSummary, LocalReport};

/// Output encoding of a report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Grouped per-key integer sums with one column per thread slot
    #[default]
    #[serde(alias = "csv")]
    Tabular,

    /// JSON array, one object per raw record
    ///
    /// A consolidated distributed report is one such array per host,
    /// concatenated, so it is a stream of JSON documents rather than one
    /// document. Read it with a streaming parser such as
    /// `serde_json::Deserializer::into_iter`.
    #[serde(alias = "json")]
    Structured,

    /// Delimited rows, one per raw record
    #[serde(alias = "raw")]
    Records,
}

impl ReportFormat {
    /// All formats, in declaration order
    pub const ALL: [ReportFormat; 3] = [
        ReportFormat::Tabular,
        ReportFormat::Structured,
        ReportFormat::Records,
    ];

    /// Canonical lowercase name
    pub fn name(self) -> &'static str {
        match self {
            ReportFormat::Tabular => "tabular",
            ReportFormat::Structured => "structured",
            ReportFormat::Records => "records",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReportFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tabular" | "csv" => Ok(ReportFormat::Tabular),
            "structured" | "json" => Ok(ReportFormat::Structured),
            "records" | "raw" => Ok(ReportFormat::Records),
            other => Err(ConfigError::InvalidFormat(other.to_string())),
        }
    }
}
