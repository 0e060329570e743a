//! Records - typed observations and their grouping key

use std::fmt;

use loopstat_util::Symbol;
use serde::{Deserialize, Serialize};

/// Kind of a recorded value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    Int,
    Float,
    Text,
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatKind::Int => "int",
            StatKind::Float => "float",
            StatKind::Text => "text",
        };
        f.write_str(name)
    }
}

/// A recorded value
///
/// The kind a caller records is preserved: an `Int` is never widened to a
/// `Float` or the other way round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl StatValue {
    /// Kind of this value
    pub fn kind(&self) -> StatKind {
        match self {
            StatValue::Int(_) => StatKind::Int,
            StatValue::Float(_) => StatKind::Float,
            StatValue::Text(_) => StatKind::Text,
        }
    }

    /// Integer payload, if this is an `Int`
    pub fn as_int(&self) -> Option<i64> {
        match self {
            StatValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Int(v) => write!(f, "{}", v),
            StatValue::Float(v) => write!(f, "{}", v),
            StatValue::Text(v) => f.write_str(v),
        }
    }
}

impl From<i64> for StatValue {
    fn from(v: i64) -> Self {
        StatValue::Int(v)
    }
}

impl From<i32> for StatValue {
    fn from(v: i32) -> Self {
        StatValue::Int(i64::from(v))
    }
}

impl From<u32> for StatValue {
    fn from(v: u32) -> Self {
        StatValue::Int(i64::from(v))
    }
}

impl From<f64> for StatValue {
    fn from(v: f64) -> Self {
        StatValue::Float(v)
    }
}

impl From<f32> for StatValue {
    fn from(v: f32) -> Self {
        StatValue::Float(f64::from(v))
    }
}

impl From<String> for StatValue {
    fn from(v: String) -> Self {
        StatValue::Text(v)
    }
}

impl From<&str> for StatValue {
    fn from(v: &str) -> Self {
        StatValue::Text(v.to_owned())
    }
}

/// One observation, appended to exactly one thread slot
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub loop_name: Symbol,
    pub category: Symbol,
    pub instance: u32,
    pub value: StatValue,
}

impl Record {
    /// Grouping key of this record
    #[inline]
    pub fn key(&self) -> AggregationKey {
        AggregationKey {
            loop_name: self.loop_name,
            instance: self.instance,
            category: self.category,
        }
    }
}

/// Records with equal keys are the same statistic
///
/// Field order gives the report row order: loop, then instance, then
/// category, each by handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AggregationKey {
    pub loop_name: Symbol,
    pub instance: u32,
    pub category: Symbol,
}
