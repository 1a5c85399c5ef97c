use crate::messages::Payload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One line as read from the log, numbered from 1 in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawLine {
    pub number: u64,
    pub text: String,
}

/// The three trailing fields every CARMEN line carries:
/// `<origin timestamp> <origin host> <logger timestamp>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub origin_timestamp: f64,
    pub origin_host: String,
    pub logger_timestamp: f64,
}

impl Envelope {
    pub fn origin_time_ns(&self) -> i64 {
        seconds_to_ns(self.origin_timestamp)
    }

    /// Receipt time at the logger; this is what sinks index records by.
    pub fn logger_time_ns(&self) -> i64 {
        seconds_to_ns(self.logger_timestamp)
    }

    pub fn logger_time(&self) -> Option<DateTime<Utc>> {
        ns_to_datetime(self.logger_time_ns())
    }
}

/// A fully decoded line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub tag: String,
    pub channel: String,
    pub envelope: Envelope,
    pub payload: Payload,
}

/// Saturates outside the `i64` range; the dispatcher rejects such envelopes.
pub fn seconds_to_ns(seconds: f64) -> i64 {
    (seconds * 1e9).round() as i64
}

pub fn ns_to_datetime(ns: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ns.div_euclid(1_000_000_000), ns.rem_euclid(1_000_000_000) as u32)
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("a parser is already registered for tag {0}")]
    DuplicateTag(String),
}

/// Failure decoding the kind-specific part of a line.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldDecodeError {
    #[error("missing field `{field}`")]
    Missing { field: &'static str },
    #[error("field `{field}`: expected a number, got {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("field `{field}`: expected a single character, got {value:?}")]
    InvalidChar { field: &'static str, value: String },
    #[error("field `{field}` declares {declared} values but only {remaining} tokens remain")]
    CountMismatch {
        field: &'static str,
        declared: usize,
        remaining: usize,
    },
    #[error("{count} unexpected trailing tokens")]
    TrailingTokens { count: usize },
}

/// Per-line failure. Never fatal to a conversion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    #[error("empty line")]
    EmptyLine,
    #[error("no parser registered for tag {tag}")]
    UnknownTag { tag: String },
    #[error("malformed envelope: {reason}")]
    MalformedEnvelope { reason: String },
    #[error("{tag}: {source}")]
    FieldDecode {
        tag: String,
        #[source]
        source: FieldDecodeError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("payload encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("{0}")]
    Backend(String),
}

impl From<String> for SinkError {
    fn from(msg: String) -> Self {
        SinkError::Backend(msg)
    }
}

impl From<&str> for SinkError {
    fn from(msg: &str) -> Self {
        SinkError::Backend(msg.to_string())
    }
}

/// Errors that end a conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("cannot open {}: {source}", path.display())]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line source failed: {reason}")]
    SourceWorkerCrash { reason: String },
    #[error("sink error: {0}")]
    Sink(#[from] SinkError),
}
