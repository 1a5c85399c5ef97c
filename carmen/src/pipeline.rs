use crate::base_parser::is_comment;
use crate::dispatcher::Dispatcher;
use crate::line_source::{LineSource, WorkerLiveness, DEFAULT_CHANNEL_CAPACITY};
use crate::line_stream::LineStream;
use crate::registry_parser::ParserRegistry;
use crate::types::{ConvertError, DispatchError, Record};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Rejected lines kept by [`Conversion::skipped`] unless configured otherwise.
pub const DEFAULT_MAX_RETAINED_SKIPPED: usize = 100;

/// Knobs for [`convert`]. None of them affects which records come out.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub channel_capacity: usize,
    pub poll_interval: Option<Duration>,
    /// Upper bound on the rejected lines kept in memory; later ones are only
    /// logged and counted.
    pub max_retained_skipped: usize,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            poll_interval: None,
            max_retained_skipped: DEFAULT_MAX_RETAINED_SKIPPED,
        }
    }
}

/// A line the dispatcher rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedLine {
    pub number: u64,
    pub text: String,
    pub error: DispatchError,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    pub lines: u64,
    pub comments: u64,
    pub blank: u64,
    pub records: u64,
    pub skipped: u64,
}

/// Starts converting the CARMEN log at `path`.
///
/// Fails immediately if the file cannot be opened. Each call reads the file
/// from the start with its own reader thread.
pub fn convert(
    path: impl AsRef<Path>,
    options: &ConvertOptions,
    registry: Arc<ParserRegistry>,
) -> Result<Conversion, ConvertError> {
    let path = path.as_ref();
    info!("Starting conversion of {} with {} registered tags", path.display(), registry.len());

    let source = LineSource::spawn(path, options.channel_capacity)?;
    Ok(Conversion {
        lines: LineStream::new(source, options.poll_interval),
        dispatcher: Dispatcher::new(registry),
        stats: ConversionStats::default(),
        skipped: Vec::new(),
        max_retained_skipped: options.max_retained_skipped,
    })
}

/// Lazy sequence of records from one log file.
///
/// Dropping it mid-file stops the reader thread.
#[derive(Debug)]
pub struct Conversion {
    lines: LineStream,
    dispatcher: Dispatcher,
    stats: ConversionStats,
    skipped: Vec<SkippedLine>,
    max_retained_skipped: usize,
}

impl Conversion {
    /// Next record in file order.
    ///
    /// Comments and blank lines are dropped silently. Lines the dispatcher
    /// rejects are logged, counted and passed over; the first
    /// `max_retained_skipped` of them are kept in [`Conversion::skipped`].
    /// An `Err` means the reader failed; the sequence ends after it.
    pub async fn next_record(&mut self) -> Option<Result<Record, ConvertError>> {
        loop {
            let line = match self.lines.next_line().await? {
                Ok(line) => line,
                Err(e) => {
                    error!("Conversion aborted after {} lines: {}", self.stats.lines, e);
                    return Some(Err(e));
                }
            };
            self.stats.lines += 1;

            if is_comment(&line.text) {
                self.stats.comments += 1;
                continue;
            }
            if line.text.trim().is_empty() {
                self.stats.blank += 1;
                continue;
            }

            match self.dispatcher.dispatch(&line.text) {
                Ok(record) => {
                    self.stats.records += 1;
                    return Some(Ok(record));
                }
                Err(error) => {
                    warn!("Skipping line {}: {} ({:?})", line.number, error, line.text);
                    self.stats.skipped += 1;
                    if self.skipped.len() < self.max_retained_skipped {
                        self.skipped.push(SkippedLine {
                            number: line.number,
                            text: line.text,
                            error,
                        });
                    } else if self.skipped.len() as u64 + 1 == self.stats.skipped {
                        debug!(
                            "Keeping only the first {} skipped lines, later ones are counted",
                            self.max_retained_skipped
                        );
                    }
                }
            }
        }
    }

    pub fn stats(&self) -> ConversionStats {
        self.stats
    }

    pub fn skipped(&self) -> &[SkippedLine] {
        &self.skipped
    }

    /// Rejected lines that were counted but not kept.
    pub fn skipped_truncated(&self) -> u64 {
        self.stats.skipped - self.skipped.len() as u64
    }

    pub fn liveness(&self) -> WorkerLiveness {
        self.lines.liveness()
    }
}
