use crate::types::{ConvertError, RawLine};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Lines buffered between the reader thread and the consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// What the reader thread pushes through the hand-off channel.
#[derive(Debug)]
pub enum SourceEvent {
    Line(RawLine),
    /// Sent once after the last line; nothing follows it.
    Eof { lines: u64 },
    Failed { line: u64, error: io::Error },
}

/// Reports whether the reader thread is still running.
#[derive(Debug, Clone)]
pub struct WorkerLiveness(Arc<AtomicBool>);

impl WorkerLiveness {
    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Clears the liveness flag however the thread exits, panics included.
struct AliveGuard(Arc<AtomicBool>);

impl Drop for AliveGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A file being read line by line on its own OS thread.
///
/// The thread blocks when the bounded channel is full and stops at its next
/// send once the receiving side is closed or dropped.
#[derive(Debug)]
pub struct LineSource {
    path: PathBuf,
    events: mpsc::Receiver<SourceEvent>,
    liveness: WorkerLiveness,
}

impl LineSource {
    /// Opens `path` and starts the reader thread. Open failures are returned
    /// here, before any thread exists.
    pub fn spawn(path: impl AsRef<Path>, capacity: usize) -> Result<Self, ConvertError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| ConvertError::SourceOpen {
            path: path.clone(),
            source,
        })?;

        info!("Reading {} (channel capacity {})", path.display(), capacity);
        Self::spawn_reader(path, BufReader::new(file), capacity)
    }

    pub(crate) fn spawn_reader<R>(path: PathBuf, reader: R, capacity: usize) -> Result<Self, ConvertError>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, events) = mpsc::channel(capacity.max(1));
        let alive = Arc::new(AtomicBool::new(true));
        let guard = AliveGuard(Arc::clone(&alive));

        thread::Builder::new()
            .name("carmen-line-source".to_string())
            .spawn(move || {
                let _guard = guard;
                read_lines(reader, &tx);
            })
            .map_err(|e| ConvertError::SourceWorkerCrash {
                reason: format!("cannot start reader thread: {}", e),
            })?;

        Ok(Self {
            path,
            events,
            liveness: WorkerLiveness(alive),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn liveness(&self) -> WorkerLiveness {
        self.liveness.clone()
    }

    pub(crate) fn into_parts(self) -> (mpsc::Receiver<SourceEvent>, WorkerLiveness) {
        (self.events, self.liveness)
    }
}

fn read_lines<R: BufRead>(mut reader: R, tx: &mpsc::Sender<SourceEvent>) {
    let mut number = 0u64;
    let mut buf = String::new();

    loop {
        buf.clear();
        match reader.read_line(&mut buf) {
            Ok(0) => {
                debug!("Line source reached end of file after {} lines", number);
                let _ = tx.blocking_send(SourceEvent::Eof { lines: number });
                return;
            }
            Ok(_) => {
                number += 1;
                let text = buf.trim_end_matches(&['\n', '\r'][..]).to_string();
                if tx.blocking_send(SourceEvent::Line(RawLine { number, text })).is_err() {
                    debug!("Consumer gone, line source stopping at line {}", number);
                    return;
                }
            }
            Err(error) => {
                warn!("Read failed at line {}: {}", number + 1, error);
                let _ = tx.blocking_send(SourceEvent::Failed {
                    line: number + 1,
                    error,
                });
                return;
            }
        }
    }
}
