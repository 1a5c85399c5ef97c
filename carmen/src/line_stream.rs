use crate::line_source::{LineSource, SourceEvent, WorkerLiveness};
use crate::types::{ConvertError, RawLine};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::debug;

/// Pull-based async view over a [`LineSource`].
///
/// Waiting for a line suspends only the calling task. Dropping the stream
/// closes the channel, which stops the reader thread at its next send.
#[derive(Debug)]
pub struct LineStream {
    events: mpsc::Receiver<SourceEvent>,
    liveness: WorkerLiveness,
    poll_interval: Option<Duration>,
    finished: bool,
}

impl LineStream {
    /// With a `poll_interval`, each wait wakes up at that cadence to log an
    /// idle source; without one, waits are purely event-driven.
    pub fn new(source: LineSource, poll_interval: Option<Duration>) -> Self {
        debug!("Streaming lines from {}", source.path().display());
        let (events, liveness) = source.into_parts();
        Self {
            events,
            liveness,
            poll_interval,
            finished: false,
        }
    }

    pub fn liveness(&self) -> WorkerLiveness {
        self.liveness.clone()
    }

    /// Next line in file order.
    ///
    /// `None` once the source has reported end of file; the end-of-file
    /// marker is queued behind every line, so the channel is drained by then.
    /// A read failure or a reader that vanished without the marker is
    /// returned once as `SourceWorkerCrash`.
    pub async fn next_line(&mut self) -> Option<Result<RawLine, ConvertError>> {
        if self.finished {
            return None;
        }

        let event = match self.poll_interval {
            None => self.events.recv().await,
            Some(interval) => loop {
                match timeout(interval, self.events.recv()).await {
                    Ok(event) => break event,
                    Err(_) => debug!(
                        "No line within {:?} (reader alive: {})",
                        interval,
                        self.liveness.is_alive()
                    ),
                }
            },
        };

        match event {
            Some(SourceEvent::Line(line)) => Some(Ok(line)),
            Some(SourceEvent::Eof { lines }) => {
                debug!("Line stream finished after {} lines", lines);
                self.finish();
                None
            }
            Some(SourceEvent::Failed { line, error }) => {
                self.finish();
                Some(Err(ConvertError::SourceWorkerCrash {
                    reason: format!("read error at line {}: {}", line, error),
                }))
            }
            None => {
                self.finish();
                Some(Err(ConvertError::SourceWorkerCrash {
                    reason: "reader exited before end of file".to_string(),
                }))
            }
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        self.events.close();
    }
}

impl Drop for LineStream {
    fn drop(&mut self) {
        if !self.finished && self.liveness.is_alive() {
            debug!("Line stream dropped mid-file, stopping reader");
        }
        self.events.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, BufRead, Cursor, Read};
    use std::path::PathBuf;

    fn stream(data: &str, poll_interval: Option<Duration>) -> LineStream {
        let reader = Cursor::new(data.as_bytes().to_vec());
        let source = LineSource::spawn_reader(PathBuf::from("mem"), reader, 2).unwrap();
        LineStream::new(source, poll_interval)
    }

    async fn collect(mut lines: LineStream) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(line) = lines.next_line().await {
            out.push(line.unwrap().text);
        }
        out
    }

    #[tokio::test]
    async fn test_all_lines_in_order() {
        let data: String = (0..100).map(|i| format!("L{}\n", i)).collect();
        let lines = collect(stream(&data, None)).await;
        assert_eq!(lines.len(), 100);
        assert_eq!(lines[0], "L0");
        assert_eq!(lines[99], "L99");
    }

    #[tokio::test]
    async fn test_poll_interval_does_not_change_output() {
        let data: String = (0..50).map(|i| format!("L{}\n", i)).collect();
        let polled = collect(stream(&data, Some(Duration::from_millis(1)))).await;
        let evented = collect(stream(&data, None)).await;
        assert_eq!(polled, evented);
    }

    #[tokio::test]
    async fn test_end_of_stream_is_sticky() {
        let mut lines = stream("only\n", None);
        assert_eq!(lines.next_line().await.unwrap().unwrap().text, "only");
        assert!(lines.next_line().await.is_none());
        assert!(lines.next_line().await.is_none());
    }

    /// Yields one line, then panics inside the reader thread.
    struct Exploding(Cursor<Vec<u8>>);

    impl Read for Exploding {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.0.read(buf)
        }
    }

    impl BufRead for Exploding {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            if self.0.position() as usize >= self.0.get_ref().len() {
                panic!("disk vanished");
            }
            self.0.fill_buf()
        }

        fn consume(&mut self, amt: usize) {
            self.0.consume(amt)
        }
    }

    #[tokio::test]
    async fn test_reader_panic_is_a_crash() {
        let reader = Exploding(Cursor::new(b"first\n".to_vec()));
        let source = LineSource::spawn_reader(PathBuf::from("mem"), reader, 4).unwrap();
        let mut lines = LineStream::new(source, None);

        assert_eq!(lines.next_line().await.unwrap().unwrap().text, "first");
        let err = lines.next_line().await.unwrap().unwrap_err();
        assert!(matches!(err, ConvertError::SourceWorkerCrash { .. }));
        assert!(lines.next_line().await.is_none());
    }
}
