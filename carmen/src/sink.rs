use crate::pipeline::{Conversion, ConversionStats};
use crate::types::{ConvertError, Record, SinkError};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info};

/// Encoding of every payload handed to a sink.
pub const PAYLOAD_ENCODING: &str = "msgpack";

/// Channel metadata, announced to the sink before its first record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelInfo {
    pub name: String,
    pub type_name: &'static str,
    pub encoding: &'static str,
}

impl ChannelInfo {
    pub fn for_record(record: &Record) -> Self {
        Self {
            name: record.channel.clone(),
            type_name: record.payload.kind().type_name(),
            encoding: PAYLOAD_ENCODING,
        }
    }
}

/// Destination for converted records, grouped by channel.
pub trait RecordSink {
    /// Called once per channel, before the first write to it.
    fn create_channel(&mut self, channel: &ChannelInfo) -> Result<(), SinkError>;

    fn write(&mut self, channel: &str, payload: &[u8], log_time_ns: i64) -> Result<(), SinkError>;

    /// Called after the last record; flush and close here.
    fn finish(&mut self, stats: &ConversionStats) -> Result<(), SinkError>;
}

/// Drives `conversion` to the end, writing every record to `sink`.
///
/// Payloads are MessagePack-encoded and timestamped with the logger receipt
/// time. A reader failure or sink error stops the run.
pub async fn write_records<S>(conversion: &mut Conversion, sink: &mut S) -> Result<ConversionStats, ConvertError>
where
    S: RecordSink + ?Sized,
{
    let mut announced: HashSet<String> = HashSet::new();

    while let Some(record) = conversion.next_record().await {
        let record = record?;

        if !announced.contains(&record.channel) {
            let info = ChannelInfo::for_record(&record);
            debug!("Creating channel {} ({})", info.name, info.type_name);
            sink.create_channel(&info)?;
            announced.insert(info.name);
        }

        let payload = record.payload.to_msgpack().map_err(SinkError::from)?;
        sink.write(&record.channel, &payload, record.envelope.logger_time_ns())?;
    }

    let stats = conversion.stats();
    sink.finish(&stats)?;
    info!(
        "Wrote {} records on {} channels ({} lines skipped)",
        stats.records,
        announced.len(),
        stats.skipped
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Odometry;
    use crate::parsers::default_registry;
    use crate::pipeline::{convert, ConvertOptions};
    use std::io::Write;
    use std::sync::Arc;

    #[derive(Default)]
    struct MemorySink {
        channels: Vec<ChannelInfo>,
        writes: Vec<(String, Vec<u8>, i64)>,
        finished: Option<ConversionStats>,
    }

    impl RecordSink for MemorySink {
        fn create_channel(&mut self, channel: &ChannelInfo) -> Result<(), SinkError> {
            self.channels.push(channel.clone());
            Ok(())
        }

        fn write(&mut self, channel: &str, payload: &[u8], log_time_ns: i64) -> Result<(), SinkError> {
            self.writes.push((channel.to_string(), payload.to_vec(), log_time_ns));
            Ok(())
        }

        fn finish(&mut self, stats: &ConversionStats) -> Result<(), SinkError> {
            self.finished = Some(*stats);
            Ok(())
        }
    }

    struct FailingSink;

    impl RecordSink for FailingSink {
        fn create_channel(&mut self, _channel: &ChannelInfo) -> Result<(), SinkError> {
            Ok(())
        }

        fn write(&mut self, _channel: &str, _payload: &[u8], _log_time_ns: i64) -> Result<(), SinkError> {
            Err("disk full".into())
        }

        fn finish(&mut self, _stats: &ConversionStats) -> Result<(), SinkError> {
            Ok(())
        }
    }

    fn log_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_channels_announced_once() {
        let file = log_file(
            "ODOM 0 0 0 0 0 0 10.0 nbot 10.25\n\
             SYNC a 10.5 nbot 10.5\n\
             ODOM 1 0 0 0 0 0 11.0 nbot 11.25\n\
             ODOM 2 0 0 0 0 0 12.0 nbot 12.25\n",
        );
        let registry = Arc::new(default_registry().unwrap());
        let mut conversion = convert(file.path(), &ConvertOptions::default(), registry).unwrap();

        let mut sink = MemorySink::default();
        let stats = write_records(&mut conversion, &mut sink).await.unwrap();

        assert_eq!(stats.records, 4);
        assert_eq!(sink.finished, Some(stats));
        assert_eq!(
            sink.channels,
            vec![
                ChannelInfo {
                    name: "/odom".to_string(),
                    type_name: "nav_msgs/msg/Odometry",
                    encoding: PAYLOAD_ENCODING,
                },
                ChannelInfo {
                    name: "/sync".to_string(),
                    type_name: "std_msgs/msg/String",
                    encoding: PAYLOAD_ENCODING,
                },
            ]
        );

        let (channel, payload, log_time_ns) = &sink.writes[2];
        assert_eq!(channel, "/odom");
        assert_eq!(*log_time_ns, 11_250_000_000);
        let odom: Odometry = rmp_serde::from_slice(payload).unwrap();
        assert_eq!(odom.pose.x, 1.0);
    }

    #[tokio::test]
    async fn test_sink_error_is_fatal() {
        let file = log_file("SYNC a 1.0 nbot 1.0\nSYNC b 2.0 nbot 2.0\n");
        let registry = Arc::new(default_registry().unwrap());
        let mut conversion = convert(file.path(), &ConvertOptions::default(), registry).unwrap();

        let err = write_records(&mut conversion, &mut FailingSink).await.unwrap_err();
        assert!(matches!(err, ConvertError::Sink(SinkError::Backend(ref msg)) if msg == "disk full"));
    }
}
