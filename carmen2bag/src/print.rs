use crate::models::PrintedMessage;
use carmen::{ns_to_datetime, ChannelInfo, ConversionStats, RecordSink, SinkError};
use std::collections::HashMap;
use std::io::Write;

/// Writes one JSON object per record, payload decoded back from MessagePack.
pub struct PrintSink<W: Write> {
    out: W,
    types: HashMap<String, &'static str>,
}

impl<W: Write> PrintSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            types: HashMap::new(),
        }
    }
}

impl<W: Write> RecordSink for PrintSink<W> {
    fn create_channel(&mut self, channel: &ChannelInfo) -> Result<(), SinkError> {
        self.types.insert(channel.name.clone(), channel.type_name);
        Ok(())
    }

    fn write(&mut self, channel: &str, payload: &[u8], log_time_ns: i64) -> Result<(), SinkError> {
        let payload: serde_json::Value =
            rmp_serde::from_slice(payload).map_err(|e| SinkError::Backend(e.to_string()))?;
        let message = PrintedMessage {
            channel,
            type_name: self.types.get(channel).copied().unwrap_or("unknown"),
            log_time_ns,
            log_time: ns_to_datetime(log_time_ns),
            payload,
        };

        serde_json::to_writer(&mut self.out, &message).map_err(|e| SinkError::Backend(e.to_string()))?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn finish(&mut self, _stats: &ConversionStats) -> Result<(), SinkError> {
        self.out.flush()?;
        Ok(())
    }
}
