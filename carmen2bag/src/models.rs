use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Contents of `metadata.json` at the root of a bag directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BagMeta {
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub message_count: u64,
    pub t_min_ns: i64,
    pub t_max_ns: i64,
    pub source: SourceSummary,
    pub channels: Vec<ChannelMeta>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMeta {
    pub name: String,
    pub type_name: String,
    pub encoding: String,
    /// Directory holding the channel's chunks, relative to the bag root.
    pub directory: String,
    pub message_count: u64,
    pub chunk_count: usize,
}

/// Line accounting of the conversion that produced the bag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceSummary {
    pub lines: u64,
    pub comments: u64,
    pub blank: u64,
    pub skipped: u64,
}

impl From<&carmen::ConversionStats> for SourceSummary {
    fn from(stats: &carmen::ConversionStats) -> Self {
        Self {
            lines: stats.lines,
            comments: stats.comments,
            blank: stats.blank,
            skipped: stats.skipped,
        }
    }
}

/// One JSON line of print mode.
#[derive(Debug, Clone, Serialize)]
pub struct PrintedMessage<'a> {
    pub channel: &'a str,
    #[serde(rename = "type")]
    pub type_name: &'a str,
    pub log_time_ns: i64,
    pub log_time: Option<DateTime<Utc>>,
    pub payload: serde_json::Value,
}
