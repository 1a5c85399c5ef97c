use crate::arrow_io::{write_arrow_chunk, ChannelBuilder, MetaCollector};
use crate::models::{BagMeta, ChannelMeta, SourceSummary};
use anyhow::Context;
use carmen::{ChannelInfo, ConversionStats, RecordSink, SinkError};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A bag directory being written:
///
/// ```text
/// <root>/metadata.json
/// <root>/channels/<channel>/000.arrow
/// <root>/channels/<channel>/001.arrow
/// ```
pub struct BagStorage {
    base_path: PathBuf,
    chunk_size: usize,
    run_id: Uuid,
    channels: HashMap<String, ChannelState>,
    /// Channel names in announcement order
    order: Vec<String>,
    /// Channel directories already handed out
    directories: HashSet<String>,
    meta: MetaCollector,
    finished: bool,
}

struct ChannelState {
    info: ChannelInfo,
    directory: String,
    builder: ChannelBuilder,
    message_count: u64,
    chunk_count: usize,
}

impl BagStorage {
    pub fn create(base_path: impl AsRef<Path>, chunk_size: usize) -> std::io::Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(base_path.join("channels"))?;

        let run_id = Uuid::new_v4();
        info!("Writing bag {} to {}", run_id, base_path.display());

        Ok(Self {
            base_path,
            chunk_size: chunk_size.max(1),
            run_id,
            channels: HashMap::new(),
            order: Vec::new(),
            directories: HashSet::new(),
            meta: MetaCollector::new(),
            finished: false,
        })
    }

    pub fn chunk_path(&self, directory: &str, chunk_idx: usize) -> PathBuf {
        self.base_path
            .join(directory)
            .join(format!("{:03}.arrow", chunk_idx))
    }

    pub fn meta_path(&self) -> PathBuf {
        self.base_path.join("metadata.json")
    }

    /// `channels/<slug>`, suffixed with `_1`, `_2`, ... when another channel
    /// already maps to the same slug.
    fn unique_directory(&self, channel: &str) -> String {
        let slug = channel_dir_name(channel);
        let mut directory = format!("channels/{}", slug);
        let mut suffix = 1;
        while self.directories.contains(&directory) {
            directory = format!("channels/{}_{}", slug, suffix);
            suffix += 1;
        }
        if suffix > 1 {
            warn!("Channel {} collides with another channel, using {}", channel, directory);
        }
        directory
    }

    fn flush_channel(&mut self, name: &str) -> Result<(), SinkError> {
        let Some(state) = self.channels.get(name) else {
            return Ok(());
        };
        if state.builder.is_empty() {
            return Ok(());
        }

        let path = self.chunk_path(&state.directory, state.chunk_count);
        let batch = state
            .builder
            .build_batch()
            .map_err(|e| SinkError::Backend(e.to_string()))?;
        write_arrow_chunk(&batch, &path).map_err(|e| SinkError::Backend(e.to_string()))?;
        debug!("Wrote {} rows to {}", batch.num_rows(), path.display());

        if let Some(state) = self.channels.get_mut(name) {
            state.builder.clear();
            state.chunk_count += 1;
        }
        Ok(())
    }

    fn flush_all(&mut self) -> Result<(), SinkError> {
        for name in self.order.clone() {
            self.flush_channel(&name)?;
        }
        Ok(())
    }

    fn write_meta(&self, stats: &ConversionStats) -> Result<BagMeta, SinkError> {
        let (t_min_ns, t_max_ns) = self.meta.time_range();
        let channels = self
            .order
            .iter()
            .filter_map(|name| self.channels.get(name))
            .map(|state| ChannelMeta {
                name: state.info.name.clone(),
                type_name: state.info.type_name.to_string(),
                encoding: state.info.encoding.to_string(),
                directory: state.directory.clone(),
                message_count: state.message_count,
                chunk_count: state.chunk_count,
            })
            .collect();

        let meta = BagMeta {
            run_id: self.run_id,
            created_at: Utc::now(),
            message_count: self.meta.message_count,
            t_min_ns,
            t_max_ns,
            source: SourceSummary::from(stats),
            channels,
        };

        let json = serde_json::to_string_pretty(&meta).map_err(|e| SinkError::Backend(e.to_string()))?;
        let mut file = fs::File::create(self.meta_path())?;
        file.write_all(json.as_bytes())?;
        Ok(meta)
    }
}

impl RecordSink for BagStorage {
    fn create_channel(&mut self, channel: &ChannelInfo) -> Result<(), SinkError> {
        if self.channels.contains_key(&channel.name) {
            return Ok(());
        }

        let directory = self.unique_directory(&channel.name);
        fs::create_dir_all(self.base_path.join(&directory))?;
        info!("Created channel {} ({}) in {}", channel.name, channel.type_name, directory);

        self.order.push(channel.name.clone());
        self.directories.insert(directory.clone());
        self.channels.insert(
            channel.name.clone(),
            ChannelState {
                info: channel.clone(),
                directory,
                builder: ChannelBuilder::with_capacity(self.chunk_size.min(4096)),
                message_count: 0,
                chunk_count: 0,
            },
        );
        Ok(())
    }

    fn write(&mut self, channel: &str, payload: &[u8], log_time_ns: i64) -> Result<(), SinkError> {
        let chunk_size = self.chunk_size;
        let state = self
            .channels
            .get_mut(channel)
            .ok_or_else(|| SinkError::Backend(format!("write to unannounced channel {}", channel)))?;

        state.builder.push(payload, log_time_ns);
        state.message_count += 1;
        let full = state.builder.len() >= chunk_size;
        self.meta.update(log_time_ns);

        if full {
            self.flush_channel(channel)?;
        }
        Ok(())
    }

    fn finish(&mut self, stats: &ConversionStats) -> Result<(), SinkError> {
        self.flush_all()?;
        let meta = self.write_meta(stats)?;
        self.finished = true;
        info!(
            "Bag {} complete: {} messages on {} channels",
            meta.run_id,
            meta.message_count,
            meta.channels.len()
        );
        Ok(())
    }
}

impl Drop for BagStorage {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // Conversion aborted: keep the rows already received.
        if let Err(e) = self.flush_all() {
            warn!("Failed to flush bag {} on drop: {}", self.run_id, e);
        }
    }
}

/// Directory name for a channel: `/rawlaser1` -> `rawlaser1`, `/a/b` -> `a_b`.
pub fn channel_dir_name(channel: &str) -> String {
    let name: String = channel
        .trim_start_matches('/')
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() {
        "_root".to_string()
    } else {
        name
    }
}

pub fn read_meta(base_path: impl AsRef<Path>) -> anyhow::Result<BagMeta> {
    let meta_path = base_path.as_ref().join("metadata.json");
    let json = fs::read_to_string(&meta_path)
        .with_context(|| format!("cannot read {}", meta_path.display()))?;
    let meta = serde_json::from_str(&json)?;
    Ok(meta)
}
