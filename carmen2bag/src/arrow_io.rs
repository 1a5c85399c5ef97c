use arrow::array::{ArrayRef, BinaryArray, Int64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

pub const CHUNK_SIZE: usize = 50_000;

/// Rows of one channel waiting to be written as a chunk.
pub struct ChannelBuilder {
    log_time_ns: Vec<i64>,
    payload: Vec<Vec<u8>>,
}

impl ChannelBuilder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            log_time_ns: Vec::with_capacity(capacity),
            payload: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, payload: &[u8], log_time_ns: i64) {
        self.log_time_ns.push(log_time_ns);
        self.payload.push(payload.to_vec());
    }

    pub fn len(&self) -> usize {
        self.log_time_ns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log_time_ns.is_empty()
    }

    pub fn clear(&mut self) {
        self.log_time_ns.clear();
        self.payload.clear();
    }

    pub fn build_batch(&self) -> Result<RecordBatch, arrow::error::ArrowError> {
        let schema = get_arrow_schema();

        let columns: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from(self.log_time_ns.clone())),
            Arc::new(BinaryArray::from_iter_values(self.payload.iter())),
        ];

        RecordBatch::try_new(schema, columns)
    }
}

pub fn get_arrow_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("log_time_ns", DataType::Int64, false),
        Field::new("payload", DataType::Binary, false),
    ]))
}

pub fn write_arrow_chunk(
    batch: &RecordBatch,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let file = File::create(path)?;
    let mut writer = StreamWriter::try_new(file, &batch.schema())?;
    writer.write(batch)?;
    writer.finish()?;
    Ok(())
}

/// Running totals for `metadata.json`.
pub struct MetaCollector {
    pub message_count: u64,
    pub t_min_ns: i64,
    pub t_max_ns: i64,
}

impl MetaCollector {
    pub fn new() -> Self {
        Self {
            message_count: 0,
            t_min_ns: i64::MAX,
            t_max_ns: i64::MIN,
        }
    }

    pub fn update(&mut self, log_time_ns: i64) {
        self.message_count += 1;
        self.t_min_ns = self.t_min_ns.min(log_time_ns);
        self.t_max_ns = self.t_max_ns.max(log_time_ns);
    }

    /// `(t_min_ns, t_max_ns)`, zeroed when nothing was written.
    pub fn time_range(&self) -> (i64, i64) {
        if self.message_count > 0 {
            (self.t_min_ns, self.t_max_ns)
        } else {
            (0, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::ipc::reader::StreamReader;

    #[test]
    fn test_chunk_round_trip_through_ipc() {
        let mut builder = ChannelBuilder::with_capacity(4);
        builder.push(b"\x81\xa1x\x01", 10);
        builder.push(b"", 20);
        assert_eq!(builder.len(), 2);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("000.arrow");
        write_arrow_chunk(&builder.build_batch().unwrap(), &path).unwrap();

        let reader = StreamReader::try_new(File::open(&path).unwrap(), None).unwrap();
        let batches: Vec<RecordBatch> = reader.collect::<Result<_, _>>().unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].num_rows(), 2);

        let payloads = batches[0]
            .column(1)
            .as_any()
            .downcast_ref::<BinaryArray>()
            .unwrap();
        assert_eq!(payloads.value(0), b"\x81\xa1x\x01");

        builder.clear();
        assert!(builder.is_empty());
    }

    #[test]
    fn test_meta_collector_range() {
        let mut meta = MetaCollector::new();
        assert_eq!(meta.time_range(), (0, 0));

        meta.update(30);
        meta.update(10);
        meta.update(20);
        assert_eq!(meta.message_count, 3);
        assert_eq!(meta.time_range(), (10, 30));
    }
}
