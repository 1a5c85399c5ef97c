// Parser crate for CARMEN robot log files
// Registry-based dispatch per message tag, fed by a threaded line reader

pub mod types;
pub mod messages;
pub mod base_parser;
pub mod registry_parser;
pub mod dispatcher;
pub mod parsers;

// Individual parser implementations
pub mod param_parser;
pub mod odometry_parser;
pub mod laser_parser;
pub mod gps_parser;

// Streaming pipeline
pub mod line_source;
pub mod line_stream;
pub mod pipeline;
pub mod sink;

// Re-export main types
pub use types::*;
pub use messages::*;
pub use base_parser::{is_comment, Fields, MessageParser};
pub use registry_parser::{channel_for_tag, ParserRegistry, Registration};
pub use dispatcher::Dispatcher;
pub use parsers::default_registry;
pub use line_source::{LineSource, SourceEvent, WorkerLiveness, DEFAULT_CHANNEL_CAPACITY};
pub use line_stream::LineStream;
pub use pipeline::{convert, Conversion, ConversionStats, ConvertOptions, SkippedLine, DEFAULT_MAX_RETAINED_SKIPPED};
pub use sink::{write_records, ChannelInfo, RecordSink, PAYLOAD_ENCODING};

// Re-export parsers
pub use param_parser::{ParamParser, SyncParser};
pub use odometry_parser::OdometryParser;
pub use laser_parser::{RawLaserParser, RobotLaserParser};
pub use gps_parser::{GgaParser, RmcParser};
