use crate::base_parser::Fields;
use crate::registry_parser::ParserRegistry;
use crate::types::{DispatchError, Envelope, Record};
use std::sync::Arc;
use tracing::trace;

/// Routes a raw line to the parser registered for its tag.
///
/// Line layout: `<tag> <fields>* <origin timestamp> <origin host> <logger timestamp>`.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ParserRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ParserRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &ParserRegistry {
        &self.registry
    }

    pub fn dispatch(&self, line: &str) -> Result<Record, DispatchError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let (tag, args) = tokens.split_first().ok_or(DispatchError::EmptyLine)?;

        let registration = self.registry.lookup(tag)?;
        let (body, envelope) = split_envelope(args)?;

        let parser = registration.parser();
        let mut fields = Fields::new(body);
        let payload = parser
            .parse(&mut fields, &envelope)
            .and_then(|payload| fields.finish().map(|()| payload))
            .map_err(|source| DispatchError::FieldDecode {
                tag: tag.to_string(),
                source,
            })?;

        trace!(
            "Parsed {} as {} with '{}' ({} fields)",
            registration.tag(),
            parser.kind().type_name(),
            parser.name(),
            body.len()
        );

        Ok(Record {
            tag: registration.tag().to_string(),
            channel: registration.channel().to_string(),
            envelope,
            payload,
        })
    }
}

/// Splits the trailing envelope off the argument list.
pub fn split_envelope<'a>(args: &'a [&'a str]) -> Result<(&'a [&'a str], Envelope), DispatchError> {
    let [body @ .., origin_timestamp, origin_host, logger_timestamp] = args else {
        return Err(DispatchError::MalformedEnvelope {
            reason: format!("expected 3 trailing fields, found {}", args.len()),
        });
    };

    let envelope = Envelope {
        origin_timestamp: parse_timestamp("origin timestamp", origin_timestamp)?,
        origin_host: origin_host.to_string(),
        logger_timestamp: parse_timestamp("logger timestamp", logger_timestamp)?,
    };
    Ok((body, envelope))
}

/// Largest timestamp, in seconds, whose nanosecond value fits an `i64`.
const MAX_TIMESTAMP_SECONDS: f64 = 9_223_372_036.0;

fn parse_timestamp(name: &str, value: &str) -> Result<f64, DispatchError> {
    match value.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds.abs() <= MAX_TIMESTAMP_SECONDS => Ok(seconds),
        Ok(seconds) if seconds.is_finite() => Err(DispatchError::MalformedEnvelope {
            reason: format!("{} out of range: {}", name, value),
        }),
        _ => Err(DispatchError::MalformedEnvelope {
            reason: format!("{} is not a number: {:?}", name, value),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_parser::MessageParser;
    use crate::messages::{MessageKind, Param, Payload};
    use crate::types::FieldDecodeError;

    /// Hands back the tokens it was given.
    struct Echo;

    impl MessageParser for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }

        fn kind(&self) -> MessageKind {
            MessageKind::Param
        }

        fn parse(&self, fields: &mut Fields<'_>, _envelope: &Envelope) -> Result<Payload, FieldDecodeError> {
            Ok(Payload::Param(Param {
                name: "echo".to_string(),
                value: fields.rest().join("|"),
            }))
        }
    }

    /// Reads a single number and leaves the rest for the trailing-token check.
    struct One;

    impl MessageParser for One {
        fn name(&self) -> &'static str {
            "one"
        }

        fn kind(&self) -> MessageKind {
            MessageKind::Param
        }

        fn parse(&self, fields: &mut Fields<'_>, _envelope: &Envelope) -> Result<Payload, FieldDecodeError> {
            let value: f64 = fields.f64("value")?;
            Ok(Payload::Param(Param {
                name: "one".to_string(),
                value: value.to_string(),
            }))
        }
    }

    fn dispatcher() -> Dispatcher {
        let mut registry = ParserRegistry::new();
        registry.register("ECHO", Arc::new(Echo)).unwrap();
        registry.register("ONE", Arc::new(One)).unwrap();
        Dispatcher::new(Arc::new(registry))
    }

    fn echoed(record: &Record) -> &str {
        match &record.payload {
            Payload::Param(param) => &param.value,
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_envelope_and_tokens_recovered() {
        let record = dispatcher()
            .dispatch("ECHO a1 a2 a3 1288.125 robot-host 1288.5")
            .unwrap();

        assert_eq!(record.tag, "ECHO");
        assert_eq!(record.channel, "/echo");
        assert_eq!(echoed(&record), "a1|a2|a3");
        assert_eq!(
            record.envelope,
            Envelope {
                origin_timestamp: 1288.125,
                origin_host: "robot-host".to_string(),
                logger_timestamp: 1288.5,
            }
        );
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let record = dispatcher().dispatch("  ECHO\ta1   a2  1.0 host 2.0 \r").unwrap();
        assert_eq!(echoed(&record), "a1|a2");
        assert_eq!(record.envelope.origin_host, "host");
    }

    #[test]
    fn test_no_fields_before_envelope() {
        let record = dispatcher().dispatch("ECHO 1.0 host 2.0").unwrap();
        assert_eq!(echoed(&record), "");
    }

    #[test]
    fn test_unknown_tag() {
        let err = dispatcher().dispatch("FLASER 1 2 3 1.0 host 2.0").unwrap_err();
        assert_eq!(
            err,
            DispatchError::UnknownTag {
                tag: "FLASER".to_string()
            }
        );
    }

    #[test]
    fn test_short_line_is_malformed_envelope() {
        let err = dispatcher().dispatch("ECHO 1.0 host").unwrap_err();
        assert!(matches!(err, DispatchError::MalformedEnvelope { .. }));
    }

    #[test]
    fn test_non_numeric_timestamp() {
        let err = dispatcher().dispatch("ECHO a 1.0 host later").unwrap_err();
        assert!(matches!(err, DispatchError::MalformedEnvelope { ref reason } if reason.contains("logger")));

        let err = dispatcher().dispatch("ECHO a nan host 1.0").unwrap_err();
        assert!(matches!(err, DispatchError::MalformedEnvelope { ref reason } if reason.contains("origin")));
    }

    #[test]
    fn test_out_of_range_timestamp() {
        let err = dispatcher().dispatch("ECHO a 1e300 host 1.0").unwrap_err();
        assert!(matches!(err, DispatchError::MalformedEnvelope { ref reason } if reason.contains("out of range")));

        let err = dispatcher().dispatch("ECHO a 1.0 host -1e10").unwrap_err();
        assert!(matches!(err, DispatchError::MalformedEnvelope { ref reason } if reason.contains("logger")));

        let record = dispatcher().dispatch("ECHO a 1.0 host 9000000000").unwrap();
        assert_eq!(record.envelope.logger_time_ns(), 9_000_000_000_000_000_000);
    }

    #[test]
    fn test_leftover_tokens_rejected() {
        let err = dispatcher().dispatch("ONE 4.0 5.0 1.0 host 2.0").unwrap_err();
        assert_eq!(
            err,
            DispatchError::FieldDecode {
                tag: "ONE".to_string(),
                source: FieldDecodeError::TrailingTokens { count: 1 },
            }
        );
    }

    #[test]
    fn test_empty_line() {
        assert_eq!(dispatcher().dispatch("   ").unwrap_err(), DispatchError::EmptyLine);
    }
}
