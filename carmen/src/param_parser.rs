use crate::base_parser::{Fields, MessageParser};
use crate::messages::{MessageKind, Param, Payload, SyncMark};
use crate::types::{Envelope, FieldDecodeError};

/// `PARAM <name> <value...>`
///
/// Values are free text in CARMEN ini files, so every token after the name
/// belongs to the value (re-joined with single spaces, possibly empty).
pub struct ParamParser;

impl MessageParser for ParamParser {
    fn name(&self) -> &'static str {
        "param"
    }

    fn kind(&self) -> MessageKind {
        MessageKind::Param
    }

    fn parse(&self, fields: &mut Fields<'_>, _envelope: &Envelope) -> Result<Payload, FieldDecodeError> {
        let name = fields.next_str("param_name")?.to_string();
        let value = fields.rest().join(" ");
        Ok(Payload::Param(Param { name, value }))
    }
}

/// `SYNC <tagname>`
pub struct SyncParser;

impl MessageParser for SyncParser {
    fn name(&self) -> &'static str {
        "sync"
    }

    fn kind(&self) -> MessageKind {
        MessageKind::Sync
    }

    fn parse(&self, fields: &mut Fields<'_>, _envelope: &Envelope) -> Result<Payload, FieldDecodeError> {
        let tagname = fields.next_str("tagname")?.to_string();
        Ok(Payload::Sync(SyncMark { tagname }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope() -> Envelope {
        Envelope {
            origin_timestamp: 1.0,
            origin_host: "host".to_string(),
            logger_timestamp: 1.0,
        }
    }

    #[test]
    fn test_param_value_keeps_spaces() {
        let tokens = ["robot_frontlaser_dev", "/dev/ttyS0", "fast"];
        let payload = ParamParser.parse(&mut Fields::new(&tokens), &envelope()).unwrap();
        assert_eq!(
            payload,
            Payload::Param(Param {
                name: "robot_frontlaser_dev".to_string(),
                value: "/dev/ttyS0 fast".to_string(),
            })
        );
    }

    #[test]
    fn test_param_without_value() {
        let tokens = ["logger_ascii"];
        let payload = ParamParser.parse(&mut Fields::new(&tokens), &envelope()).unwrap();
        assert!(matches!(payload, Payload::Param(ref p) if p.value.is_empty()));
    }

    #[test]
    fn test_param_requires_name() {
        let tokens: [&str; 0] = [];
        let err = ParamParser.parse(&mut Fields::new(&tokens), &envelope()).unwrap_err();
        assert_eq!(err, FieldDecodeError::Missing { field: "param_name" });
    }

    #[test]
    fn test_sync() {
        let tokens = ["lap_2"];
        let payload = SyncParser.parse(&mut Fields::new(&tokens), &envelope()).unwrap();
        assert_eq!(
            payload,
            Payload::Sync(SyncMark {
                tagname: "lap_2".to_string()
            })
        );
    }
}
