use crate::base_parser::MessageParser;
use crate::types::{DispatchError, RegistryError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// A parser bound to one tag, with the channel its records are written to.
#[derive(Clone)]
pub struct Registration {
    tag: String,
    channel: String,
    parser: Arc<dyn MessageParser>,
}

impl Registration {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn parser(&self) -> &Arc<dyn MessageParser> {
        &self.parser
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("tag", &self.tag)
            .field("channel", &self.channel)
            .field("parser", &self.parser.name())
            .finish()
    }
}

/// ParserRegistry - maps message tags to parsers
///
/// Filled once at startup, then shared read-only (usually behind an `Arc`)
/// by every dispatcher. See `parsers.rs` for the built-in CARMEN set.
#[derive(Debug, Default)]
pub struct ParserRegistry {
    parsers: HashMap<String, Registration>,
}

impl ParserRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parser under `tag`, writing to the channel derived from the tag.
    pub fn register(
        &mut self,
        tag: impl Into<String>,
        parser: Arc<dyn MessageParser>,
    ) -> Result<(), RegistryError> {
        let tag = tag.into();
        let channel = channel_for_tag(&tag);
        self.register_with_channel(tag, channel, parser)
    }

    /// Register a parser under `tag` with an explicit channel name.
    pub fn register_with_channel(
        &mut self,
        tag: impl Into<String>,
        channel: impl Into<String>,
        parser: Arc<dyn MessageParser>,
    ) -> Result<(), RegistryError> {
        let tag = tag.into();
        if self.parsers.contains_key(&tag) {
            return Err(RegistryError::DuplicateTag(tag));
        }

        let channel = channel.into();
        debug!("Registering parser '{}' for tag {} on {}", parser.name(), tag, channel);
        self.parsers.insert(
            tag.clone(),
            Registration {
                tag,
                channel,
                parser,
            },
        );
        Ok(())
    }

    /// Share one parser between related tags (e.g. RAWLASER1..RAWLASER4).
    pub fn register_all(
        &mut self,
        tags: &[&str],
        parser: Arc<dyn MessageParser>,
    ) -> Result<(), RegistryError> {
        info!("Registering parser '{}' for {} tags", parser.name(), tags.len());
        for tag in tags {
            self.register(*tag, Arc::clone(&parser))?;
        }
        Ok(())
    }

    pub fn lookup(&self, tag: &str) -> Result<&Registration, DispatchError> {
        self.parsers.get(tag).ok_or_else(|| DispatchError::UnknownTag {
            tag: tag.to_string(),
        })
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.parsers.contains_key(tag)
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Registered tags, sorted
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

/// Default channel for a tag: `/` followed by the lowercased tag.
pub fn channel_for_tag(tag: &str) -> String {
    format!("/{}", tag.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_parser::Fields;
    use crate::messages::{MessageKind, Payload, SyncMark};
    use crate::types::{Envelope, FieldDecodeError};

    struct NamedSync;

    impl MessageParser for NamedSync {
        fn name(&self) -> &'static str {
            "named_sync"
        }

        fn kind(&self) -> MessageKind {
            MessageKind::Sync
        }

        fn parse(&self, fields: &mut Fields<'_>, _envelope: &Envelope) -> Result<Payload, FieldDecodeError> {
            Ok(Payload::Sync(SyncMark {
                tagname: fields.next_str("tagname")?.to_string(),
            }))
        }
    }

    #[test]
    fn test_register_and_lookup() {
        let mut registry = ParserRegistry::new();
        registry.register("SYNC", Arc::new(NamedSync)).unwrap();

        let registration = registry.lookup("SYNC").unwrap();
        assert_eq!(registration.tag(), "SYNC");
        assert_eq!(registration.channel(), "/sync");
        assert_eq!(registration.parser().name(), "named_sync");
    }

    #[test]
    fn test_duplicate_tag_rejected() {
        let mut registry = ParserRegistry::new();
        registry.register("SYNC", Arc::new(NamedSync)).unwrap();

        let err = registry.register("SYNC", Arc::new(NamedSync)).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTag(ref tag) if tag == "SYNC"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_shared_parser_under_two_tags() {
        let parser: Arc<dyn MessageParser> = Arc::new(NamedSync);
        let mut registry = ParserRegistry::new();
        registry.register_all(&["SYNC1", "SYNC2"], Arc::clone(&parser)).unwrap();

        let first = registry.lookup("SYNC1").unwrap();
        let second = registry.lookup("SYNC2").unwrap();
        assert!(Arc::ptr_eq(first.parser(), &parser));
        assert!(Arc::ptr_eq(second.parser(), &parser));
        assert_eq!(second.channel(), "/sync2");
        assert_eq!(registry.tags(), vec!["SYNC1", "SYNC2"]);
    }

    #[test]
    fn test_unknown_tag() {
        let registry = ParserRegistry::new();
        assert_eq!(
            registry.lookup("FLASER").unwrap_err(),
            DispatchError::UnknownTag {
                tag: "FLASER".to_string()
            }
        );
    }

    #[test]
    fn test_channel_override() {
        let mut registry = ParserRegistry::new();
        registry
            .register_with_channel("SYNC", "/markers/sync", Arc::new(NamedSync))
            .unwrap();
        assert_eq!(registry.lookup("SYNC").unwrap().channel(), "/markers/sync");
    }
}
