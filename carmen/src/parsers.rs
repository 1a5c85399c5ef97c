//! Central parser registration module
//!
//! Every built-in CARMEN parser is registered in [`default_registry`].
//! When adding a new message type:
//! 1. Create your parser file (e.g., truepos_parser.rs) implementing `MessageParser`
//! 2. Export it in lib.rs
//! 3. Add a `"TAG" => Parser` line to the list in `default_registry`

use crate::registry_parser::ParserRegistry;
use crate::types::RegistryError;
use crate::{
    GgaParser, OdometryParser, ParamParser, RawLaserParser, RmcParser, RobotLaserParser,
    SyncParser,
};
use tracing::info;

/// Builds a [`ParserRegistry`] from `tag => parser` pairs, failing on the
/// first duplicate tag.
///
/// Usage:
/// ```rust,ignore
/// let registry = register_parsers![
///     "ODOM" => OdometryParser,
///     "TRUEPOS" => TrueposParser,
/// ]?;
/// ```
#[macro_export]
macro_rules! register_parsers {
    ($($tag:expr => $parser:expr),* $(,)?) => {{
        let mut registry = $crate::ParserRegistry::new();
        let result: ::std::result::Result<(), $crate::RegistryError> = (|| {
            $(registry.register($tag, ::std::sync::Arc::new($parser))?;)*
            Ok(())
        })();
        result.map(|()| registry)
    }};
}

/// Builds a registry holding every built-in CARMEN parser.
pub fn default_registry() -> Result<ParserRegistry, RegistryError> {
    info!("Initializing CARMEN parser registry");

    let registry = register_parsers![
        "PARAM" => ParamParser,
        "SYNC" => SyncParser,
        "ODOM" => OdometryParser,
        "RAWLASER1" => RawLaserParser,
        "RAWLASER2" => RawLaserParser,
        "RAWLASER3" => RawLaserParser,
        "RAWLASER4" => RawLaserParser,
        "ROBOTLASER1" => RobotLaserParser,
        "ROBOTLASER2" => RobotLaserParser,
        "NMEAGGA" => GgaParser,
        "NMEARMC" => RmcParser,
    ]?;

    info!("Registered {} tags: {}", registry.len(), registry.tags().join(", "));
    Ok(registry)
}
