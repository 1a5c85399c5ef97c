use crate::base_parser::{Fields, MessageParser};
use crate::messages::{Gga, MessageKind, Payload, Rmc};
use crate::types::{Envelope, FieldDecodeError};

/// `NMEAGGA gpsnr utc latitude lat_orient longitude long_orient gps_quality
/// num_satellites hdop sea_level altitude geo_sea_level geo_sep data_age`
pub struct GgaParser;

impl MessageParser for GgaParser {
    fn name(&self) -> &'static str {
        "nmea_gga"
    }

    fn kind(&self) -> MessageKind {
        MessageKind::Gga
    }

    fn parse(&self, fields: &mut Fields<'_>, _envelope: &Envelope) -> Result<Payload, FieldDecodeError> {
        Ok(Payload::Gga(Gga {
            gpsnr: fields.i32("gpsnr")?,
            utc: fields.f64("utc")?,
            latitude: fields.f64("latitude")?,
            lat_orient: fields.char("lat_orient")?,
            longitude: fields.f64("longitude")?,
            long_orient: fields.char("long_orient")?,
            gps_quality: fields.i32("gps_quality")?,
            num_satellites: fields.i32("num_satellites")?,
            hdop: fields.f64("hdop")?,
            sea_level: fields.f64("sea_level")?,
            altitude: fields.f64("altitude")?,
            geo_sea_level: fields.f64("geo_sea_level")?,
            geo_sep: fields.f64("geo_sep")?,
            data_age: fields.f64("data_age")?,
        }))
    }
}

/// `NMEARMC gpsnr validity utc latitude lat_orient longitude long_orient
/// speed course variation var_dir date`
pub struct RmcParser;

impl MessageParser for RmcParser {
    fn name(&self) -> &'static str {
        "nmea_rmc"
    }

    fn kind(&self) -> MessageKind {
        MessageKind::Rmc
    }

    fn parse(&self, fields: &mut Fields<'_>, _envelope: &Envelope) -> Result<Payload, FieldDecodeError> {
        Ok(Payload::Rmc(Rmc {
            gpsnr: fields.i32("gpsnr")?,
            validity: fields.i32("validity")?,
            utc: fields.f64("utc")?,
            latitude: fields.f64("latitude")?,
            lat_orient: fields.char("lat_orient")?,
            longitude: fields.f64("longitude")?,
            long_orient: fields.char("long_orient")?,
            speed: fields.f64("speed")?,
            course: fields.f64("course")?,
            variation: fields.f64("variation")?,
            var_dir: fields.char("var_dir")?,
            date: fields.number("date")?,
        }))
    }
}
