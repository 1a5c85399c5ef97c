use crate::base_parser::{Fields, MessageParser};
use crate::messages::{MessageKind, Odometry, Payload, Pose2D, Velocity};
use crate::types::{Envelope, FieldDecodeError};

/// `ODOM x y theta [tv rv accel]`
///
/// Current CARMEN loggers always write the velocity triple; pose-only lines
/// from older tools are accepted too. Anything else is rejected.
pub struct OdometryParser;

impl MessageParser for OdometryParser {
    fn name(&self) -> &'static str {
        "odometry"
    }

    fn kind(&self) -> MessageKind {
        MessageKind::Odometry
    }

    fn parse(&self, fields: &mut Fields<'_>, _envelope: &Envelope) -> Result<Payload, FieldDecodeError> {
        let pose = read_pose(fields, ["x", "y", "theta"])?;

        let velocity = if fields.is_empty() {
            None
        } else {
            Some(Velocity {
                tv: fields.f64("tv")?,
                rv: fields.f64("rv")?,
                accel: fields.f64("accel")?,
            })
        };

        Ok(Payload::Odometry(Odometry { pose, velocity }))
    }
}

pub(crate) fn read_pose(fields: &mut Fields<'_>, names: [&'static str; 3]) -> Result<Pose2D, FieldDecodeError> {
    let [x, y, theta] = names;
    Ok(Pose2D {
        x: fields.f64(x)?,
        y: fields.f64(y)?,
        theta: fields.f64(theta)?,
    })
}
