use crate::base_parser::{Fields, MessageParser};
use crate::messages::{LaserScan, MessageKind, Payload, RobotLaser};
use crate::odometry_parser::read_pose;
use crate::types::{Envelope, FieldDecodeError};

/// `RAWLASER1`..`RAWLASER4`:
///
/// ```text
/// laser_type start_angle field_of_view angular_resolution maximum_range
/// accuracy remission_mode num_readings [range_readings]
/// num_remissions [remission_values]
/// ```
pub struct RawLaserParser;

impl MessageParser for RawLaserParser {
    fn name(&self) -> &'static str {
        "rawlaser"
    }

    fn kind(&self) -> MessageKind {
        MessageKind::RawLaser
    }

    fn parse(&self, fields: &mut Fields<'_>, _envelope: &Envelope) -> Result<Payload, FieldDecodeError> {
        Ok(Payload::RawLaser(read_scan(fields)?))
    }
}

/// `ROBOTLASER1`, `ROBOTLASER2`: a raw scan followed by
///
/// ```text
/// laser_pose_x laser_pose_y laser_pose_theta robot_pose_x robot_pose_y
/// robot_pose_theta laser_tv laser_rv forward_safety_dist side_safety_dist
/// turn_axis
/// ```
pub struct RobotLaserParser;

impl MessageParser for RobotLaserParser {
    fn name(&self) -> &'static str {
        "robotlaser"
    }

    fn kind(&self) -> MessageKind {
        MessageKind::RobotLaser
    }

    fn parse(&self, fields: &mut Fields<'_>, _envelope: &Envelope) -> Result<Payload, FieldDecodeError> {
        let scan = read_scan(fields)?;
        let laser_pose = read_pose(fields, ["laser_pose_x", "laser_pose_y", "laser_pose_theta"])?;
        let robot_pose = read_pose(fields, ["robot_pose_x", "robot_pose_y", "robot_pose_theta"])?;

        Ok(Payload::RobotLaser(RobotLaser {
            scan,
            laser_pose,
            robot_pose,
            tv: fields.f64("laser_tv")?,
            rv: fields.f64("laser_rv")?,
            forward_safety_dist: fields.f64("forward_safety_dist")?,
            side_safety_dist: fields.f64("side_safety_dist")?,
            turn_axis: fields.f64("turn_axis")?,
        }))
    }
}

fn read_scan(fields: &mut Fields<'_>) -> Result<LaserScan, FieldDecodeError> {
    Ok(LaserScan {
        laser_type: fields.i32("laser_type")?,
        start_angle: fields.f64("start_angle")?,
        field_of_view: fields.f64("field_of_view")?,
        angular_resolution: fields.f64("angular_resolution")?,
        maximum_range: fields.f64("maximum_range")?,
        accuracy: fields.f64("accuracy")?,
        remission_mode: fields.i32("remission_mode")?,
        ranges: fields.counted("num_readings")?,
        remissions: fields.counted("num_remissions")?,
    })
}
