use serde::{Deserialize, Serialize};

/// Discriminant shared by every [`Payload`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Param,
    Sync,
    Odometry,
    RawLaser,
    RobotLaser,
    Gga,
    Rmc,
}

impl MessageKind {
    /// Type identifier handed to sinks alongside each channel.
    pub fn type_name(&self) -> &'static str {
        match self {
            MessageKind::Param => "rcl_interfaces/msg/Parameter",
            MessageKind::Sync => "std_msgs/msg/String",
            MessageKind::Odometry => "nav_msgs/msg/Odometry",
            MessageKind::RawLaser | MessageKind::RobotLaser => "sensor_msgs/msg/LaserScan",
            MessageKind::Gga => "nmea_msgs/msg/Gpgga",
            MessageKind::Rmc => "nmea_msgs/msg/Gprmc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Param(Param),
    Sync(SyncMark),
    Odometry(Odometry),
    RawLaser(LaserScan),
    RobotLaser(RobotLaser),
    Gga(Gga),
    Rmc(Rmc),
}

impl Payload {
    pub fn kind(&self) -> MessageKind {
        match self {
            Payload::Param(_) => MessageKind::Param,
            Payload::Sync(_) => MessageKind::Sync,
            Payload::Odometry(_) => MessageKind::Odometry,
            Payload::RawLaser(_) => MessageKind::RawLaser,
            Payload::RobotLaser(_) => MessageKind::RobotLaser,
            Payload::Gga(_) => MessageKind::Gga,
            Payload::Rmc(_) => MessageKind::Rmc,
        }
    }

    /// MessagePack encoding of the variant body, with named fields.
    /// The kind travels separately as the channel type.
    pub fn to_msgpack(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        match self {
            Payload::Param(body) => rmp_serde::to_vec_named(body),
            Payload::Sync(body) => rmp_serde::to_vec_named(body),
            Payload::Odometry(body) => rmp_serde::to_vec_named(body),
            Payload::RawLaser(body) => rmp_serde::to_vec_named(body),
            Payload::RobotLaser(body) => rmp_serde::to_vec_named(body),
            Payload::Gga(body) => rmp_serde::to_vec_named(body),
            Payload::Rmc(body) => rmp_serde::to_vec_named(body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMark {
    pub tagname: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose2D {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    pub tv: f64,
    pub rv: f64,
    pub accel: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Odometry {
    pub pose: Pose2D,
    /// Absent on logs that only record the pose.
    pub velocity: Option<Velocity>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaserScan {
    pub laser_type: i32,
    pub start_angle: f64,
    pub field_of_view: f64,
    pub angular_resolution: f64,
    pub maximum_range: f64,
    pub accuracy: f64,
    pub remission_mode: i32,
    pub ranges: Vec<f32>,
    pub remissions: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotLaser {
    pub scan: LaserScan,
    pub laser_pose: Pose2D,
    pub robot_pose: Pose2D,
    pub tv: f64,
    pub rv: f64,
    pub forward_safety_dist: f64,
    pub side_safety_dist: f64,
    pub turn_axis: f64,
}

/// NMEA GGA fix as logged by the CARMEN gps module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gga {
    pub gpsnr: i32,
    pub utc: f64,
    pub latitude: f64,
    pub lat_orient: char,
    pub longitude: f64,
    pub long_orient: char,
    pub gps_quality: i32,
    pub num_satellites: i32,
    pub hdop: f64,
    pub sea_level: f64,
    pub altitude: f64,
    pub geo_sea_level: f64,
    pub geo_sep: f64,
    pub data_age: f64,
}

/// NMEA RMC sentence as logged by the CARMEN gps module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rmc {
    pub gpsnr: i32,
    pub validity: i32,
    pub utc: f64,
    pub latitude: f64,
    pub lat_orient: char,
    pub longitude: f64,
    pub long_orient: char,
    pub speed: f64,
    pub course: f64,
    pub variation: f64,
    pub var_dir: char,
    /// ddmmyy
    pub date: u32,
}
