//! Robot descriptions shared by the unit tests.

use crate::RobotConfig;

const PLANAR: &str = r#"
name = "planar"
fixed_frame = "base_link"
joint_ordering = ["shoulder", "elbow"]
starting_config = [0.0, 0.5]

[[joint_limits]]
min_angle = -3.14
max_angle = 3.14

[[joint_limits]]
min_angle = -2.5
max_angle = 2.5

[[chains]]
name = "arm"
joint_indices = [0, 1]

[[chains.dh_parameters]]
a = 0.5
alpha = 0.0
d = 0.0
theta = 0.0

[[chains.dh_parameters]]
a = 0.4
alpha = 0.0
d = 0.0
theta = 0.0
"#;

pub fn planar_config() -> RobotConfig {
    RobotConfig::from_toml_str(PLANAR).unwrap()
}

pub fn ur5_config() -> RobotConfig {
    RobotConfig::from_toml_str(include_str!("../../config/ur5.toml")).unwrap()
}
