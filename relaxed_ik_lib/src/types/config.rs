use eyre::Result;
use serde::{Deserialize, Serialize};
use std::fs;

/// Robot description shared by the solve service and the collision viewer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobotConfig {
    pub name: String,
    pub fixed_frame: String,
    pub joint_ordering: Vec<String>,
    pub starting_config: Vec<f64>,
    pub joint_limits: Vec<JointLimit>,
    #[serde(default)]
    pub chains: Vec<ChainConfig>,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub collision: CollisionConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JointLimit {
    pub min_angle: f64,
    pub max_angle: f64,
}

impl JointLimit {
    pub fn clamp(&self, angle: f64) -> f64 {
        angle.clamp(self.min_angle, self.max_angle)
    }
}

/// One kinematic chain from the robot base to an end effector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    /// Index into `joint_ordering` of each DH joint, base to tip.
    pub joint_indices: Vec<usize>,
    pub dh_parameters: Vec<DHParameter>,
    #[serde(default)]
    pub base_offset: [f64; 3], // x, y, z
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DHParameter {
    pub a: f64,      // link length
    pub alpha: f64,  // link twist
    pub d: f64,      // link offset
    pub theta: f64,  // joint angle offset
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub max_iterations: usize,
    pub damping: f64,
    pub max_step: f64,
    pub position_tolerance: f64,
    pub orientation_tolerance: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            damping: 0.05,
            max_step: 0.2,
            position_tolerance: 1e-4,
            orientation_tolerance: 1e-3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Radius of the sphere placed on every joint origin.
    pub link_radius: f64,
    /// Joints closer than this along one chain are never checked against each other.
    pub skip_adjacent: usize,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            link_radius: 0.04,
            skip_adjacent: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub marker_offset: [f64; 3],
    pub marker_scale: f64,
    /// Explicit sample states. When empty, `sample_count` states are generated.
    pub sample_states: Vec<Vec<f64>>,
    pub sample_count: usize,
    /// Joints outside `joint_ordering` (grippers, mimic joints) published at a constant value.
    pub fixed_joints: Vec<FixedJoint>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            marker_offset: [-0.3, 0.0, 0.3],
            marker_scale: 0.1,
            sample_states: Vec::new(),
            sample_count: 50,
            fixed_joints: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixedJoint {
    pub name: String,
    pub value: f64,
}

impl RobotConfig {
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RobotConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn dof(&self) -> usize {
        self.joint_ordering.len()
    }

    pub fn num_chains(&self) -> usize {
        self.chains.len()
    }

    pub fn validate(&self) -> Result<()> {
        let dof = self.dof();

        if self.joint_limits.len() != dof {
            return Err(eyre::eyre!(
                "Joint limits count ({}) doesn't match DOF ({})",
                self.joint_limits.len(),
                dof
            ));
        }

        if self.starting_config.len() != dof {
            return Err(eyre::eyre!(
                "Starting config length ({}) doesn't match DOF ({})",
                self.starting_config.len(),
                dof
            ));
        }

        for (i, limit) in self.joint_limits.iter().enumerate() {
            if !limit.min_angle.is_finite() || !limit.max_angle.is_finite() {
                return Err(eyre::eyre!(
                    "Joint {} has non-finite limits [{}, {}]",
                    self.joint_ordering[i],
                    limit.min_angle,
                    limit.max_angle
                ));
            }
            if limit.min_angle > limit.max_angle {
                return Err(eyre::eyre!(
                    "Joint {} has min angle {:.3} above max angle {:.3}",
                    self.joint_ordering[i],
                    limit.min_angle,
                    limit.max_angle
                ));
            }
        }

        for chain in &self.chains {
            if chain.dh_parameters.len() != chain.joint_indices.len() {
                return Err(eyre::eyre!(
                    "Chain {}: DH parameters count ({}) doesn't match joint count ({})",
                    chain.name,
                    chain.dh_parameters.len(),
                    chain.joint_indices.len()
                ));
            }
            if let Some(&bad) = chain.joint_indices.iter().find(|&&i| i >= dof) {
                return Err(eyre::eyre!(
                    "Chain {}: joint index {} outside DOF ({})",
                    chain.name,
                    bad,
                    dof
                ));
            }
        }

        for (i, state) in self.viewer.sample_states.iter().enumerate() {
            if state.len() != dof {
                return Err(eyre::eyre!(
                    "Sample state {} has {} values, expected {}",
                    i,
                    state.len(),
                    dof
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_LINK: &str = r#"
name = "planar"
fixed_frame = "base_link"
joint_ordering = ["shoulder", "elbow"]
starting_config = [0.0, 0.5]

[[joint_limits]]
min_angle = -3.14
max_angle = 3.14

[[joint_limits]]
min_angle = -2.0
max_angle = 2.0

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

[viewer]
sample_count = 7
"#;

    #[test]
    fn test_parse_and_defaults() {
        let config = RobotConfig::from_toml_str(TWO_LINK).unwrap();
        config.validate().unwrap();

        assert_eq!(config.dof(), 2);
        assert_eq!(config.num_chains(), 1);
        assert_eq!(config.chains[0].base_offset, [0.0, 0.0, 0.0]);
        assert_eq!(config.solver.max_iterations, 100);
        assert_eq!(config.viewer.sample_count, 7);
        assert_eq!(config.viewer.marker_scale, 0.1);
    }

    #[test]
    fn test_validate_rejects_limit_count() {
        let mut config = RobotConfig::from_toml_str(TWO_LINK).unwrap();
        config.joint_limits.pop();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_chain_index() {
        let mut config = RobotConfig::from_toml_str(TWO_LINK).unwrap();
        config.chains[0].joint_indices[1] = 5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_short_sample() {
        let mut config = RobotConfig::from_toml_str(TWO_LINK).unwrap();
        config.viewer.sample_states = vec![vec![0.0]];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_non_finite_limits() {
        let mut config = RobotConfig::from_toml_str(TWO_LINK).unwrap();
        config.joint_limits[1].max_angle = f64::NAN;
        assert!(config.validate().is_err());

        config.joint_limits[1].max_angle = 2.0;
        config.joint_limits[0].min_angle = f64::NEG_INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_viewer_section_has_no_rate() {
        // Tick rate belongs to the dataflow timer, not the robot file.
        let viewer = toml::to_string(&ViewerConfig::default()).unwrap();
        assert!(!viewer.contains("rate"));

        let config = RobotConfig::from_toml_str(include_str!("../../../config/ur5.toml")).unwrap();
        assert_eq!(config.viewer.sample_count, 40);
    }

    #[test]
    fn test_clamp() {
        let limit = JointLimit {
            min_angle: -1.0,
            max_angle: 1.0,
        };
        assert_eq!(limit.clamp(2.0), 1.0);
        assert_eq!(limit.clamp(-0.5), -0.5);
    }
}
