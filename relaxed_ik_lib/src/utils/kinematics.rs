use crate::types::{ChainConfig, DHParameter, RobotConfig};
use eyre::Result;
use nalgebra::{DMatrix, Matrix4, Rotation3, UnitQuaternion, Vector3};

/// Joint origins and orientations along one chain.
///
/// Index 0 is the chain base, the last entry is the end effector.
#[derive(Debug, Clone)]
pub struct ChainFrames {
    pub positions: Vec<Vector3<f64>>,
    pub rotations: Vec<UnitQuaternion<f64>>,
}

impl ChainFrames {
    pub fn end_effector(&self) -> (Vector3<f64>, UnitQuaternion<f64>) {
        // A chain always has at least its base frame.
        let last = self.positions.len() - 1;
        (self.positions[last], self.rotations[last])
    }
}

/// Frames of every chain, in chain order.
pub type Frames = Vec<ChainFrames>;

pub struct KinematicChain {
    joint_indices: Vec<usize>,
    dh_params: Vec<DHParameter>,
    base_offset: Vector3<f64>,
}

impl KinematicChain {
    pub fn new(config: &ChainConfig) -> Self {
        Self {
            joint_indices: config.joint_indices.clone(),
            dh_params: config.dh_parameters.clone(),
            base_offset: Vector3::new(
                config.base_offset[0],
                config.base_offset[1],
                config.base_offset[2],
            ),
        }
    }

    /// Cumulative transforms: base, then one per joint.
    fn transforms(&self, state: &[f64]) -> Vec<Matrix4<f64>> {
        let mut transforms = Vec::with_capacity(self.dh_params.len() + 1);
        let mut current = Matrix4::identity();

        current[(0, 3)] = self.base_offset.x;
        current[(1, 3)] = self.base_offset.y;
        current[(2, 3)] = self.base_offset.z;
        transforms.push(current);

        for (dh, &joint) in self.dh_params.iter().zip(&self.joint_indices) {
            let theta = state[joint] + dh.theta;
            current *= dh_transformation(dh.a, dh.alpha, dh.d, theta);
            transforms.push(current);
        }

        transforms
    }

    pub fn frames(&self, state: &[f64]) -> ChainFrames {
        let transforms = self.transforms(state);

        let positions = transforms
            .iter()
            .map(|t| Vector3::new(t[(0, 3)], t[(1, 3)], t[(2, 3)]))
            .collect();
        let rotations = transforms
            .iter()
            .map(|t| {
                let rotation = Rotation3::from_matrix_unchecked(t.fixed_view::<3, 3>(0, 0).into_owned());
                UnitQuaternion::from_rotation_matrix(&rotation)
            })
            .collect();

        ChainFrames {
            positions,
            rotations,
        }
    }

    /// Geometric Jacobian of this chain's end effector against the full joint vector.
    ///
    /// Rows are `[vx, vy, vz, wx, wy, wz]`; columns of joints outside the
    /// chain stay zero.
    pub fn jacobian(&self, state: &[f64]) -> DMatrix<f64> {
        let transforms = self.transforms(state);
        let mut jacobian = DMatrix::zeros(6, state.len());

        let tip = &transforms[transforms.len() - 1];
        let ee_position = Vector3::new(tip[(0, 3)], tip[(1, 3)], tip[(2, 3)]);

        for (i, &joint) in self.joint_indices.iter().enumerate() {
            let transform = &transforms[i];
            let joint_position = Vector3::new(transform[(0, 3)], transform[(1, 3)], transform[(2, 3)]);
            let joint_axis = Vector3::new(transform[(0, 2)], transform[(1, 2)], transform[(2, 2)]);

            let linear_contrib = joint_axis.cross(&(ee_position - joint_position));
            jacobian[(0, joint)] += linear_contrib.x;
            jacobian[(1, joint)] += linear_contrib.y;
            jacobian[(2, joint)] += linear_contrib.z;

            jacobian[(3, joint)] += joint_axis.x;
            jacobian[(4, joint)] += joint_axis.y;
            jacobian[(5, joint)] += joint_axis.z;
        }

        jacobian
    }
}

fn dh_transformation(a: f64, alpha: f64, d: f64, theta: f64) -> Matrix4<f64> {
    let cos_theta = theta.cos();
    let sin_theta = theta.sin();
    let cos_alpha = alpha.cos();
    let sin_alpha = alpha.sin();

    Matrix4::new(
        cos_theta, -sin_theta * cos_alpha,  sin_theta * sin_alpha, a * cos_theta,
        sin_theta,  cos_theta * cos_alpha, -cos_theta * sin_alpha, a * sin_theta,
        0.0,        sin_alpha,              cos_alpha,             d,
        0.0,        0.0,                    0.0,                   1.0,
    )
}

/// Forward-kinematics model of the whole robot.
pub struct RobotModel {
    chains: Vec<KinematicChain>,
    joint_ordering: Vec<String>,
}

impl RobotModel {
    pub fn new(config: &RobotConfig) -> Self {
        Self {
            chains: config.chains.iter().map(KinematicChain::new).collect(),
            joint_ordering: config.joint_ordering.clone(),
        }
    }

    pub fn num_chains(&self) -> usize {
        self.chains.len()
    }

    pub fn dof(&self) -> usize {
        self.joint_ordering.len()
    }

    pub fn joint_ordering(&self) -> &[String] {
        &self.joint_ordering
    }

    pub fn chains(&self) -> &[KinematicChain] {
        &self.chains
    }

    pub fn frames(&self, state: &[f64]) -> Result<Frames> {
        self.check_state(state)?;
        Ok(self.chains.iter().map(|c| c.frames(state)).collect())
    }

    fn check_state(&self, state: &[f64]) -> Result<()> {
        if state.len() != self.dof() {
            return Err(eyre::eyre!(
                "State has {} joint values, robot has {} DOF",
                state.len(),
                self.dof()
            ));
        }
        Ok(())
    }
}
