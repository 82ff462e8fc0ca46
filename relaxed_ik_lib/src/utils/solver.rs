use crate::types::{JointLimit, RobotConfig, SolverConfig};
use crate::utils::kinematics::RobotModel;
use eyre::Result;
use nalgebra::{DMatrix, DVector, Quaternion, UnitQuaternion, Vector3};
use tracing::debug;

/// Boundary to the inverse-kinematics solver.
///
/// `solve` takes one position `[x, y, z]` and one quaternion `[w, x, y, z]`
/// per kinematic chain, in chain order, and returns one angle per joint.
pub trait IkSolver {
    fn num_chains(&self) -> usize;
    fn dof(&self) -> usize;
    fn solve(&mut self, positions: &[[f64; 3]], quaternions: &[[f64; 4]]) -> Result<Vec<f64>>;
}

/// Damped least-squares solver over all chains at once.
///
/// Goals are offsets from the end-effector poses at the starting
/// configuration: positions are added, orientations pre-multiplied. Each
/// solve starts from the previous solution.
pub struct DampedLeastSquaresSolver {
    model: RobotModel,
    limits: Vec<JointLimit>,
    config: SolverConfig,
    initial_ee: Vec<(Vector3<f64>, UnitQuaternion<f64>)>,
    seed: Vec<f64>,
}

impl DampedLeastSquaresSolver {
    pub fn new(config: &RobotConfig) -> Result<Self> {
        config.validate()?;

        let model = RobotModel::new(config);
        let initial_ee = model
            .frames(&config.starting_config)?
            .iter()
            .map(|chain| chain.end_effector())
            .collect();

        Ok(Self {
            model,
            limits: config.joint_limits.clone(),
            config: config.solver.clone(),
            initial_ee,
            seed: config.starting_config.clone(),
        })
    }

    pub fn model(&self) -> &RobotModel {
        &self.model
    }

    fn goals(
        &self,
        positions: &[[f64; 3]],
        quaternions: &[[f64; 4]],
    ) -> Result<Vec<(Vector3<f64>, UnitQuaternion<f64>)>> {
        let chains = self.model.num_chains();
        if positions.len() != chains || quaternions.len() != chains {
            return Err(eyre::eyre!(
                "Expected {} position and quaternion goals, got {} and {}",
                chains,
                positions.len(),
                quaternions.len()
            ));
        }

        self.initial_ee
            .iter()
            .zip(positions.iter().zip(quaternions))
            .map(|((init_pos, init_rot), (p, q))| {
                let quat = Quaternion::new(q[0], q[1], q[2], q[3]);
                if quat.norm() < 1e-9 {
                    return Err(eyre::eyre!("Orientation goal is a zero quaternion"));
                }
                let goal_rot = UnitQuaternion::from_quaternion(quat) * init_rot;
                Ok((init_pos + Vector3::new(p[0], p[1], p[2]), goal_rot))
            })
            .collect()
    }
}

impl IkSolver for DampedLeastSquaresSolver {
    fn num_chains(&self) -> usize {
        self.model.num_chains()
    }

    fn dof(&self) -> usize {
        self.model.dof()
    }

    fn solve(&mut self, positions: &[[f64; 3]], quaternions: &[[f64; 4]]) -> Result<Vec<f64>> {
        let goals = self.goals(positions, quaternions)?;
        let dof = self.model.dof();
        let rows = 6 * goals.len();
        let damping_sq = self.config.damping * self.config.damping;

        let mut q = DVector::from_column_slice(&self.seed);
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            let frames = self.model.frames(q.as_slice())?;
            let mut error = DVector::<f64>::zeros(rows);
            let mut jacobian = DMatrix::<f64>::zeros(rows, dof);
            let mut converged = true;

            for (c, ((chain, chain_frames), (goal_pos, goal_rot))) in self
                .model
                .chains()
                .iter()
                .zip(&frames)
                .zip(&goals)
                .enumerate()
            {
                let (ee_pos, ee_rot) = chain_frames.end_effector();
                let pos_err = goal_pos - ee_pos;
                let rot_err = (goal_rot * ee_rot.inverse()).scaled_axis();

                if pos_err.norm() > self.config.position_tolerance
                    || rot_err.norm() > self.config.orientation_tolerance
                {
                    converged = false;
                }

                let row = 6 * c;
                for axis in 0..3 {
                    error[row + axis] = pos_err[axis];
                    error[row + 3 + axis] = rot_err[axis];
                }

                let chain_jacobian = chain.jacobian(q.as_slice());
                for r in 0..6 {
                    for col in 0..dof {
                        jacobian[(row + r, col)] = chain_jacobian[(r, col)];
                    }
                }
            }

            if converged {
                break;
            }

            let damped = &jacobian * jacobian.transpose() + DMatrix::<f64>::identity(rows, rows) * damping_sq;
            let step = damped
                .lu()
                .solve(&error)
                .ok_or_else(|| eyre::eyre!("Damped Jacobian system is singular"))?;
            let mut dq = jacobian.transpose() * step;

            let step_norm = dq.norm();
            if step_norm > self.config.max_step {
                dq *= self.config.max_step / step_norm;
            }

            q += dq;
            for (angle, limit) in q.iter_mut().zip(&self.limits) {
                *angle = limit.clamp(*angle);
            }
            iterations += 1;
        }

        if q.iter().any(|a| !a.is_finite()) {
            return Err(eyre::eyre!("Solver produced non-finite joint angles"));
        }

        debug!("Solved {} chains in {} iterations", goals.len(), iterations);

        self.seed = q.as_slice().to_vec();
        Ok(self.seed.clone())
    }
}
