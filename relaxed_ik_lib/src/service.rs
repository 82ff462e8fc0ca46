//! Pose-goal solve service.
//!
//! A request passes through the chain-count check, goal extraction, a single
//! batched solver call and response building. Requests that fail a check
//! never reach the solver and get a response without joint angles.

use crate::error::{SolveError, SolveErrorKind};
use crate::types::{EePose, Header, JointAngles, SolveRequest, SolveResponse};
use crate::utils::solver::IkSolver;
use tracing::{debug, error, warn};

/// Reject a request whose pose count differs from the robot's chain count.
pub fn validate_chain_count(num_poses: usize, num_chains: usize) -> Result<(), SolveError> {
    if num_poses != num_chains {
        return Err(SolveError::ArityMismatch {
            poses: num_poses,
            chains: num_chains,
        });
    }
    Ok(())
}

/// Split pose goals into `[x, y, z]` positions and `[w, x, y, z]` quaternions, keeping order.
pub fn extract_goals(poses: &[EePose]) -> (Vec<[f64; 3]>, Vec<[f64; 4]>) {
    poses
        .iter()
        .map(|p| {
            (
                [p.position.x, p.position.y, p.position.z],
                [p.orientation.w, p.orientation.x, p.orientation.y, p.orientation.z],
            )
        })
        .unzip()
}

pub fn build_response(header: &Header, angles: &[f64]) -> SolveResponse {
    SolveResponse {
        joint_angles: Some(JointAngles {
            header: header.clone(),
            angles: angles.iter().map(|&a| a as f32).collect(),
        }),
        error: None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Ready,
    Uninitialized,
}

/// Owns the solver; `&mut self` keeps one solve in flight at a time.
pub struct SolveService<S: IkSolver> {
    solver: Option<S>,
}

impl<S: IkSolver> SolveService<S> {
    pub fn new(solver: Option<S>) -> Self {
        Self { solver }
    }

    pub fn state(&self) -> ServiceState {
        match &self.solver {
            Some(solver) if solver.num_chains() > 0 => ServiceState::Ready,
            _ => ServiceState::Uninitialized,
        }
    }

    pub fn solver(&self) -> Option<&S> {
        self.solver.as_ref()
    }

    /// Solve one request.
    ///
    /// Guard failures come back as `Ok` with an empty response carrying the
    /// error kind. Solver failures and wrong-length solver output are `Err`.
    pub fn handle_solve_request(&mut self, request: &SolveRequest) -> Result<SolveResponse, SolveError> {
        let solver = match self.solver.as_mut() {
            Some(solver) if solver.num_chains() > 0 => solver,
            _ => {
                warn!("Solve request received while solver is uninitialized");
                return Ok(SolveResponse::failed(SolveErrorKind::Configuration));
            }
        };
        let num_chains = solver.num_chains();

        let goals = match &request.pose_goals {
            Some(goals) if !goals.ee_poses.is_empty() => goals,
            _ => {
                warn!("Solve request carries no pose goals");
                return Ok(SolveResponse::failed(SolveErrorKind::EmptyGoals));
            }
        };

        if let Err(err) = validate_chain_count(goals.ee_poses.len(), num_chains) {
            error!("{}", err);
            return Ok(SolveResponse::failed(SolveErrorKind::from(&err)));
        }

        let (positions, quaternions) = extract_goals(&goals.ee_poses);
        let angles = solver.solve(&positions, &quaternions).map_err(SolveError::Solver)?;

        let dof = solver.dof();
        if angles.len() != dof {
            return Err(SolveError::DofMismatch {
                expected: dof,
                actual: angles.len(),
            });
        }

        debug!("Solved {} pose goals into {} joint angles", num_chains, dof);
        Ok(build_response(&goals.header, &angles))
    }

    /// Like [`Self::handle_solve_request`], with errors folded into the response.
    pub fn respond(&mut self, request: &SolveRequest) -> SolveResponse {
        match self.handle_solve_request(request) {
            Ok(response) => response,
            Err(e) => {
                error!("Solve request failed: {}", e);
                SolveResponse::failed(SolveErrorKind::from(&e))
            }
        }
    }

    /// Answer one raw JSON payload. A missing payload or one that does not
    /// decode still gets a failed response.
    pub fn handle_payload(&mut self, payload: Option<&[u8]>) -> SolveResponse {
        let Some(bytes) = payload else {
            warn!("Solve request carries no payload");
            return SolveResponse::failed(SolveErrorKind::InvalidRequest {
                message: "empty payload".to_string(),
            });
        };

        match serde_json::from_slice::<SolveRequest>(bytes) {
            Ok(request) => self.respond(&request),
            Err(e) => {
                warn!("Failed to parse solve request: {}", e);
                SolveResponse::failed(SolveErrorKind::InvalidRequest {
                    message: e.to_string(),
                })
            }
        }
    }
}
