use crate::{Header, SolveErrorKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Unit quaternion, scalar first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub w: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Default for Orientation {
    fn default() -> Self {
        Self::identity()
    }
}

impl Orientation {
    pub fn identity() -> Self {
        Self {
            w: 1.0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }
}

/// Target pose for one end effector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EePose {
    pub position: Position,
    pub orientation: Orientation,
}

impl EePose {
    /// Builds a pose from `[x, y, z, qw, qx, qy, qz]`.
    pub fn from_array(v: [f64; 7]) -> Self {
        Self {
            position: Position {
                x: v[0],
                y: v[1],
                z: v[2],
            },
            orientation: Orientation {
                w: v[3],
                x: v[4],
                y: v[5],
                z: v[6],
            },
        }
    }
}

/// All pose goals of one request, one per kinematic chain, in chain order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EePoseGoals {
    pub header: Header,
    pub ee_poses: Vec<EePose>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    pub header: Header,
    pub angles: Vec<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveRequest {
    pub pose_goals: Option<EePoseGoals>,
}

impl SolveRequest {
    pub fn new(header: Header, ee_poses: Vec<EePose>) -> Self {
        Self {
            pose_goals: Some(EePoseGoals { header, ee_poses }),
        }
    }
}

/// Reply to a [`SolveRequest`].
///
/// A call succeeded only when `joint_angles` is populated. On failure the
/// angles are absent and `error` says why.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub joint_angles: Option<JointAngles>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<SolveErrorKind>,
}

impl SolveResponse {
    pub fn failed(kind: SolveErrorKind) -> Self {
        Self {
            joint_angles: None,
            error: Some(kind),
        }
    }

    pub fn is_success(&self) -> bool {
        self.joint_angles.is_some()
    }
}
