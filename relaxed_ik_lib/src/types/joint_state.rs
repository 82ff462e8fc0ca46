use crate::{Header, Stamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JointState {
    pub header: Header,
    pub name: Vec<String>,
    pub position: Vec<f64>,
    #[serde(default)]
    pub velocity: Vec<f64>,
    #[serde(default)]
    pub effort: Vec<f64>,
}

impl JointState {
    /// Names and positions zipped in the given order; velocity and effort stay empty.
    pub fn from_positions(names: &[String], positions: &[f64]) -> Self {
        Self {
            header: Header::default(),
            name: names.to_vec(),
            position: positions.to_vec(),
            velocity: Vec::new(),
            effort: Vec::new(),
        }
    }

    pub fn update_stamp(&mut self, stamp: Stamp) {
        self.header.stamp = stamp;
    }
}
