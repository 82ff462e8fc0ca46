//! # Relaxed IK Library
//!
//! Shared types and logic for the relaxed IK dataflow: the pose-goal solve
//! service and the collision viewer loop. Both dora nodes link against this
//! crate; the transport code stays in the node binaries.

pub mod error;
pub mod service;
pub mod types;
pub mod utils;
pub mod viewer;

#[cfg(test)]
mod test_support;

// Re-export everything for convenience
pub use error::*;
pub use service::*;
pub use types::*;
pub use utils::*;
pub use viewer::*;
