pub mod config;
pub mod header;
pub mod joint_state;
pub mod pose_goal;
pub mod visualization;

pub use config::*;
pub use header::*;
pub use joint_state::*;
pub use pose_goal::*;
pub use visualization::*;
