pub mod collision;
pub mod kinematics;
pub mod sampling;
pub mod solver;
pub mod tracing;

pub use collision::*;
pub use kinematics::*;
pub use sampling::*;
pub use solver::*;
pub use self::tracing::init_tracing;
