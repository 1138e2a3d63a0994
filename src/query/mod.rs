//! Query gate and result shaping for Data Insights.
//!
//! Isolates validation, read-only execution and result bounding from the
//! agent and the CLI.

mod gate;
mod shaper;

pub use gate::{ExecutionError, GatePolicy, QueryGate};
pub use shaper::shape;
