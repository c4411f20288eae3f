//! Task module - defines tasks, their status lifecycle, and the session state.
//!
//! - All status changes go through explicit transitions
//! - Invariants are enforced in constructors
//! - No IO happens here; the agent core drives every mutation

mod state;
#[allow(clippy::module_inception)]
pub mod task;

pub use state::{AgentState, Mode, StateError};
pub use task::{Task, TaskError, TaskId, TaskStatus};
