//! HTTP API for the task agent.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Health check and metered call usage
//! - `GET /api/state` - Current session state
//! - `POST /api/plan` - Plan a goal (auto mode also executes the plan)
//! - `POST /api/execute` - Execute every pending task
//! - `POST /api/execute_task` - Execute one pending task
//! - `POST /api/regenerate_task` - Rewrite a task with the model
//! - `POST /api/update_task` - Edit a task's title and description
//! - `POST /api/cancel_task` - Cancel a pending task
//!
//! Sessions are keyed by the `x-session-id` header.

mod routes;
pub mod session;
pub mod types;

pub use routes::{router, serve, AppState};
pub use types::*;
