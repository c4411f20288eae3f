//! # Todo Agent
//!
//! A small LLM agent that plans a goal into tasks, executes them one at a
//! time in text, and keeps a running history.
//!
//! ## Task Flow
//! 1. Receive a goal via the API
//! 2. Ask the selected provider for a short task list
//! 3. Execute tasks on request (or all at once in auto mode)
//! 4. Record status, result and reflection for each execution
//!
//! ## Modules
//! - `agents`: planning, execution and rewriting
//! - `extract`: recovering JSON objects from model replies
//! - `llm`: chat clients, provider routing and the call quota
//! - `task`: task and session state model
//! - `api`: HTTP server and per-session state

pub mod agents;
pub mod api;
pub mod config;
pub mod extract;
pub mod llm;
pub mod task;

pub use agents::TaskAgent;
pub use config::Config;
