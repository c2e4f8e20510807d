//! Core logic including the agent loop, tool dispatch, the output grammar
//! and the session transcript.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod agent;
pub mod conversation;
mod model_client;
pub mod tool;
pub mod turn;

pub use agent::{
    Agent, AgentBuilder, AgentEvent, AgentOutcome, FailureReason, TurnReport,
};
