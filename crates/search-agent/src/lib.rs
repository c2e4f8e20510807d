//! A chat agent that answers questions by looking things up.
//!
//! The crate wires the lookup tools and a model provider into a
//! [`Session`]. It includes a CLI tool for using in the terminal, and you
//! can also use it as a library to bring the agent into your own host apps.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

pub mod config;
mod session;
pub mod tools;

pub use config::{Config, ConfigError};
pub use session::{APOLOGY, GREETING, Session, SessionBuilder};

/// Re-exports of [`search_agent_core`] crate.
pub mod core {
    pub use search_agent_core::*;
}
