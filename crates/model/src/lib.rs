//! An abstraction layer for the hosted LLMs the agent talks to.
//!
//! This crate establishes an unified protocol for the agent to stream
//! completions from a model provider, so that the provider can be
//! switched (or faked in tests) without touching the agent loop.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod provider;
mod request;
mod response;

pub use error::*;
pub use provider::*;
pub use request::*;
pub use response::*;
