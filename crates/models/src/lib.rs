//! Model routing and generation for Steward.
//!
//! The gateway owns a name-keyed, insertion-ordered catalog of model specs
//! and routes each request by intent hints and configuration policy. Text
//! is produced by a pluggable [`steward_core::CompletionBackend`]; the
//! built-in backend is a deterministic simulator.

pub mod gateway;
pub mod simulated;

pub use gateway::ModelGateway;
pub use simulated::SimulatedBackend;
