//! The Steward assistant pipeline.
//!
//! Coordinates retrieval-augmented generation: an intent payload enters,
//! the pipeline optionally auto-searches the knowledge base through the
//! gated tool executor, assembles a grounded prompt, calls the model
//! gateway, persists the exchange, and returns a structured payload with
//! response text and telemetry metadata.

pub mod pipeline;

pub use pipeline::{AssistantOutput, AssistantPipeline};
