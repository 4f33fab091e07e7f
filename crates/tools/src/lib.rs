//! Built-in tool implementations and the dispatching executor for Steward.
//!
//! Tools give the assistant the ability to act in the world: query the
//! knowledge base, inspect runtime state, queue actuator commands, search
//! files, and run allowlisted shell commands. Every invocation passes
//! through the executor's consent and safety gates before a handler runs.
//!
//! The active tool set depends on configuration: the shell, calendar,
//! email, and home-automation tools only exist when their flags are
//! enabled.

pub mod calendar;
pub mod email;
pub mod executor;
pub mod file_search;
pub mod home_automation;
pub mod issue_command;
pub mod runtime_state;
pub mod search_docs;
pub mod shell;

pub use executor::{ConsentRegistry, ToolExecutor, ToolListing};
