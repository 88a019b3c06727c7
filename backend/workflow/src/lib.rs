//! IdGuard workflow runner
//!
//! A deterministic state machine that takes one uploaded image through
//! extraction, the duplicate check, and then either persistence or a fraud
//! alert, producing exactly one `WorkflowResult` per run.

pub mod duplicate;
pub mod machine;
pub mod orchestrator;
pub mod outcome;

pub use duplicate::is_duplicate;
pub use machine::RunTracker;
pub use orchestrator::Orchestrator;
