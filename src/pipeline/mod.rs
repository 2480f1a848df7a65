//! The contract processing pipeline:
//! extraction → parsing → resolution → state assignment.

pub mod extraction;
pub mod orchestrator;
pub mod parsing;
pub mod resolution;
pub mod state;

pub use orchestrator::{ContractProcessor, ProcessOutcome, ProcessingError, SkippedLine};
