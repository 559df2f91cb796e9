//! Replication Workflow Module
//!
//! Turns a submitted form into the ordered API calls for its mode and role.

mod orchestrator;
mod plan;

pub use orchestrator::{HaView, SubmitOutcome, WorkflowOrchestrator};
pub use plan::{plan, Step};
