//! WolfHA - High-Availability Replication Setup Manager
//!
//! Establishes or modifies the HA relationship between an Active platform
//! instance and its Standby through the platform's HA API.
//!
//! # Architecture
//!
//! The operator edits a replication form whose fields are validated by a
//! declarative, cross-field rule set. Submitting the form runs an ordered
//! sequence of dependent API calls chosen by the form's mode (create or
//! edit) and the instance role (Active or Standby).
//!
//! # Features
//!
//! - Create mode: register a configuration, the local instance and, for
//!   Active instances, the replication schedule
//! - Edit mode: start, retune or stop the replication schedule
//! - Cluster key generation for new Active instances
//! - Injected notification sink and query cache invalidation

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod form;
pub mod model;
pub mod notify;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testing;

pub use config::WolfHaConfig;
pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::api::{HaApi, HttpHaApi};
    pub use crate::cache::{QueryCache, QueryKey, StaleQueries};
    pub use crate::config::WolfHaConfig;
    pub use crate::error::{Error, Result};
    pub use crate::form::{FormDefaults, FormField, FormMode, FormStateManager, FormValues};
    pub use crate::model::{Instance, InstanceType, ReplicationConfig, ReplicationSchedule};
    pub use crate::notify::{ConsoleSink, NotificationSink, Severity};
    pub use crate::workflow::{SubmitOutcome, WorkflowOrchestrator};
}
