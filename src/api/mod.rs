//! HA API Module
//!
//! The platform operations the replication workflow composes, and an
//! HTTP client implementing them.

mod http;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::model::{Instance, ReplicationConfig, ReplicationSchedule};

pub use http::HttpHaApi;

/// Platform HA operations
#[async_trait]
pub trait HaApi: Send + Sync {
    /// Produce a new shared cluster key
    async fn generate_key(&self) -> Result<String>;

    /// The local node's HA configuration, if one exists
    async fn get_config(&self) -> Result<Option<ReplicationConfig>>;

    /// Replication schedule of a configuration, if one exists
    async fn get_schedule(&self, config_id: Uuid) -> Result<Option<ReplicationSchedule>>;

    /// Register a new HA relationship seeded with `cluster_key`
    async fn create_config(&self, cluster_key: &str) -> Result<ReplicationConfig>;

    /// Register a member of the relationship
    async fn create_instance(
        &self,
        config_id: Uuid,
        address: &str,
        is_leader: bool,
        is_local: bool,
    ) -> Result<Instance>;

    /// Start or update the periodic replication schedule
    async fn enable_replication(&self, config_id: Uuid, frequency_ms: u64) -> Result<()>;

    /// Stop the periodic replication schedule
    async fn disable_replication(&self, config_id: Uuid) -> Result<()>;
}
