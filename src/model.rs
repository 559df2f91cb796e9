//! HA Domain Model
//!
//! Server-owned HA records as returned by the platform API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a platform instance in an HA relationship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstanceType {
    /// Writes and schedules outbound replication
    Active,
    /// Receives replicated data
    Standby,
}

impl InstanceType {
    /// Map the server's leader flag to a role
    pub fn from_is_leader(is_leader: bool) -> Self {
        if is_leader {
            InstanceType::Active
        } else {
            InstanceType::Standby
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, InstanceType::Active)
    }
}

impl std::fmt::Display for InstanceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceType::Active => write!(f, "Active"),
            InstanceType::Standby => write!(f, "Standby"),
        }
    }
}

impl std::str::FromStr for InstanceType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(InstanceType::Active),
            "standby" => Ok(InstanceType::Standby),
            other => Err(format!("expected Active or Standby, got '{}'", other)),
        }
    }
}

/// A member of an HA relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub uuid: Uuid,
    #[serde(default)]
    pub config_uuid: Option<Uuid>,
    #[serde(default)]
    pub address: String,
    pub is_leader: bool,
    pub is_local: bool,
    #[serde(default)]
    pub last_backup: Option<DateTime<Utc>>,
}

impl Instance {
    pub fn instance_type(&self) -> InstanceType {
        InstanceType::from_is_leader(self.is_leader)
    }
}

/// HA relationship between platform instances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationConfig {
    pub uuid: Uuid,
    pub cluster_key: String,
    #[serde(default)]
    pub instances: Vec<Instance>,
}

impl ReplicationConfig {
    /// The member corresponding to the current node
    pub fn local_instance(&self) -> Option<&Instance> {
        self.instances.iter().find(|i| i.is_local)
    }
}

/// Periodic replication job definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationSchedule {
    pub frequency_milliseconds: u64,
    pub is_running: bool,
}

/// Response of the key generation endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedKey {
    pub cluster_key: String,
}
