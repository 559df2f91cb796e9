//! In-memory fakes shared by unit tests

use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::api::HaApi;
use crate::error::{Error, Result};
use crate::model::{Instance, ReplicationConfig, ReplicationSchedule};
use crate::notify::{NotificationSink, Severity};
use crate::workflow::Step;

/// A recorded API call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GenerateKey,
    GetConfig,
    GetSchedule(Uuid),
    CreateConfig(String),
    CreateInstance {
        config_id: Uuid,
        address: String,
        is_leader: bool,
        is_local: bool,
    },
    EnableReplication(Uuid, u64),
    DisableReplication(Uuid),
}

/// HA API fake that records calls and can reject one step
pub struct MockApi {
    calls: Mutex<Vec<Call>>,
    fail_on: Mutex<Option<Step>>,
    config_id: Uuid,
    existing: Option<(ReplicationConfig, ReplicationSchedule)>,
}

impl MockApi {
    pub const GENERATED_KEY: &'static str = "generated-cluster-key";

    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on: Mutex::new(None),
            config_id: Uuid::new_v4(),
            existing: None,
        }
    }

    pub fn failing_on(self, step: Step) -> Self {
        *self.fail_on.lock().unwrap() = Some(step);
        self
    }

    pub fn with_existing(mut self, config: ReplicationConfig, schedule: ReplicationSchedule) -> Self {
        self.existing = Some((config, schedule));
        self
    }

    pub fn clear_failure(&self) {
        *self.fail_on.lock().unwrap() = None;
    }

    pub fn created_config_id(&self) -> Uuid {
        self.config_id
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call, step: Option<Step>) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        match (step, *self.fail_on.lock().unwrap()) {
            (Some(step), Some(failing)) if step == failing => Err(Error::Api {
                status: 500,
                message: format!("{} rejected", step),
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl HaApi for MockApi {
    async fn generate_key(&self) -> Result<String> {
        self.record(Call::GenerateKey, None)?;
        Ok(Self::GENERATED_KEY.to_string())
    }

    async fn get_config(&self) -> Result<Option<ReplicationConfig>> {
        self.record(Call::GetConfig, None)?;
        Ok(self.existing.as_ref().map(|(c, _)| c.clone()))
    }

    async fn get_schedule(&self, config_id: Uuid) -> Result<Option<ReplicationSchedule>> {
        self.record(Call::GetSchedule(config_id), None)?;
        Ok(self.existing.as_ref().map(|(_, s)| *s))
    }

    async fn create_config(&self, cluster_key: &str) -> Result<ReplicationConfig> {
        self.record(Call::CreateConfig(cluster_key.to_string()), Some(Step::CreateConfig))?;
        Ok(ReplicationConfig {
            uuid: self.config_id,
            cluster_key: cluster_key.to_string(),
            instances: Vec::new(),
        })
    }

    async fn create_instance(
        &self,
        config_id: Uuid,
        address: &str,
        is_leader: bool,
        is_local: bool,
    ) -> Result<Instance> {
        self.record(
            Call::CreateInstance {
                config_id,
                address: address.to_string(),
                is_leader,
                is_local,
            },
            Some(Step::CreateInstance),
        )?;
        Ok(Instance {
            uuid: Uuid::new_v4(),
            config_uuid: Some(config_id),
            address: address.to_string(),
            is_leader,
            is_local,
            last_backup: None,
        })
    }

    async fn enable_replication(&self, config_id: Uuid, frequency_ms: u64) -> Result<()> {
        self.record(
            Call::EnableReplication(config_id, frequency_ms),
            Some(Step::EnableReplication),
        )
    }

    async fn disable_replication(&self, config_id: Uuid) -> Result<()> {
        self.record(Call::DisableReplication(config_id), Some(Step::DisableReplication))
    }
}

/// Notification sink that keeps every message
#[derive(Default)]
pub struct RecordingSink {
    messages: Mutex<Vec<(Severity, String)>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<(Severity, String)> {
        self.messages.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, severity: Severity, message: &str) {
        self.messages.lock().unwrap().push((severity, message.to_string()));
    }
}

/// A two-member configuration whose local member has the given role
pub fn sample_config(
    local_is_leader: bool,
    frequency_ms: u64,
    is_running: bool,
) -> (ReplicationConfig, ReplicationSchedule) {
    let uuid = Uuid::new_v4();
    let config = ReplicationConfig {
        uuid,
        cluster_key: "existing-key".into(),
        instances: vec![
            Instance {
                uuid: Uuid::new_v4(),
                config_uuid: Some(uuid),
                address: "https://local.example.com".into(),
                is_leader: local_is_leader,
                is_local: true,
                last_backup: None,
            },
            Instance {
                uuid: Uuid::new_v4(),
                config_uuid: Some(uuid),
                address: "https://peer.example.com".into(),
                is_leader: !local_is_leader,
                is_local: false,
                last_backup: None,
            },
        ],
    };
    let schedule = ReplicationSchedule {
        frequency_milliseconds: frequency_ms,
        is_running,
    };
    (config, schedule)
}
