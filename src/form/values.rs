//! Form Values
//!
//! The transient field snapshot edited by the operator, and its derivation
//! from either configured defaults or an existing HA configuration.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::WolfHaConfig;
use crate::error::{Error, Result};
use crate::model::{InstanceType, ReplicationConfig, ReplicationSchedule};

/// Milliseconds per minute of replication frequency
pub const FREQUENCY_MULTIPLIER: u64 = 60_000;

/// Largest frequency in minutes whose millisecond value fits a `u64`
pub const MAX_FREQUENCY_MINUTES: i64 = (u64::MAX / FREQUENCY_MULTIPLIER) as i64;

/// Names of the form fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormField {
    ConfigId,
    InstanceType,
    InstanceAddress,
    ReplicationFrequency,
    ClusterKey,
    ReplicationEnabled,
}

impl FormField {
    pub const ALL: [FormField; 6] = [
        FormField::ConfigId,
        FormField::InstanceType,
        FormField::InstanceAddress,
        FormField::ReplicationFrequency,
        FormField::ClusterKey,
        FormField::ReplicationEnabled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FormField::ConfigId => "configId",
            FormField::InstanceType => "instanceType",
            FormField::InstanceAddress => "instanceAddress",
            FormField::ReplicationFrequency => "replicationFrequency",
            FormField::ClusterKey => "clusterKey",
            FormField::ReplicationEnabled => "replicationEnabled",
        }
    }

    /// Fields that describe the HA relationship itself and cannot change once it exists
    pub fn is_identity(&self) -> bool {
        matches!(
            self,
            FormField::ConfigId
                | FormField::InstanceType
                | FormField::InstanceAddress
                | FormField::ClusterKey
        )
    }
}

impl std::fmt::Display for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FormField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FormField::ALL
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownField(s.to_string()))
    }
}

/// Initial values for a form with no existing configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormDefaults {
    pub instance_address: String,
    pub replication_frequency: i64,
    pub replication_enabled: bool,
}

impl From<&WolfHaConfig> for FormDefaults {
    fn from(config: &WolfHaConfig) -> Self {
        Self {
            instance_address: config.default_instance_address(),
            replication_frequency: config.form.default_replication_frequency_minutes,
            replication_enabled: config.form.default_replication_enabled,
        }
    }
}

/// Current field values of the replication form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormValues {
    /// Empty until a configuration exists
    pub config_id: Option<Uuid>,
    pub instance_type: InstanceType,
    pub instance_address: String,
    /// Minutes; `None` when the operator cleared the field
    pub replication_frequency: Option<i64>,
    /// Exact schedule frequency the form was loaded with. Cleared once the
    /// operator edits the frequency, so an untouched schedule is sent back
    /// unchanged even when it is not a whole number of minutes.
    pub loaded_frequency_ms: Option<u64>,
    pub cluster_key: String,
    pub replication_enabled: bool,
}

impl FormValues {
    /// Values for create mode
    pub fn from_defaults(defaults: &FormDefaults) -> Self {
        Self {
            config_id: None,
            instance_type: InstanceType::Active,
            instance_address: defaults.instance_address.clone(),
            replication_frequency: Some(defaults.replication_frequency),
            loaded_frequency_ms: None,
            cluster_key: String::new(),
            replication_enabled: defaults.replication_enabled,
        }
    }

    /// Values for edit mode, or `None` when the config has no local member
    pub fn from_existing(config: &ReplicationConfig, schedule: &ReplicationSchedule) -> Option<Self> {
        let instance = config.local_instance()?;

        Some(Self {
            config_id: Some(config.uuid),
            instance_type: instance.instance_type(),
            instance_address: instance.address.clone(),
            replication_frequency: Some(millis_to_minutes(schedule.frequency_milliseconds)),
            loaded_frequency_ms: Some(schedule.frequency_milliseconds),
            cluster_key: config.cluster_key.clone(),
            replication_enabled: schedule.is_running,
        })
    }

    /// Replication frequency in milliseconds, if one is set
    pub fn frequency_ms(&self) -> Option<u64> {
        self.loaded_frequency_ms
            .or_else(|| self.replication_frequency.and_then(minutes_to_millis))
    }

    /// Frequency as shown to the operator, in minutes
    pub fn frequency_label(&self) -> String {
        match (self.frequency_ms(), self.replication_frequency) {
            (Some(ms), _) => format_minutes(ms),
            (None, Some(minutes)) => minutes.to_string(),
            (None, None) => "-".to_string(),
        }
    }

    /// Parse `raw` and assign it to `field`
    pub fn apply(&mut self, field: FormField, raw: &str) -> Result<()> {
        let invalid = |reason: String| Error::InvalidFieldValue {
            field: field.to_string(),
            reason,
        };
        let raw_trimmed = raw.trim();

        match field {
            FormField::ConfigId => {
                self.config_id = if raw_trimmed.is_empty() {
                    None
                } else {
                    Some(raw_trimmed.parse::<Uuid>().map_err(|e| invalid(e.to_string()))?)
                };
            }
            FormField::InstanceType => {
                self.instance_type = raw_trimmed.parse().map_err(invalid)?;
            }
            FormField::InstanceAddress => self.instance_address = raw.to_string(),
            FormField::ReplicationFrequency => {
                self.replication_frequency = if raw_trimmed.is_empty() {
                    None
                } else {
                    Some(raw_trimmed.parse::<i64>().map_err(|_| invalid("expected a whole number of minutes".into()))?)
                };
                self.loaded_frequency_ms = None;
            }
            FormField::ClusterKey => self.cluster_key = raw.to_string(),
            FormField::ReplicationEnabled => {
                self.replication_enabled = match raw_trimmed.to_ascii_lowercase().as_str() {
                    "true" | "on" | "yes" | "1" => true,
                    "false" | "off" | "no" | "0" => false,
                    _ => return Err(invalid("expected true or false".into())),
                };
            }
        }

        Ok(())
    }
}

/// Convert operator-facing minutes to schedule milliseconds
pub fn minutes_to_millis(minutes: i64) -> Option<u64> {
    u64::try_from(minutes).ok()?.checked_mul(FREQUENCY_MULTIPLIER)
}

/// Convert schedule milliseconds to whole operator-facing minutes.
///
/// Frequencies that are not a whole number of minutes are rounded to the
/// nearest minute for editing; the exact value is kept in
/// `FormValues::loaded_frequency_ms`.
pub fn millis_to_minutes(millis: u64) -> i64 {
    if millis % FREQUENCY_MULTIPLIER != 0 {
        tracing::debug!(
            "Replication frequency {}ms is not a whole number of minutes",
            millis
        );
    }
    let minutes = millis.saturating_add(FREQUENCY_MULTIPLIER / 2) / FREQUENCY_MULTIPLIER;
    i64::try_from(minutes).unwrap_or(i64::MAX)
}

/// Render milliseconds as minutes, keeping up to three decimals
pub fn format_minutes(millis: u64) -> String {
    let whole = millis / FREQUENCY_MULTIPLIER;
    let rem = millis % FREQUENCY_MULTIPLIER;
    if rem == 0 {
        return whole.to_string();
    }
    let fraction = format!("{:03}", rem / 60);
    match fraction.trim_end_matches('0') {
        "" => whole.to_string(),
        digits => format!("{}.{}", whole, digits),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Instance;

    fn defaults() -> FormDefaults {
        FormDefaults {
            instance_address: "http://127.0.0.1:9000".into(),
            replication_frequency: 1,
            replication_enabled: true,
        }
    }

    fn config_with_local(is_leader: bool) -> ReplicationConfig {
        ReplicationConfig {
            uuid: Uuid::new_v4(),
            cluster_key: "shared-key".into(),
            instances: vec![
                Instance {
                    uuid: Uuid::new_v4(),
                    config_uuid: None,
                    address: "https://peer.example.com".into(),
                    is_leader: !is_leader,
                    is_local: false,
                    last_backup: None,
                },
                Instance {
                    uuid: Uuid::new_v4(),
                    config_uuid: None,
                    address: "https://local.example.com".into(),
                    is_leader,
                    is_local: true,
                    last_backup: None,
                },
            ],
        }
    }

    #[test]
    fn test_defaults() {
        let values = FormValues::from_defaults(&defaults());
        assert_eq!(values.config_id, None);
        assert_eq!(values.instance_type, InstanceType::Active);
        assert_eq!(values.replication_frequency, Some(1));
        assert!(values.cluster_key.is_empty());
        assert!(values.replication_enabled);
    }

    #[test]
    fn test_from_existing_converts_frequency() {
        let config = config_with_local(true);
        let schedule = ReplicationSchedule {
            frequency_milliseconds: 120_000,
            is_running: false,
        };

        let values = FormValues::from_existing(&config, &schedule).unwrap();
        assert_eq!(values.config_id, Some(config.uuid));
        assert_eq!(values.instance_type, InstanceType::Active);
        assert_eq!(values.instance_address, "https://local.example.com");
        assert_eq!(values.cluster_key, "shared-key");
        assert_eq!(values.replication_frequency, Some(2));
        assert!(!values.replication_enabled);
        assert_eq!(values.frequency_ms(), Some(120_000));
    }

    #[test]
    fn test_from_existing_standby_and_missing_local() {
        let schedule = ReplicationSchedule {
            frequency_milliseconds: 60_000,
            is_running: false,
        };
        let values = FormValues::from_existing(&config_with_local(false), &schedule).unwrap();
        assert_eq!(values.instance_type, InstanceType::Standby);

        let mut config = config_with_local(true);
        config.instances.retain(|i| !i.is_local);
        assert!(FormValues::from_existing(&config, &schedule).is_none());
    }

    #[test]
    fn test_frequency_conversion_is_invertible() {
        for minutes in [1, 2, 15, 60, 1440] {
            let millis = minutes_to_millis(minutes).unwrap();
            assert_eq!(millis_to_minutes(millis), minutes);
        }
        assert_eq!(minutes_to_millis(-1), None);
        assert_eq!(minutes_to_millis(MAX_FREQUENCY_MINUTES + 1), None);
        assert!(minutes_to_millis(MAX_FREQUENCY_MINUTES).is_some());
        assert_eq!(millis_to_minutes(90_000), 2);
    }

    #[test]
    fn test_loaded_frequency_kept_until_edited() {
        let config = config_with_local(true);
        let schedule = ReplicationSchedule {
            frequency_milliseconds: 90_000,
            is_running: true,
        };

        let mut values = FormValues::from_existing(&config, &schedule).unwrap();
        assert_eq!(values.frequency_ms(), Some(90_000));
        assert_eq!(values.frequency_label(), "1.5");

        values.apply(FormField::ReplicationEnabled, "false").unwrap();
        assert_eq!(values.frequency_ms(), Some(90_000));

        values.apply(FormField::ReplicationFrequency, "2").unwrap();
        assert_eq!(values.loaded_frequency_ms, None);
        assert_eq!(values.frequency_ms(), Some(120_000));
        assert_eq!(values.frequency_label(), "2");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(60_000), "1");
        assert_eq!(format_minutes(90_000), "1.5");
        assert_eq!(format_minutes(20_000), "0.333");
        assert_eq!(format_minutes(61_000), "1.016");
        assert_eq!(format_minutes(60_030), "1");
    }

    #[test]
    fn test_apply_parses_fields() {
        let mut values = FormValues::from_defaults(&defaults());

        values.apply(FormField::InstanceType, "standby").unwrap();
        values.apply(FormField::ReplicationFrequency, "").unwrap();
        values.apply(FormField::ReplicationEnabled, "off").unwrap();
        values.apply(FormField::ClusterKey, "k3y").unwrap();

        assert_eq!(values.instance_type, InstanceType::Standby);
        assert_eq!(values.replication_frequency, None);
        assert!(!values.replication_enabled);
        assert_eq!(values.cluster_key, "k3y");

        assert!(values.apply(FormField::ReplicationFrequency, "often").is_err());
        assert!(values.apply(FormField::ConfigId, "not-a-uuid").is_err());
    }

    #[test]
    fn test_field_names() {
        assert_eq!("clusterKey".parse::<FormField>().unwrap(), FormField::ClusterKey);
        assert_eq!("replicationfrequency".parse::<FormField>().unwrap(), FormField::ReplicationFrequency);
        assert!(matches!("color".parse::<FormField>(), Err(Error::UnknownField(_))));
    }
}
