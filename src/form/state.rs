//! Form State Management
//!
//! Owns the replication form's values, validation results and submission
//! phase. Edits arrive through `set_field`, which is the same entry point
//! used by flows outside operator input such as key generation. A key typed
//! by the operator goes through `enter_cluster_key` instead.

use crate::error::{Error, Result};
use crate::model::{InstanceType, ReplicationConfig, ReplicationSchedule};
use crate::notify::{NotificationSink, Severity};

use super::validation::{self, ValidationErrors};
use super::values::{FormDefaults, FormField, FormValues};

const MISSING_LOCAL_INSTANCE: &str = "Can't find an HA platform instance with is_local = true";

/// Shown while creating a Standby instance
pub const STANDBY_NOTICE: &str = "Note: on standby instances you can only access the high \
availability configuration and other features won't be available until the configuration is deleted.";

/// Whether the form creates a new HA relationship or edits an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

impl std::fmt::Display for FormMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormMode::Create => write!(f, "create"),
            FormMode::Edit => write!(f, "edit"),
        }
    }
}

/// Submission phase of the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitPhase {
    /// Editable, nothing submitted yet
    Idle,
    /// Snapshot is being checked
    Validating,
    /// Workflow is running; edits are frozen
    Submitting,
    /// Workflow completed; the form hands back to the view
    Succeeded,
    /// Workflow aborted; editable again with values retained
    Failed,
}

/// Result of asking the form to start a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAttempt {
    /// Snapshot to hand to the workflow
    Ready(FormValues),
    /// Submission blocked by field errors
    Invalid(ValidationErrors),
}

/// Replication form state
#[derive(Debug, Clone)]
pub struct FormStateManager {
    mode: FormMode,
    initial: FormValues,
    values: FormValues,
    errors: ValidationErrors,
    phase: SubmitPhase,
}

impl FormStateManager {
    fn with_values(mode: FormMode, values: FormValues) -> Self {
        let errors = validation::validate(&values);
        Self {
            mode,
            initial: values.clone(),
            values,
            errors,
            phase: SubmitPhase::Idle,
        }
    }

    /// Form for a node without an HA configuration
    pub fn create(defaults: &FormDefaults) -> Self {
        Self::with_values(FormMode::Create, FormValues::from_defaults(defaults))
    }

    /// Form for the current server state.
    ///
    /// The form is in edit mode only when both a configuration and its
    /// schedule exist; otherwise it starts from the defaults in create mode.
    /// If the configuration has no local member the defaults are shown and a
    /// warning is raised.
    pub fn load(
        config: Option<&ReplicationConfig>,
        schedule: Option<&ReplicationSchedule>,
        defaults: &FormDefaults,
        notifier: &dyn NotificationSink,
    ) -> Self {
        let (config, schedule) = match (config, schedule) {
            (Some(config), Some(schedule)) => (config, schedule),
            (Some(config), None) => {
                tracing::warn!(
                    "HA configuration {} has no replication schedule, opening in create mode",
                    config.uuid
                );
                return Self::create(defaults);
            }
            (None, _) => return Self::create(defaults),
        };

        match FormValues::from_existing(config, schedule) {
            Some(values) => Self::with_values(FormMode::Edit, values),
            None => {
                notifier.notify(Severity::Warning, MISSING_LOCAL_INSTANCE);
                let mut values = FormValues::from_defaults(defaults);
                values.config_id = Some(config.uuid);
                Self::with_values(FormMode::Edit, values)
            }
        }
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn phase(&self) -> SubmitPhase {
        self.phase
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn error(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.values != self.initial
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.phase, SubmitPhase::Validating | SubmitPhase::Submitting)
    }

    pub fn is_editable(&self) -> bool {
        matches!(self.phase, SubmitPhase::Idle | SubmitPhase::Failed)
    }

    pub fn can_submit(&self) -> bool {
        self.is_editable() && self.is_valid()
    }

    /// Whether `field` can be changed in the current mode
    pub fn is_read_only(&self, field: FormField) -> bool {
        self.mode == FormMode::Edit && field.is_identity()
    }

    /// Key generation is offered for a new Active instance only
    pub fn can_generate_key(&self) -> bool {
        self.mode == FormMode::Create
            && self.values.instance_type == InstanceType::Active
            && self.is_editable()
    }

    pub fn standby_notice(&self) -> Option<&'static str> {
        (self.mode == FormMode::Create && self.values.instance_type == InstanceType::Standby)
            .then_some(STANDBY_NOTICE)
    }

    /// Set a field from its textual value and re-run the rules it triggers
    pub fn set_field(&mut self, field: FormField, raw: &str) -> Result<()> {
        match self.phase {
            SubmitPhase::Validating | SubmitPhase::Submitting => return Err(Error::SubmitInProgress),
            SubmitPhase::Succeeded => return Err(Error::AlreadySubmitted),
            SubmitPhase::Idle | SubmitPhase::Failed => {}
        }
        if self.is_read_only(field) {
            return Err(Error::ReadOnlyField(field.to_string()));
        }

        self.values.apply(field, raw)?;
        let evaluated = validation::revalidate(&self.values, field, &mut self.errors);
        tracing::debug!("Field {} updated, re-validated {:?}", field, evaluated);

        Ok(())
    }

    /// Set the shared key typed by the operator.
    ///
    /// A new Active instance must use a generated key.
    pub fn enter_cluster_key(&mut self, key: &str) -> Result<()> {
        if self.mode == FormMode::Create && self.values.instance_type == InstanceType::Active {
            return Err(Error::GeneratedKeyRequired);
        }
        self.set_field(FormField::ClusterKey, key)
    }

    /// Validate the snapshot and, if it passes, freeze edits for submission
    pub fn begin_submit(&mut self) -> Result<SubmitAttempt> {
        match self.phase {
            SubmitPhase::Validating | SubmitPhase::Submitting => return Err(Error::SubmitInProgress),
            SubmitPhase::Succeeded => return Err(Error::AlreadySubmitted),
            SubmitPhase::Idle | SubmitPhase::Failed => {}
        }

        self.transition(SubmitPhase::Validating);
        self.errors = validation::validate(&self.values);

        if !self.errors.is_empty() {
            self.transition(SubmitPhase::Idle);
            return Ok(SubmitAttempt::Invalid(self.errors.clone()));
        }

        self.transition(SubmitPhase::Submitting);
        Ok(SubmitAttempt::Ready(self.values.clone()))
    }

    /// Unfreeze the form after the workflow finished
    pub fn finish_submit(&mut self, succeeded: bool) {
        if succeeded {
            self.transition(SubmitPhase::Succeeded);
        } else {
            self.transition(SubmitPhase::Failed);
        }
    }

    /// Discard edits to an existing configuration and restore the values
    /// the form was opened with
    pub fn cancel(&mut self) -> Result<()> {
        if self.mode != FormMode::Edit {
            return Err(Error::CancelUnavailable);
        }
        match self.phase {
            SubmitPhase::Validating | SubmitPhase::Submitting => return Err(Error::SubmitInProgress),
            SubmitPhase::Succeeded => return Err(Error::AlreadySubmitted),
            SubmitPhase::Idle | SubmitPhase::Failed => {}
        }
        self.values = self.initial.clone();
        self.errors = validation::validate(&self.values);
        self.transition(SubmitPhase::Idle);
        Ok(())
    }

    fn transition(&mut self, to: SubmitPhase) {
        tracing::debug!("Form ({}) {:?} -> {:?}", self.mode, self.phase, to);
        self.phase = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_config, RecordingSink};

    fn defaults() -> FormDefaults {
        FormDefaults {
            instance_address: "http://127.0.0.1:9000".into(),
            replication_frequency: 1,
            replication_enabled: true,
        }
    }

    #[test]
    fn test_create_mode_starts_invalid_without_key() {
        let form = FormStateManager::create(&defaults());
        assert_eq!(form.mode(), FormMode::Create);
        assert_eq!(form.error(FormField::ClusterKey), Some("Required field"));
        assert!(!form.can_submit());
        assert!(form.can_generate_key());
        assert!(!form.is_dirty());
    }

    #[test]
    fn test_set_field_updates_validity() {
        let mut form = FormStateManager::create(&defaults());
        form.set_field(FormField::ClusterKey, "abc").unwrap();
        assert!(form.is_valid());
        assert!(form.is_dirty());

        form.set_field(FormField::ReplicationFrequency, "0").unwrap();
        assert_eq!(form.error(FormField::ReplicationFrequency), Some("Minimum value is 1"));

        // Disabling replication lifts the frequency rule without touching the field
        form.set_field(FormField::ReplicationEnabled, "false").unwrap();
        assert!(form.is_valid());
    }

    #[test]
    fn test_standby_notice_and_key_generation() {
        let mut form = FormStateManager::create(&defaults());
        assert!(form.standby_notice().is_none());

        form.set_field(FormField::InstanceType, "Standby").unwrap();
        assert_eq!(form.standby_notice(), Some(STANDBY_NOTICE));
        assert!(!form.can_generate_key());
    }

    #[test]
    fn test_load_edit_mode() {
        let sink = RecordingSink::default();
        let (config, schedule) = sample_config(true, 120_000, true);

        let form = FormStateManager::load(Some(&config), Some(&schedule), &defaults(), &sink);
        assert_eq!(form.mode(), FormMode::Edit);
        assert_eq!(form.values().replication_frequency, Some(2));
        assert_eq!(form.values().config_id, Some(config.uuid));
        assert!(form.is_valid());
        assert!(form.standby_notice().is_none());
        assert!(!form.can_generate_key());
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn test_edit_mode_identity_fields_are_read_only() {
        let sink = RecordingSink::default();
        let (config, schedule) = sample_config(true, 60_000, true);
        let mut form = FormStateManager::load(Some(&config), Some(&schedule), &defaults(), &sink);

        for field in [
            FormField::InstanceType,
            FormField::InstanceAddress,
            FormField::ClusterKey,
            FormField::ConfigId,
        ] {
            assert!(matches!(form.set_field(field, "x"), Err(Error::ReadOnlyField(_))));
        }

        form.set_field(FormField::ReplicationEnabled, "false").unwrap();
        form.set_field(FormField::ReplicationFrequency, "10").unwrap();
        assert_eq!(form.values().frequency_ms(), Some(600_000));
    }

    #[test]
    fn test_load_without_local_instance_falls_back() {
        let sink = RecordingSink::default();
        let (mut config, schedule) = sample_config(true, 300_000, false);
        config.instances.iter_mut().for_each(|i| i.is_local = false);

        let form = FormStateManager::load(Some(&config), Some(&schedule), &defaults(), &sink);

        assert_eq!(form.values().instance_address, "http://127.0.0.1:9000");
        assert_eq!(form.values().replication_frequency, Some(1));
        assert_eq!(form.values().config_id, Some(config.uuid));
        assert_eq!(
            sink.messages(),
            vec![(Severity::Warning, MISSING_LOCAL_INSTANCE.to_string())]
        );
    }

    #[test]
    fn test_load_without_config_is_create_mode() {
        let sink = RecordingSink::default();
        let form = FormStateManager::load(None, None, &defaults(), &sink);
        assert_eq!(form.mode(), FormMode::Create);
    }

    #[test]
    fn test_load_config_without_schedule_is_create_mode() {
        let sink = RecordingSink::default();
        let (config, _) = sample_config(false, 60_000, false);

        let form = FormStateManager::load(Some(&config), None, &defaults(), &sink);
        assert_eq!(form.mode(), FormMode::Create);
        assert_eq!(form.values().config_id, None);
        assert_eq!(form.values().instance_type, InstanceType::Active);
        assert!(form.can_generate_key());
    }

    #[test]
    fn test_load_keeps_exact_frequency() {
        let sink = RecordingSink::default();
        let (config, schedule) = sample_config(true, 90_000, true);

        let form = FormStateManager::load(Some(&config), Some(&schedule), &defaults(), &sink);
        assert_eq!(form.values().frequency_ms(), Some(90_000));
        assert!(form.is_valid());
        assert!(!form.is_dirty());
    }

    #[test]
    fn test_operator_key_rejected_for_new_active() {
        let mut form = FormStateManager::create(&defaults());
        assert!(matches!(form.enter_cluster_key("typed"), Err(Error::GeneratedKeyRequired)));
        assert!(form.values().cluster_key.is_empty());

        form.set_field(FormField::InstanceType, "Standby").unwrap();
        form.enter_cluster_key("typed").unwrap();
        assert_eq!(form.values().cluster_key, "typed");
        assert!(form.is_valid());
    }

    #[test]
    fn test_submit_lifecycle() {
        let mut form = FormStateManager::create(&defaults());

        let attempt = form.begin_submit().unwrap();
        assert!(matches!(attempt, SubmitAttempt::Invalid(ref e) if e.contains_key(&FormField::ClusterKey)));
        assert_eq!(form.phase(), SubmitPhase::Idle);

        form.set_field(FormField::ClusterKey, "key").unwrap();
        let attempt = form.begin_submit().unwrap();
        assert!(matches!(attempt, SubmitAttempt::Ready(_)));
        assert!(form.is_submitting());

        assert!(matches!(form.set_field(FormField::ClusterKey, "other"), Err(Error::SubmitInProgress)));
        assert!(matches!(form.begin_submit(), Err(Error::SubmitInProgress)));

        form.finish_submit(false);
        assert_eq!(form.phase(), SubmitPhase::Failed);
        assert!(!form.is_submitting());
        assert_eq!(form.values().cluster_key, "key");
        assert!(form.can_submit());

        assert!(matches!(form.begin_submit().unwrap(), SubmitAttempt::Ready(_)));
        form.finish_submit(true);
        assert!(matches!(form.begin_submit(), Err(Error::AlreadySubmitted)));
    }

    #[test]
    fn test_cancel_restores_loaded_values() {
        let sink = RecordingSink::default();
        let (config, schedule) = sample_config(true, 120_000, true);
        let mut form = FormStateManager::load(Some(&config), Some(&schedule), &defaults(), &sink);

        form.set_field(FormField::ReplicationFrequency, "0").unwrap();
        form.set_field(FormField::ReplicationEnabled, "false").unwrap();
        assert!(form.is_dirty());

        form.cancel().unwrap();
        assert!(!form.is_dirty());
        assert_eq!(form.values().frequency_ms(), Some(120_000));
        assert!(form.values().replication_enabled);
        assert!(form.is_valid());
    }

    #[test]
    fn test_cancel_unavailable_in_create_mode() {
        let mut form = FormStateManager::create(&defaults());
        form.set_field(FormField::InstanceAddress, "https://elsewhere").unwrap();

        assert!(matches!(form.cancel(), Err(Error::CancelUnavailable)));
        assert_eq!(form.values().instance_address, "https://elsewhere");
    }

    #[test]
    fn test_cancel_blocked_while_submitting() {
        let sink = RecordingSink::default();
        let (config, schedule) = sample_config(true, 60_000, true);
        let mut form = FormStateManager::load(Some(&config), Some(&schedule), &defaults(), &sink);

        assert!(matches!(form.begin_submit().unwrap(), SubmitAttempt::Ready(_)));
        assert!(matches!(form.cancel(), Err(Error::SubmitInProgress)));
    }
}
