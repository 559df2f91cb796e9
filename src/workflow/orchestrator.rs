//! Workflow Orchestrator
//!
//! Runs a submitted form snapshot as a strictly sequential series of API
//! steps. Each step finishes before the next starts, since later steps use
//! the configuration ID produced by earlier ones. A failed step aborts the
//! rest; completed steps are not rolled back.

use std::sync::Arc;

use uuid::Uuid;

use super::plan::{plan, Step};
use crate::api::HaApi;
use crate::cache::{QueryCache, QueryKey};
use crate::error::{Error, Result};
use crate::form::{
    FormDefaults, FormField, FormMode, FormStateManager, FormValues, SubmitAttempt, ValidationErrors,
};
use crate::model::{ReplicationConfig, ReplicationSchedule};
use crate::notify::{NotificationSink, Severity};

/// Terminal result of a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// All steps completed; cached HA queries were invalidated
    Succeeded { config_id: Uuid },
    /// A step was rejected; the form is editable again
    Failed,
    /// Field errors blocked the submission before any API call
    Invalid(ValidationErrors),
}

/// Current HA state as seen by the read views
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HaView {
    pub config: Option<ReplicationConfig>,
    pub schedule: Option<ReplicationSchedule>,
}

/// State carried between steps
struct Submission {
    values: FormValues,
    config_id: Option<Uuid>,
}

impl Submission {
    fn config_id(&self, step: Step) -> Result<Uuid> {
        self.config_id.ok_or(Error::MissingConfigId(step.as_str()))
    }
}

/// Drives form submissions against the HA API
pub struct WorkflowOrchestrator {
    api: Arc<dyn HaApi>,
    notifier: Arc<dyn NotificationSink>,
    cache: Arc<dyn QueryCache>,
}

impl WorkflowOrchestrator {
    pub fn new(
        api: Arc<dyn HaApi>,
        notifier: Arc<dyn NotificationSink>,
        cache: Arc<dyn QueryCache>,
    ) -> Self {
        Self { api, notifier, cache }
    }

    /// Fetch the HA configuration and its schedule
    pub async fn fetch_view(&self) -> Result<HaView> {
        let config = self.api.get_config().await?;
        let schedule = match &config {
            Some(c) => self.api.get_schedule(c.uuid).await?,
            None => None,
        };
        Ok(HaView { config, schedule })
    }

    /// Open the form for the node's current HA state
    pub async fn open_form(&self, defaults: &FormDefaults) -> Result<FormStateManager> {
        let view = self.fetch_view().await?;
        Ok(FormStateManager::load(
            view.config.as_ref(),
            view.schedule.as_ref(),
            defaults,
            self.notifier.as_ref(),
        ))
    }

    /// Fetch a new cluster key into the form's `clusterKey` field
    pub async fn generate_key(&self, form: &mut FormStateManager) -> Result<()> {
        if !form.can_generate_key() {
            return Err(Error::KeyGenerationUnavailable);
        }

        let key = self.api.generate_key().await.map_err(|e| {
            tracing::warn!("Cluster key generation failed: {}", e);
            e
        })?;

        form.set_field(FormField::ClusterKey, &key)
    }

    /// Validate and submit the form.
    ///
    /// Returns an error only when the form cannot start a submission at all.
    /// API failures are reported through the notification sink and yield
    /// `SubmitOutcome::Failed`.
    pub async fn submit(&self, form: &mut FormStateManager) -> Result<SubmitOutcome> {
        let mode = form.mode();
        let values = match form.begin_submit()? {
            SubmitAttempt::Ready(values) => values,
            SubmitAttempt::Invalid(errors) => {
                tracing::debug!("Submission blocked by {} invalid field(s)", errors.len());
                return Ok(SubmitOutcome::Invalid(errors));
            }
        };

        let steps = plan(mode, &values);
        tracing::info!(
            "Submitting HA replication configuration ({} mode, {} instance, {} step(s))",
            mode,
            values.instance_type,
            steps.len()
        );

        let mut submission = Submission {
            config_id: values.config_id,
            values,
        };

        match self.execute(&steps, &mut submission).await {
            Ok(config_id) => {
                self.cache.invalidate(QueryKey::HaConfig);
                self.cache.invalidate(QueryKey::HaReplicationSchedule);
                form.finish_submit(true);

                tracing::info!("HA replication configuration {} {}", config_id, completed_verb(mode));
                self.notifier.notify(
                    Severity::Success,
                    &format!("Replication configuration {}", completed_verb(mode)),
                );
                Ok(SubmitOutcome::Succeeded { config_id })
            }
            Err(e) => {
                tracing::error!("HA replication submission failed: {}", e);
                self.notifier.notify(Severity::Error, &failure_message(mode));
                form.finish_submit(false);
                Ok(SubmitOutcome::Failed)
            }
        }
    }

    async fn execute(&self, steps: &[Step], submission: &mut Submission) -> Result<Uuid> {
        for step in steps {
            tracing::debug!("Running step {}", step);
            self.run_step(*step, submission).await?;
        }
        submission
            .config_id
            .ok_or(Error::Internal("submission finished without a configuration".into()))
    }

    async fn run_step(&self, step: Step, submission: &mut Submission) -> Result<()> {
        let values = &submission.values;

        match step {
            Step::CreateConfig => {
                let config = self.api.create_config(&values.cluster_key).await?;
                submission.config_id = Some(config.uuid);
            }
            Step::CreateInstance => {
                let config_id = submission.config_id(step)?;
                self.api
                    .create_instance(
                        config_id,
                        &values.instance_address,
                        values.instance_type.is_active(),
                        true,
                    )
                    .await?;
            }
            Step::EnableReplication => {
                let config_id = submission.config_id(step)?;
                let frequency_ms = values.frequency_ms().ok_or_else(|| Error::InvalidFieldValue {
                    field: FormField::ReplicationFrequency.to_string(),
                    reason: "a positive frequency is required to enable replication".into(),
                })?;
                self.api.enable_replication(config_id, frequency_ms).await?;
            }
            Step::DisableReplication => {
                let config_id = submission.config_id(step)?;
                self.api.disable_replication(config_id).await?;
            }
        }

        Ok(())
    }
}

fn failure_message(mode: FormMode) -> String {
    let action = match mode {
        FormMode::Create => "creating",
        FormMode::Edit => "editing",
    };
    format!("Error on {} replication configuration", action)
}

fn completed_verb(mode: FormMode) -> &'static str {
    match mode {
        FormMode::Create => "created",
        FormMode::Edit => "saved",
    }
}
