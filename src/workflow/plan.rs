//! Submission Plans
//!
//! The ordered API steps for each (mode, role) combination. Adding a mode
//! means adding a table entry.

use crate::form::{FormMode, FormValues};
use crate::model::InstanceType;

/// One API operation in a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    CreateConfig,
    CreateInstance,
    EnableReplication,
    DisableReplication,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::CreateConfig => "createConfig",
            Step::CreateInstance => "createInstance",
            Step::EnableReplication => "enableReplication",
            Step::DisableReplication => "disableReplication",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// When a planned step runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Guard {
    Always,
    ReplicationEnabled,
    ReplicationDisabled,
}

impl Guard {
    fn holds(&self, values: &FormValues) -> bool {
        match self {
            Guard::Always => true,
            Guard::ReplicationEnabled => values.replication_enabled,
            Guard::ReplicationDisabled => !values.replication_enabled,
        }
    }
}

struct PlanEntry {
    mode: FormMode,
    /// `None` matches any role
    role: Option<InstanceType>,
    steps: &'static [(Step, Guard)],
}

static PLANS: &[PlanEntry] = &[
    PlanEntry {
        mode: FormMode::Create,
        role: Some(InstanceType::Active),
        steps: &[
            (Step::CreateConfig, Guard::Always),
            (Step::CreateInstance, Guard::Always),
            (Step::EnableReplication, Guard::ReplicationEnabled),
        ],
    },
    PlanEntry {
        mode: FormMode::Create,
        role: Some(InstanceType::Standby),
        steps: &[
            (Step::CreateConfig, Guard::Always),
            (Step::CreateInstance, Guard::Always),
        ],
    },
    // Only the schedule is mutable once the relationship exists
    PlanEntry {
        mode: FormMode::Edit,
        role: None,
        steps: &[
            (Step::EnableReplication, Guard::ReplicationEnabled),
            (Step::DisableReplication, Guard::ReplicationDisabled),
        ],
    },
];

/// Steps to execute, in order, for a submitted snapshot
pub fn plan(mode: FormMode, values: &FormValues) -> Vec<Step> {
    PLANS
        .iter()
        .find(|p| p.mode == mode && p.role.map_or(true, |r| r == values.instance_type))
        .map(|p| {
            p.steps
                .iter()
                .filter(|(_, guard)| guard.holds(values))
                .map(|(step, _)| *step)
                .collect()
        })
        .unwrap_or_default()
}
