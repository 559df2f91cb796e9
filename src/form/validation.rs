//! Form Validation
//!
//! Declarative, cross-field validation rules. Each rule names the field it
//! reports on, the fields whose values it reads, and a predicate over the
//! whole snapshot. A change to any trigger field re-evaluates the rule.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::values::{FormField, FormValues, FREQUENCY_MULTIPLIER, MAX_FREQUENCY_MINUTES};

const REQUIRED: &str = "Required field";
const INVALID_URL: &str = "Should be a valid URL";
const MIN_FREQUENCY: i64 = 1;

static ADDRESS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(http|https)://.+").expect("valid address pattern"));

/// Field-level error messages; an absent field is valid
pub type ValidationErrors = BTreeMap<FormField, String>;

/// A single validation rule
pub struct ValidationRule {
    /// Field the error is reported on
    pub field: FormField,
    /// Fields the predicate reads
    pub triggers: &'static [FormField],
    /// Returns an error message when the snapshot violates the rule
    pub check: fn(&FormValues) -> Option<String>,
}

impl ValidationRule {
    pub fn is_triggered_by(&self, field: FormField) -> bool {
        self.triggers.contains(&field)
    }
}

pub static RULES: &[ValidationRule] = &[
    ValidationRule {
        field: FormField::InstanceAddress,
        triggers: &[FormField::InstanceAddress],
        check: check_instance_address,
    },
    ValidationRule {
        field: FormField::ClusterKey,
        triggers: &[FormField::ClusterKey],
        check: check_cluster_key,
    },
    ValidationRule {
        field: FormField::ReplicationFrequency,
        triggers: &[
            FormField::InstanceType,
            FormField::ReplicationEnabled,
            FormField::ReplicationFrequency,
        ],
        check: check_replication_frequency,
    },
];

fn check_instance_address(values: &FormValues) -> Option<String> {
    if values.instance_address.is_empty() {
        Some(REQUIRED.to_string())
    } else if !ADDRESS_PATTERN.is_match(&values.instance_address) {
        Some(INVALID_URL.to_string())
    } else {
        None
    }
}

fn check_cluster_key(values: &FormValues) -> Option<String> {
    values.cluster_key.is_empty().then(|| REQUIRED.to_string())
}

fn check_replication_frequency(values: &FormValues) -> Option<String> {
    // Only an Active instance with replication turned on uses the frequency
    if !(values.instance_type.is_active() && values.replication_enabled) {
        return None;
    }

    let minimum = || Some(format!("Minimum value is {}", MIN_FREQUENCY));
    match values.replication_frequency {
        None => return Some(REQUIRED.to_string()),
        Some(minutes) if minutes < MIN_FREQUENCY => return minimum(),
        Some(_) => {}
    }

    // A loaded schedule is checked at its exact value
    match values.frequency_ms() {
        Some(ms) if ms < FREQUENCY_MULTIPLIER => minimum(),
        Some(_) => None,
        None => Some(format!("Maximum value is {}", MAX_FREQUENCY_MINUTES)),
    }
}

/// Evaluate every rule against the snapshot
pub fn validate(values: &FormValues) -> ValidationErrors {
    RULES
        .iter()
        .filter_map(|rule| (rule.check)(values).map(|msg| (rule.field, msg)))
        .collect()
}

/// Re-evaluate the rules triggered by a change to `changed`, updating `errors` in place.
///
/// Returns the fields whose rules were evaluated.
pub fn revalidate(values: &FormValues, changed: FormField, errors: &mut ValidationErrors) -> Vec<FormField> {
    let mut evaluated = Vec::new();

    for rule in RULES.iter().filter(|r| r.is_triggered_by(changed)) {
        match (rule.check)(values) {
            Some(msg) => errors.insert(rule.field, msg),
            None => errors.remove(&rule.field),
        };
        evaluated.push(rule.field);
    }

    evaluated
}
