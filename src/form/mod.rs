//! Replication Form
//!
//! Field values, validation rules and submission state of the HA
//! replication form.

mod state;
mod validation;
mod values;

pub use state::{FormMode, FormStateManager, SubmitAttempt, SubmitPhase, STANDBY_NOTICE};
pub use validation::{revalidate, validate, ValidationErrors, ValidationRule, RULES};
pub use values::{
    format_minutes, millis_to_minutes, minutes_to_millis, FormDefaults, FormField, FormValues,
    FREQUENCY_MULTIPLIER, MAX_FREQUENCY_MINUTES,
};
