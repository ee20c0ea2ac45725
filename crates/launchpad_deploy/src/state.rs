use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::fields::{FieldUpdate, Variant, WizardFields};
use crate::step_graph::{self, ENTRY_STEP, FINAL_STEP, Step};
use crate::validation::{self, FieldError};

/// What the wizard is doing, independent of which step is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WizardPhase {
    #[default]
    Idle,
    /// Pre-flight validation before a submission goes out.
    Validating,
    Submitting,
    Error,
    Success,
}

/// All data needed to render and drive the DRB deployment wizard.
///
/// Transitions are plain methods returning whether anything changed, so the
/// machine can be driven and inspected without any UI attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardState {
    pub variant: Variant,
    pub step: Step,
    pub fields: WizardFields,
    pub phase: WizardPhase,
    /// Last submission error; cleared by every successful transition.
    pub transient_error: Option<String>,
}

impl WizardState {
    /// A wizard at the first step with every field at its default.
    pub fn new() -> Self {
        Self {
            variant: Variant::default(),
            step: ENTRY_STEP,
            fields: WizardFields::default(),
            phase: WizardPhase::Idle,
            transient_error: None,
        }
    }

    /// Whether the current step's required fields are valid.
    pub fn can_advance(&self) -> bool {
        validation::can_advance(self.step, &self.fields)
    }

    /// Inline errors for the current step.
    pub fn current_errors(&self) -> Vec<FieldError> {
        validation::field_errors(self.step, &self.fields)
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.phase, WizardPhase::Validating | WizardPhase::Submitting)
    }

    /// Select the deployment variant. Only allowed on the first step; switching
    /// resets fields that belong to one variant only.
    pub fn set_variant(&mut self, variant: Variant) -> bool {
        if self.step != ENTRY_STEP {
            return false;
        }
        if self.variant != variant {
            debug!(from = ?self.variant, to = ?variant, "wizard variant changed");
            self.variant = variant;
            self.fields.reset_variant_exclusive();
        }
        self.transient_error = None;
        true
    }

    /// Apply a form edit. Edits are refused while a submission is in flight.
    pub fn set_field(&mut self, update: FieldUpdate) -> bool {
        if self.is_busy() {
            return false;
        }
        self.fields.apply(update);
        true
    }

    /// Move to the next step if the current one validates.
    pub fn advance_step(&mut self) -> bool {
        if self.is_busy() || !self.can_advance() {
            return false;
        }
        match step_graph::next_step(self.variant, self.step) {
            Some(next) => {
                self.step = next;
                self.transient_error = None;
                true
            }
            None => false,
        }
    }

    /// Move to the previous step. Entered values are kept.
    pub fn go_back(&mut self) -> bool {
        if self.step == Step::Error {
            return self.retry();
        }
        if self.is_busy() {
            return false;
        }
        match step_graph::prev_step(self.variant, self.step) {
            Some(prev) => {
                self.step = prev;
                self.transient_error = None;
                true
            }
            None => false,
        }
    }

    /// Enter `Deploying`. Only valid from the final data-entry step with valid
    /// fields and no submission already running.
    pub fn begin_submit(&mut self) -> bool {
        if self.step != FINAL_STEP || self.is_busy() || !self.can_advance() {
            return false;
        }
        self.step = Step::Deploying;
        self.phase = WizardPhase::Validating;
        self.transient_error = None;
        true
    }

    /// Pre-flight checks passed; the request is going out.
    pub fn mark_submitting(&mut self) {
        if self.step == Step::Deploying {
            self.phase = WizardPhase::Submitting;
        }
    }

    pub fn complete_submit(&mut self) {
        self.step = Step::Success;
        self.phase = WizardPhase::Success;
        self.transient_error = None;
    }

    pub fn fail_submit(&mut self, message: impl Into<String>) {
        self.step = Step::Error;
        self.phase = WizardPhase::Error;
        self.transient_error = Some(message.into());
    }

    /// From `Error`, return to the final data-entry step with all fields intact.
    pub fn retry(&mut self) -> bool {
        if self.step != Step::Error {
            return false;
        }
        self.step = FINAL_STEP;
        self.phase = WizardPhase::Idle;
        self.transient_error = None;
        true
    }

    /// Reset the wizard back to the first step with all fields cleared.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Zero-based index for the stepper component.
    pub fn step_index(&self) -> usize {
        step_graph::position(self.variant, self.step).unwrap_or(0)
    }

    /// Number of data-entry steps on the active path.
    pub fn step_count(&self) -> usize {
        step_graph::steps(self.variant).len()
    }
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_starts_at_mode() {
        let state = WizardState::new();
        assert_eq!(state.step, Step::Mode);
        assert_eq!(state.variant, Variant::Leader);
        assert_eq!(state.phase, WizardPhase::Idle);
        assert!(state.transient_error.is_none());
        assert_eq!(state, WizardState::default());
    }

    #[test]
    fn set_variant_only_on_first_step() {
        let mut state = WizardState::new();
        assert!(state.set_variant(Variant::Regular));
        assert!(state.advance_step());
        assert!(!state.set_variant(Variant::Leader));
        assert_eq!(state.variant, Variant::Regular);
    }

    #[test]
    fn begin_submit_requires_final_step() {
        let mut state = WizardState::new();
        assert!(!state.begin_submit());
        assert_eq!(state.step, Step::Mode);
    }

    #[test]
    fn retry_only_from_error() {
        let mut state = WizardState::new();
        assert!(!state.retry());
        state.fail_submit("boom");
        assert_eq!(state.transient_error.as_deref(), Some("boom"));
        assert!(state.retry());
        assert_eq!(state.step, Step::Database);
        assert!(state.transient_error.is_none());
    }

    #[test]
    fn serializes_without_secrets() {
        let mut state = WizardState::new();
        state.set_field(FieldUpdate::PrivateKey("cc".repeat(32)));
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"step\":\"mode\""));
        assert!(!json.contains(&"cc".repeat(32)));

        let restored: WizardState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.step, Step::Mode);
        assert!(restored.fields.config.private_key.is_empty());
    }
}
