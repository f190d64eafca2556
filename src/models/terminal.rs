//! Terminal flow state: the per-browser-session value driving the kiosk
//! state machine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

use super::enums::{Language, VisitType};

/// What the visitor came to the terminal to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FlowAction {
    Checkin,
    Checkout,
}

impl FlowAction {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "checkin" => Some(FlowAction::Checkin),
            "checkout" => Some(FlowAction::Checkout),
            _ => None,
        }
    }
}

/// How a checkout flow locates the visit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMethod {
    Pin,
    Search,
}

impl CheckoutMethod {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "pin" => Some(CheckoutMethod::Pin),
            "search" => Some(CheckoutMethod::Search),
            _ => None,
        }
    }
}

/// One node of the terminal state machine. Every step is bound to exactly
/// one template; POST actions are validated against the current step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Language,
    Action,
    CheckinType,
    PinEntry,
    Register,
    CheckoutMethod,
    CheckoutPin,
    CheckoutSearch,
    CheckoutSelect,
    CheckoutConfirm,
    TrainingVideo,
    TrainingMap,
    TrainingRisks,
    TrainingDepartment,
    TrainingAdditional,
    Success,
}

impl Step {
    /// The URL path segment and template name for this step
    pub fn slug(&self) -> &'static str {
        match self {
            Step::Language => "language",
            Step::Action => "action",
            Step::CheckinType => "checkin-type",
            Step::PinEntry => "pin-entry",
            Step::Register => "register",
            Step::CheckoutMethod => "checkout-method",
            Step::CheckoutPin => "checkout-pin",
            Step::CheckoutSearch => "checkout-search",
            Step::CheckoutSelect => "checkout-select",
            Step::CheckoutConfirm => "checkout-confirm",
            Step::TrainingVideo => "training-video",
            Step::TrainingMap => "training-map",
            Step::TrainingRisks => "training-risks",
            Step::TrainingDepartment => "training-department",
            Step::TrainingAdditional => "training-additional",
            Step::Success => "success",
        }
    }

    /// Resolve a URL path segment to a step. Unknown segments yield None,
    /// which the controller turns into a full flow reset.
    pub fn from_slug(slug: &str) -> Option<Self> {
        Some(match slug {
            "language" => Step::Language,
            "action" => Step::Action,
            "checkin-type" => Step::CheckinType,
            "pin-entry" => Step::PinEntry,
            "register" => Step::Register,
            "checkout-method" => Step::CheckoutMethod,
            "checkout-pin" => Step::CheckoutPin,
            "checkout-search" => Step::CheckoutSearch,
            "checkout-select" => Step::CheckoutSelect,
            "checkout-confirm" => Step::CheckoutConfirm,
            "training-video" => Step::TrainingVideo,
            "training-map" => Step::TrainingMap,
            "training-risks" => Step::TrainingRisks,
            "training-department" => Step::TrainingDepartment,
            "training-additional" => Step::TrainingAdditional,
            "success" => Step::Success,
            _ => return None,
        })
    }

    /// Canonical URL the browser is redirected to after a successful
    /// transition into this step
    pub fn url(&self) -> String {
        format!("/terminal/{}/", self.slug())
    }
}

impl Default for Step {
    fn default() -> Self {
        Step::Language
    }
}

/// The whole per-session flow state. Created with defaults on first touch,
/// mutated only by the flow controller on validated POSTs, reset wholesale
/// when routing meets an unrecognized step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TerminalFlow {
    pub step: Step,
    pub language: Language,
    pub action: Option<FlowAction>,
    #[serde(rename = "type")]
    pub checkin_type: Option<VisitType>,
    pub pin: Option<String>,
    pub visit_id: Option<i32>,
    pub visitor_ids: Vec<i32>,
    /// Step-local scratch values (search query, pending selection)
    #[serde(default)]
    pub data: HashMap<String, String>,
}

impl TerminalFlow {
    /// Fresh flow at the initial step, everything else defaulted
    pub fn reset() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_round_trip() {
        let all = [
            Step::Language,
            Step::Action,
            Step::CheckinType,
            Step::PinEntry,
            Step::Register,
            Step::CheckoutMethod,
            Step::CheckoutPin,
            Step::CheckoutSearch,
            Step::CheckoutSelect,
            Step::CheckoutConfirm,
            Step::TrainingVideo,
            Step::TrainingMap,
            Step::TrainingRisks,
            Step::TrainingDepartment,
            Step::TrainingAdditional,
            Step::Success,
        ];
        for step in all {
            assert_eq!(Step::from_slug(step.slug()), Some(step));
        }
        assert_eq!(Step::from_slug("not-a-step"), None);
    }

    #[test]
    fn test_default_flow_is_initial() {
        let flow = TerminalFlow::reset();
        assert_eq!(flow.step, Step::Language);
        assert!(flow.action.is_none());
        assert!(flow.checkin_type.is_none());
        assert!(flow.pin.is_none());
        assert!(flow.visit_id.is_none());
        assert!(flow.visitor_ids.is_empty());
        assert!(flow.data.is_empty());
    }

    #[test]
    fn test_flow_survives_json_round_trip() {
        let mut flow = TerminalFlow::reset();
        flow.step = Step::PinEntry;
        flow.action = Some(FlowAction::Checkin);
        flow.visit_id = Some(42);
        flow.visitor_ids = vec![1, 2];
        let json = serde_json::to_string(&flow).unwrap();
        let back: TerminalFlow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, flow);
    }

    #[test]
    fn test_unknown_step_fails_deserialization() {
        // An unrecognized step in stored state must not parse; the session
        // layer falls back to a reset flow.
        let json = r#"{"step":"bogus","language":"cs","action":null,"type":null,"pin":null,"visit_id":null,"visitor_ids":[]}"#;
        assert!(serde_json::from_str::<TerminalFlow>(json).is_err());
    }
}
