//! Terminal flow controller: the step state machine behind the kiosk.
//!
//! Every transition is expressed as a function of the current flow state
//! plus the posted action. Navigation-only decisions are pure functions
//! down here; database side effects (check-in, walk-in registration,
//! training flags, checkout) live on [`TerminalService`], which applies
//! the pure transition after the effect succeeds.

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    i18n::MsgKey,
    models::{
        enums::{CheckoutOutcome, Language, VisitType},
        terminal::{CheckoutMethod, FlowAction, Step, TerminalFlow},
        visitor::{RegisterVisitor, TrainingStep},
    },
    repository::Repository,
    services::{checkout::CheckoutService, pin::{self, PinService}},
};

/// A validated POST payload, one variant per `terminal_action` value
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalAction {
    SetLanguage { language: String },
    SetAction { action_type: String },
    SetCheckinType { checkin_type: String },
    SubmitPin { pin: String },
    RegisterWalkin { first_name: String, last_name: String, position: Option<String> },
    SetCheckoutMethod { method: String },
    SubmitCheckoutPin { pin: String },
    SearchVisit { query: String },
    SelectVisitors { visitor_ids: Vec<i32> },
    ConfirmCheckout { outcome: String },
    TrainingComplete { step: TrainingStep },
    Reset,
}

impl TerminalAction {
    /// Map the wire discriminator plus raw fields to an action.
    /// Unknown discriminators yield None and are treated as validation
    /// failures by the controller.
    pub fn discriminator(&self) -> &'static str {
        match self {
            TerminalAction::SetLanguage { .. } => "set_language",
            TerminalAction::SetAction { .. } => "set_action",
            TerminalAction::SetCheckinType { .. } => "set_checkin_type",
            TerminalAction::SubmitPin { .. } => "submit_pin",
            TerminalAction::RegisterWalkin { .. } => "register_walkin",
            TerminalAction::SetCheckoutMethod { .. } => "set_checkout_method",
            TerminalAction::SubmitCheckoutPin { .. } => "submit_checkout_pin",
            TerminalAction::SearchVisit { .. } => "search_visit",
            TerminalAction::SelectVisitors { .. } => "select_visitors",
            TerminalAction::ConfirmCheckout { .. } => "confirm_checkout",
            TerminalAction::TrainingComplete { step } => match step {
                TrainingStep::Video => "training_video_complete",
                TrainingStep::Map => "training_map_complete",
                TrainingStep::Risks => "training_risks_complete",
                TrainingStep::Department => "training_department_complete",
                TrainingStep::Additional => "training_additional_complete",
            },
            TerminalAction::Reset => "reset",
        }
    }
}

/// Result of handling one POST
#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome {
    /// Flow mutated; redirect to the new step's canonical URL
    Redirect(Step),
    /// Input rejected; flow untouched, show the message on the same step
    Rerender(MsgKey),
    /// Inconsistent state; flow fully reset, back to the initial step
    Reset,
}

/// What a GET for a step slug should do
#[derive(Debug, Clone, PartialEq)]
pub enum RouteDecision {
    /// Requested step matches the session; render it
    Render(Step),
    /// Known step but not the session's; send the browser to the real one
    RedirectToCurrent(Step),
    /// Unknown slug; reset the whole flow and start over
    Reset,
}

/// GET routing. The session step is authoritative; the URL only gets to
/// agree or be corrected. Anything unrecognized restarts the flow, which
/// is the safe move on a walk-up kiosk.
pub fn route(flow: &TerminalFlow, requested_slug: &str) -> RouteDecision {
    match Step::from_slug(requested_slug) {
        None => RouteDecision::Reset,
        Some(step) if step == flow.step => RouteDecision::Render(step),
        Some(_) => RouteDecision::RedirectToCurrent(flow.step),
    }
}

// ---------------------------------------------------------------------------
// Pure transitions
// ---------------------------------------------------------------------------

pub fn handle_set_language(flow: &mut TerminalFlow, code: &str) -> Result<Step, MsgKey> {
    match Language::from_code(code) {
        Some(lang) => {
            flow.language = lang;
            flow.step = Step::Action;
            Ok(flow.step)
        }
        None => Err(MsgKey::UnknownLanguage),
    }
}

pub fn handle_set_action(flow: &mut TerminalFlow, code: &str) -> Result<Step, MsgKey> {
    match FlowAction::from_code(code) {
        Some(FlowAction::Checkin) => {
            flow.action = Some(FlowAction::Checkin);
            flow.step = Step::CheckinType;
            Ok(flow.step)
        }
        Some(FlowAction::Checkout) => {
            flow.action = Some(FlowAction::Checkout);
            flow.step = Step::CheckoutMethod;
            Ok(flow.step)
        }
        None => Err(MsgKey::UnknownAction),
    }
}

/// Planned visits go to PIN entry, walk-ins to registration. Anything
/// else is rejected with the step unchanged.
pub fn handle_checkin_type(flow: &mut TerminalFlow, code: &str) -> Result<Step, MsgKey> {
    match VisitType::from_code(code) {
        Some(VisitType::Planned) => {
            flow.checkin_type = Some(VisitType::Planned);
            flow.step = Step::PinEntry;
            Ok(flow.step)
        }
        Some(VisitType::Walkin) => {
            flow.checkin_type = Some(VisitType::Walkin);
            flow.step = Step::Register;
            Ok(flow.step)
        }
        None => Err(MsgKey::UnknownCheckinType),
    }
}

pub fn handle_checkout_method(flow: &mut TerminalFlow, code: &str) -> Result<Step, MsgKey> {
    match CheckoutMethod::from_code(code) {
        Some(CheckoutMethod::Pin) => {
            flow.step = Step::CheckoutPin;
            Ok(flow.step)
        }
        Some(CheckoutMethod::Search) => {
            flow.step = Step::CheckoutSearch;
            Ok(flow.step)
        }
        None => Err(MsgKey::UnknownCheckoutMethod),
    }
}

/// The state-machine node for a training step
pub fn training_node(step: TrainingStep) -> Step {
    match step {
        TrainingStep::Video => Step::TrainingVideo,
        TrainingStep::Map => Step::TrainingMap,
        TrainingStep::Risks => Step::TrainingRisks,
        TrainingStep::Department => Step::TrainingDepartment,
        TrainingStep::Additional => Step::TrainingAdditional,
    }
}

/// The node after completing a training step; the last one lands on success
pub fn next_training_node(step: TrainingStep) -> Step {
    match step.next() {
        Some(next) => training_node(next),
        None => Step::Success,
    }
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

/// Scratch key holding a pending checkout selection between the select
/// and confirm steps
const PENDING_SELECTION_KEY: &str = "checkout_selection";

#[derive(Clone)]
pub struct TerminalService {
    repository: Repository,
    pin: PinService,
    checkout: CheckoutService,
    /// Branch walk-in visits are registered against
    branch_id: i32,
}

impl TerminalService {
    pub fn new(
        repository: Repository,
        pin: PinService,
        checkout: CheckoutService,
        branch_id: i32,
    ) -> Self {
        Self {
            repository,
            pin,
            checkout,
            branch_id,
        }
    }

    /// Apply one POSTed action to the flow. On `Redirect` the caller must
    /// persist the mutated flow; on `Rerender` the flow is untouched; on
    /// `Reset` the caller reinitializes the session.
    pub async fn handle(
        &self,
        flow: &mut TerminalFlow,
        action: TerminalAction,
    ) -> AppResult<FlowOutcome> {
        tracing::debug!(
            step = flow.step.slug(),
            action = action.discriminator(),
            "Terminal action"
        );

        let outcome = match action {
            TerminalAction::Reset => FlowOutcome::Reset,
            TerminalAction::SetLanguage { language } => {
                Self::pure(handle_set_language(flow, &language))
            }
            TerminalAction::SetAction { action_type } => {
                Self::pure(handle_set_action(flow, &action_type))
            }
            TerminalAction::SetCheckinType { checkin_type } => {
                Self::pure(handle_checkin_type(flow, &checkin_type))
            }
            TerminalAction::SetCheckoutMethod { method } => {
                Self::pure(handle_checkout_method(flow, &method))
            }
            TerminalAction::SubmitPin { pin } => self.submit_checkin_pin(flow, &pin).await?,
            TerminalAction::RegisterWalkin {
                first_name,
                last_name,
                position,
            } => {
                self.register_walkin(flow, first_name, last_name, position)
                    .await?
            }
            TerminalAction::SubmitCheckoutPin { pin } => {
                self.submit_checkout_pin(flow, &pin).await?
            }
            TerminalAction::SearchVisit { query } => self.search_visit(flow, &query).await?,
            TerminalAction::SelectVisitors { visitor_ids } => {
                self.select_visitors(flow, visitor_ids).await?
            }
            TerminalAction::ConfirmCheckout { outcome } => {
                self.confirm_checkout(flow, &outcome).await?
            }
            TerminalAction::TrainingComplete { step } => {
                self.complete_training_step(flow, step).await?
            }
        };
        Ok(outcome)
    }

    fn pure(result: Result<Step, MsgKey>) -> FlowOutcome {
        match result {
            Ok(step) => FlowOutcome::Redirect(step),
            Err(msg) => FlowOutcome::Rerender(msg),
        }
    }

    /// Planned check-in: PIN identifies the visit, the visit's attached
    /// visitors are checked in and walked through the training sequence.
    async fn submit_checkin_pin(
        &self,
        flow: &mut TerminalFlow,
        input: &str,
    ) -> AppResult<FlowOutcome> {
        if !pin::is_well_formed(input) {
            return Ok(FlowOutcome::Rerender(MsgKey::InvalidPinLength));
        }

        let now = Utc::now();
        let candidates = self.repository.visits.find_by_pin(input).await?;
        let visit = match pin::preferred_pin_holder(candidates, now) {
            Some(v) => v,
            None => return Ok(FlowOutcome::Rerender(MsgKey::InvalidPin)),
        };

        match self.pin.validate(input, &visit, now) {
            Ok(()) => {}
            Err(AppError::ExpiredPin) => return Ok(FlowOutcome::Rerender(MsgKey::ExpiredPin)),
            Err(AppError::InvalidPin) => return Ok(FlowOutcome::Rerender(MsgKey::InvalidPin)),
            Err(e) => return Err(e),
        }

        let present = self.repository.visitors.get_present(visit.id).await?;
        let mut visitor_ids: Vec<i32> = present.iter().map(|p| p.visitor_id).collect();
        // Visitors invited but not yet checked in get their check-in now
        let pending = self.repository.visitors.get_pending_ids(visit.id).await?;
        for visitor_id in pending {
            self.repository.visitors.check_in(visit.id, visitor_id, now).await?;
            visitor_ids.push(visitor_id);
        }

        self.repository
            .visits
            .set_status(visit.id, crate::models::VisitStatus::InProgress)
            .await?;

        flow.pin = Some(input.to_string());
        flow.visit_id = Some(visit.id);
        flow.visitor_ids = visitor_ids;
        flow.step = Step::TrainingVideo;
        Ok(FlowOutcome::Redirect(flow.step))
    }

    /// Walk-in registration creates the visit and the visitor, checks the
    /// visitor in and starts the training sequence.
    async fn register_walkin(
        &self,
        flow: &mut TerminalFlow,
        first_name: String,
        last_name: String,
        position: Option<String>,
    ) -> AppResult<FlowOutcome> {
        let first_name = first_name.trim().to_string();
        let last_name = last_name.trim().to_string();
        if first_name.is_empty() || last_name.is_empty() {
            return Ok(FlowOutcome::Rerender(MsgKey::MissingName));
        }

        let visit = self.repository.visits.create_walkin(self.branch_id).await?;
        let visitor = self
            .repository
            .visitors
            .create(&RegisterVisitor {
                first_name,
                last_name,
                position,
            })
            .await?;
        self.repository
            .visitors
            .attach_to_visit(visit.id, visitor.id)
            .await?;
        self.repository
            .visitors
            .check_in(visit.id, visitor.id, Utc::now())
            .await?;

        tracing::info!(visit_id = visit.id, visitor_id = visitor.id, "Walk-in registered");

        flow.visit_id = Some(visit.id);
        flow.visitor_ids = vec![visitor.id];
        flow.step = Step::TrainingVideo;
        Ok(FlowOutcome::Redirect(flow.step))
    }

    /// Checkout via PIN: locate the visit and move on to selection
    async fn submit_checkout_pin(
        &self,
        flow: &mut TerminalFlow,
        input: &str,
    ) -> AppResult<FlowOutcome> {
        if !pin::is_well_formed(input) {
            return Ok(FlowOutcome::Rerender(MsgKey::InvalidPinLength));
        }
        let now = Utc::now();
        let candidates = self.repository.visits.find_by_pin(input).await?;
        let visit = match pin::preferred_pin_holder(candidates, now) {
            Some(v) => v,
            None => return Ok(FlowOutcome::Rerender(MsgKey::InvalidPin)),
        };
        match self.pin.validate(input, &visit, now) {
            Ok(()) => {}
            Err(AppError::ExpiredPin) => return Ok(FlowOutcome::Rerender(MsgKey::ExpiredPin)),
            Err(AppError::InvalidPin) => return Ok(FlowOutcome::Rerender(MsgKey::InvalidPin)),
            Err(e) => return Err(e),
        }

        flow.visit_id = Some(visit.id);
        flow.step = Step::CheckoutSelect;
        Ok(FlowOutcome::Redirect(flow.step))
    }

    /// Checkout via name search: first open visit with a matching present
    /// visitor wins; no match re-renders the search step.
    async fn search_visit(&self, flow: &mut TerminalFlow, query: &str) -> AppResult<FlowOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(FlowOutcome::Rerender(MsgKey::VisitNotFound));
        }
        let matches = self.repository.visits.search_open_by_visitor_name(query).await?;
        let visit = match matches.into_iter().next() {
            Some(v) => v,
            None => return Ok(FlowOutcome::Rerender(MsgKey::VisitNotFound)),
        };

        flow.data.insert("search_query".to_string(), query.to_string());
        flow.visit_id = Some(visit.id);
        flow.step = Step::CheckoutSelect;
        Ok(FlowOutcome::Redirect(flow.step))
    }

    /// Selection submit. A full-house selection detours through the
    /// confirmation step; a partial one finalizes immediately with the
    /// visit left open.
    async fn select_visitors(
        &self,
        flow: &mut TerminalFlow,
        visitor_ids: Vec<i32>,
    ) -> AppResult<FlowOutcome> {
        let visit_id = match flow.visit_id {
            Some(id) => id,
            None => return Ok(FlowOutcome::Reset),
        };
        if visitor_ids.is_empty() {
            return Ok(FlowOutcome::Rerender(MsgKey::EmptySelection));
        }

        let assessment = match self.checkout.assess(visit_id, &visitor_ids).await {
            Ok(a) => a,
            Err(AppError::NotFound(_)) => return Ok(FlowOutcome::Reset),
            Err(AppError::BusinessRule(_)) => {
                return Ok(FlowOutcome::Rerender(MsgKey::EmptySelection))
            }
            Err(AppError::Validation(_)) => {
                return Ok(FlowOutcome::Rerender(MsgKey::EmptySelection))
            }
            Err(e) => return Err(e),
        };

        if assessment.requires_confirmation {
            let encoded = visitor_ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(",");
            flow.data.insert(PENDING_SELECTION_KEY.to_string(), encoded);
            flow.step = Step::CheckoutConfirm;
            return Ok(FlowOutcome::Redirect(flow.step));
        }

        self.checkout
            .finalize(visit_id, &visitor_ids, CheckoutOutcome::Return)
            .await?;
        flow.visitor_ids = visitor_ids;
        flow.step = Step::Success;
        Ok(FlowOutcome::Redirect(flow.step))
    }

    /// Confirmation step: return keeps the visit open, complete closes it
    async fn confirm_checkout(
        &self,
        flow: &mut TerminalFlow,
        outcome_code: &str,
    ) -> AppResult<FlowOutcome> {
        let visit_id = match flow.visit_id {
            Some(id) => id,
            None => return Ok(FlowOutcome::Reset),
        };
        let outcome = match CheckoutOutcome::from_code(outcome_code) {
            Some(o) => o,
            None => return Ok(FlowOutcome::Rerender(MsgKey::EmptySelection)),
        };
        let selected: Vec<i32> = flow
            .data
            .get(PENDING_SELECTION_KEY)
            .map(|s| s.split(',').filter_map(|p| p.parse().ok()).collect())
            .unwrap_or_default();
        if selected.is_empty() {
            return Ok(FlowOutcome::Reset);
        }

        match self.checkout.finalize(visit_id, &selected, outcome).await {
            Ok(_) => {}
            Err(AppError::NotFound(_)) | Err(AppError::BusinessRule(_)) => {
                return Ok(FlowOutcome::Reset)
            }
            Err(e) => return Err(e),
        }

        flow.data.remove(PENDING_SELECTION_KEY);
        flow.visitor_ids = selected;
        flow.step = Step::Success;
        Ok(FlowOutcome::Redirect(flow.step))
    }

    /// One training step done: persist the flag for every visitor in the
    /// group, stamp completion after the last step, move to the next node.
    async fn complete_training_step(
        &self,
        flow: &mut TerminalFlow,
        step: TrainingStep,
    ) -> AppResult<FlowOutcome> {
        let visit_id = match flow.visit_id {
            Some(id) => id,
            None => return Ok(FlowOutcome::Reset),
        };
        // The completed step must be the one the session is on; a stray
        // submit (double tap, stale tab) just goes back to the real step
        if flow.step != training_node(step) {
            return Ok(FlowOutcome::Redirect(flow.step));
        }

        let now = Utc::now();
        for visitor_id in &flow.visitor_ids {
            self.repository
                .visitors
                .set_training_flag(visit_id, *visitor_id, step)
                .await?;
            if step.next().is_none() {
                self.repository
                    .visitors
                    .complete_training(visit_id, *visitor_id, now)
                    .await?;
            }
        }

        flow.step = next_training_node(step);
        Ok(FlowOutcome::Redirect(flow.step))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_renders_matching_step() {
        let mut flow = TerminalFlow::reset();
        flow.step = Step::PinEntry;
        assert_eq!(route(&flow, "pin-entry"), RouteDecision::Render(Step::PinEntry));
    }

    #[test]
    fn test_route_redirects_to_session_step() {
        let mut flow = TerminalFlow::reset();
        flow.step = Step::Register;
        assert_eq!(
            route(&flow, "success"),
            RouteDecision::RedirectToCurrent(Step::Register)
        );
    }

    #[test]
    fn test_route_resets_on_unknown_slug() {
        let flow = TerminalFlow::reset();
        assert_eq!(route(&flow, "no-such-step"), RouteDecision::Reset);
        assert_eq!(route(&flow, ""), RouteDecision::Reset);
    }

    #[test]
    fn test_set_language_valid_moves_to_action() {
        let mut flow = TerminalFlow::reset();
        let next = handle_set_language(&mut flow, "en").unwrap();
        assert_eq!(next, Step::Action);
        assert_eq!(flow.language, Language::En);
    }

    #[test]
    fn test_set_language_unknown_leaves_state_alone() {
        let mut flow = TerminalFlow::reset();
        let before = flow.clone();
        let err = handle_set_language(&mut flow, "xx").unwrap_err();
        assert_eq!(err, MsgKey::UnknownLanguage);
        assert_eq!(flow, before);
    }

    #[test]
    fn test_action_branches_to_checkin_and_checkout() {
        let mut flow = TerminalFlow::reset();
        flow.step = Step::Action;
        assert_eq!(handle_set_action(&mut flow, "checkin").unwrap(), Step::CheckinType);

        let mut flow = TerminalFlow::reset();
        flow.step = Step::Action;
        assert_eq!(handle_set_action(&mut flow, "checkout").unwrap(), Step::CheckoutMethod);
    }

    #[test]
    fn test_checkin_type_planned_goes_to_pin_entry() {
        let mut flow = TerminalFlow::reset();
        flow.step = Step::CheckinType;
        assert_eq!(handle_checkin_type(&mut flow, "planned").unwrap(), Step::PinEntry);
        assert_eq!(flow.checkin_type, Some(VisitType::Planned));
    }

    #[test]
    fn test_checkin_type_walkin_goes_to_register() {
        let mut flow = TerminalFlow::reset();
        flow.step = Step::CheckinType;
        assert_eq!(handle_checkin_type(&mut flow, "walkin").unwrap(), Step::Register);
        assert_eq!(flow.checkin_type, Some(VisitType::Walkin));
    }

    #[test]
    fn test_checkin_type_rejects_other_values_without_mutation() {
        let mut flow = TerminalFlow::reset();
        flow.step = Step::CheckinType;
        let before = flow.clone();
        assert!(handle_checkin_type(&mut flow, "vip").is_err());
        assert_eq!(flow, before);
    }

    #[test]
    fn test_checkout_method_branches() {
        let mut flow = TerminalFlow::reset();
        flow.step = Step::CheckoutMethod;
        assert_eq!(handle_checkout_method(&mut flow, "pin").unwrap(), Step::CheckoutPin);

        let mut flow = TerminalFlow::reset();
        flow.step = Step::CheckoutMethod;
        assert_eq!(handle_checkout_method(&mut flow, "search").unwrap(), Step::CheckoutSearch);

        let mut flow = TerminalFlow::reset();
        let before = flow.clone();
        assert!(handle_checkout_method(&mut flow, "shout").is_err());
        assert_eq!(flow, before);
    }

    #[test]
    fn test_training_sequence_is_linear_and_ends_on_success() {
        assert_eq!(next_training_node(TrainingStep::Video), Step::TrainingMap);
        assert_eq!(next_training_node(TrainingStep::Map), Step::TrainingRisks);
        assert_eq!(next_training_node(TrainingStep::Risks), Step::TrainingDepartment);
        assert_eq!(next_training_node(TrainingStep::Department), Step::TrainingAdditional);
        assert_eq!(next_training_node(TrainingStep::Additional), Step::Success);
    }
}
