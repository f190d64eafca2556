//! Kiosk terminal endpoints.
//!
//! GET renders the current step; POST carries a `terminal_action`
//! discriminator plus a one-time token and, on success, answers with a
//! redirect to the next step's canonical URL. Reloading any page therefore
//! never re-submits an action.

use axum::{
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;
use serde::Deserialize;
use std::collections::HashMap;
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    i18n::{self, MsgKey},
    models::{
        terminal::{FlowAction, Step, TerminalFlow},
        visitor::TrainingStep,
    },
    services::terminal::{route, FlowOutcome, RouteDecision, TerminalAction},
    AppState,
};

const SESSION_COOKIE: &str = "gatehouse_session";

/// Raw POST payload of the terminal step form
#[derive(Debug, Deserialize)]
pub struct TerminalForm {
    pub terminal_action: String,
    #[serde(default)]
    pub token: String,
    pub language: Option<String>,
    pub action_type: Option<String>,
    pub checkin_type: Option<String>,
    pub pin: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub position: Option<String>,
    pub method: Option<String>,
    pub query: Option<String>,
    #[serde(default, rename = "visitor_ids[]")]
    pub visitor_ids: Vec<i32>,
    pub outcome: Option<String>,
}

impl TerminalForm {
    /// Map the wire form onto an action. None means the discriminator is
    /// unknown; missing per-action fields fall through as empty values and
    /// are rejected by the individual handlers.
    fn into_action(self) -> Option<TerminalAction> {
        let action = match self.terminal_action.as_str() {
            "set_language" => TerminalAction::SetLanguage {
                language: self.language.unwrap_or_default(),
            },
            "set_action" => TerminalAction::SetAction {
                action_type: self.action_type.unwrap_or_default(),
            },
            "set_checkin_type" => TerminalAction::SetCheckinType {
                checkin_type: self.checkin_type.unwrap_or_default(),
            },
            "submit_pin" => TerminalAction::SubmitPin {
                pin: self.pin.unwrap_or_default(),
            },
            "register_walkin" => TerminalAction::RegisterWalkin {
                first_name: self.first_name.unwrap_or_default(),
                last_name: self.last_name.unwrap_or_default(),
                position: self.position.filter(|p| !p.trim().is_empty()),
            },
            "set_checkout_method" => TerminalAction::SetCheckoutMethod {
                method: self.method.unwrap_or_default(),
            },
            "submit_checkout_pin" => TerminalAction::SubmitCheckoutPin {
                pin: self.pin.unwrap_or_default(),
            },
            "search_visit" => TerminalAction::SearchVisit {
                query: self.query.unwrap_or_default(),
            },
            "select_visitors" => TerminalAction::SelectVisitors {
                visitor_ids: self.visitor_ids,
            },
            "confirm_checkout" => TerminalAction::ConfirmCheckout {
                outcome: self.outcome.unwrap_or_default(),
            },
            "training_video_complete" => TerminalAction::TrainingComplete {
                step: TrainingStep::Video,
            },
            "training_map_complete" => TerminalAction::TrainingComplete {
                step: TrainingStep::Map,
            },
            "training_risks_complete" => TerminalAction::TrainingComplete {
                step: TrainingStep::Risks,
            },
            "training_department_complete" => TerminalAction::TrainingComplete {
                step: TrainingStep::Department,
            },
            "training_additional_complete" => TerminalAction::TrainingComplete {
                step: TrainingStep::Additional,
            },
            "reset" => TerminalAction::Reset,
            _ => return None,
        };
        Some(action)
    }
}

/// Session id from the kiosk cookie, minted on first contact
fn session_id(cookies: &Cookies) -> String {
    if let Some(cookie) = cookies.get(SESSION_COOKIE) {
        return cookie.value().to_string();
    }
    let id = Uuid::new_v4().to_string();
    let mut cookie = Cookie::new(SESSION_COOKIE, id.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookies.add(cookie);
    id
}

/// GET /terminal/ — send the browser to wherever the session actually is
pub async fn terminal_home(
    State(state): State<AppState>,
    cookies: Cookies,
) -> AppResult<Response> {
    let sid = session_id(&cookies);
    let flow = state.services.session.load_flow(&sid).await?;
    Ok(Redirect::to(&flow.step.url()).into_response())
}

/// GET /terminal/{step}/ — render the step bound to the session, correct
/// the URL when it disagrees, restart the flow when it makes no sense
pub async fn terminal_step(
    State(state): State<AppState>,
    cookies: Cookies,
    Path(step_slug): Path<String>,
) -> AppResult<Response> {
    let sid = session_id(&cookies);
    let flow = state.services.session.load_flow(&sid).await?;

    match route(&flow, &step_slug) {
        RouteDecision::Render(step) => render_step(&state, &sid, &flow, step).await,
        RouteDecision::RedirectToCurrent(step) => Ok(Redirect::to(&step.url()).into_response()),
        RouteDecision::Reset => {
            tracing::debug!(slug = %step_slug, "Unknown terminal step, resetting flow");
            let flow = state.services.session.reset_flow(&sid).await?;
            Ok(Redirect::to(&flow.step.url()).into_response())
        }
    }
}

/// POST /terminal/ — validate the one-time token, dispatch the action,
/// answer with a redirect (success and failure both; failures leave a
/// session-scoped message behind for the re-rendered step)
pub async fn terminal_post(
    State(state): State<AppState>,
    cookies: Cookies,
    Form(form): Form<TerminalForm>,
) -> AppResult<Response> {
    let sid = session_id(&cookies);
    let session = &state.services.session;
    let mut flow = session.load_flow(&sid).await?;

    if !session.consume_token(&sid, &form.token).await? {
        tracing::warn!(
            target: "gatehouse::audit",
            step = flow.step.slug(),
            action = %form.terminal_action,
            "Rejected terminal POST with invalid one-time token"
        );
        session
            .set_error(&sid, i18n::message(MsgKey::SecurityToken, flow.language))
            .await?;
        return Ok(Redirect::to(&flow.step.url()).into_response());
    }

    let action = match form.into_action() {
        Some(action) => action,
        None => {
            session
                .set_error(&sid, i18n::message(MsgKey::UnknownAction, flow.language))
                .await?;
            return Ok(Redirect::to(&flow.step.url()).into_response());
        }
    };

    match state.services.terminal.handle(&mut flow, action).await? {
        FlowOutcome::Redirect(step) => {
            session.save_flow(&sid, &flow).await?;
            Ok(Redirect::to(&step.url()).into_response())
        }
        FlowOutcome::Rerender(msg) => {
            session
                .set_error(&sid, i18n::message(msg, flow.language))
                .await?;
            Ok(Redirect::to(&flow.step.url()).into_response())
        }
        FlowOutcome::Reset => {
            let flow = session.reset_flow(&sid).await?;
            Ok(Redirect::to(&flow.step.url()).into_response())
        }
    }
}

/// Checkout lookups on the GET path can race an admin acting on the same
/// visit (checking visitors out, completing it). When the referenced state
/// is gone or no longer consistent, the kiosk starts over; it never shows
/// a raw error body. Infrastructure failures still propagate.
fn flow_state_gone(err: &AppError) -> bool {
    matches!(
        err,
        AppError::NotFound(_) | AppError::BusinessRule(_) | AppError::Validation(_)
    )
}

/// Build the data map and render one step page
async fn render_step(
    state: &AppState,
    sid: &str,
    flow: &TerminalFlow,
    step: Step,
) -> AppResult<Response> {
    let services = &state.services;
    let mut data: HashMap<String, String> = HashMap::new();
    data.insert("lang".to_string(), flow.language.code().to_string());
    data.insert("step".to_string(), step.slug().to_string());
    data.insert(
        "token".to_string(),
        services.session.issue_token(sid).await?,
    );
    data.insert(
        "error".to_string(),
        services.session.take_error(sid).await?.unwrap_or_default(),
    );
    for (key, value) in i18n::terminal_copy(flow.language) {
        data.insert((*key).to_string(), (*value).to_string());
    }

    let mut template = step.slug().to_string();
    match step {
        Step::CheckoutSelect => {
            let visit_id = match flow.visit_id {
                Some(id) => id,
                None => {
                    let flow = services.session.reset_flow(sid).await?;
                    return Ok(Redirect::to(&flow.step.url()).into_response());
                }
            };
            let present = match services.checkout.list_present(visit_id).await {
                Ok(present) => present,
                Err(e) if flow_state_gone(&e) => {
                    let flow = services.session.reset_flow(sid).await?;
                    return Ok(Redirect::to(&flow.step.url()).into_response());
                }
                Err(e) => return Err(e),
            };
            if present.is_empty() {
                // Nobody to check out: empty state, no form
                template = "checkout-select-empty".to_string();
            } else {
                let mut rows = String::new();
                for visitor in &present {
                    let mut row: HashMap<String, String> = HashMap::new();
                    row.insert("visitor_id".to_string(), visitor.visitor_id.to_string());
                    row.insert("first_name".to_string(), visitor.first_name.clone());
                    row.insert("last_name".to_string(), visitor.last_name.clone());
                    row.insert(
                        "checked_in_at".to_string(),
                        visitor
                            .checked_in_at
                            .with_timezone(&services.timezone)
                            .format("%H:%M")
                            .to_string(),
                    );
                    rows.push_str(&services.templates.render_fragment("checkout-select-row", &row).await?);
                }
                data.insert("visitors".to_string(), rows);
            }
        }
        Step::CheckoutConfirm => {
            let visit_id = match flow.visit_id {
                Some(id) => id,
                None => {
                    let flow = services.session.reset_flow(sid).await?;
                    return Ok(Redirect::to(&flow.step.url()).into_response());
                }
            };
            let selected: Vec<i32> = flow
                .data
                .get("checkout_selection")
                .map(|s| s.split(',').filter_map(|p| p.parse().ok()).collect())
                .unwrap_or_default();
            let assessment = match services.checkout.assess(visit_id, &selected).await {
                Ok(assessment) => assessment,
                Err(e) if flow_state_gone(&e) => {
                    let flow = services.session.reset_flow(sid).await?;
                    return Ok(Redirect::to(&flow.step.url()).into_response());
                }
                Err(e) => return Err(e),
            };
            let mut notes = Vec::new();
            if assessment.period_elapsed {
                notes.push(i18n::message(MsgKey::PeriodElapsed, flow.language));
            } else if assessment.is_last_planned_day {
                notes.push(i18n::message(MsgKey::LastPlannedDay, flow.language));
            }
            data.insert("window_note".to_string(), notes.join(" "));
        }
        Step::Success => {
            let kind = match flow.action {
                Some(FlowAction::Checkout) => "checkout",
                _ => "checkin",
            };
            data.insert("success_kind".to_string(), kind.to_string());
        }
        _ => {}
    }

    let html = services.templates.render(&template, &data).await?;
    Ok(Html(html).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_checkout_state_triggers_a_restart() {
        // An admin checking out or closing the visit while a kiosk session
        // sits on a checkout step makes the lookups fail with these
        // variants; each must restart the flow, not render an error body.
        assert!(flow_state_gone(&AppError::NotFound("visit 1".to_string())));
        assert!(flow_state_gone(&AppError::BusinessRule(
            "Visit is already closed".to_string()
        )));
        assert!(flow_state_gone(&AppError::Validation(
            "Visitor 3 is not currently checked in".to_string()
        )));
    }

    #[test]
    fn test_infrastructure_failures_still_propagate() {
        assert!(!flow_state_gone(&AppError::Database(sqlx::Error::RowNotFound)));
        assert!(!flow_state_gone(&AppError::Session("redis down".to_string())));
        assert!(!flow_state_gone(&AppError::Template("missing".to_string())));
        assert!(!flow_state_gone(&AppError::Internal("boom".to_string())));
    }
}
