//! Checkout selection and confirmation.
//!
//! Turns a multi-select of present visitors into either "visit stays open"
//! or "visit completed". Emptying the visit of everyone on premises always
//! goes through the confirmation step first.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::HashSet;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{CheckoutOutcome, PresentVisitor, Visit, VisitStatus},
    repository::Repository,
};

/// What the operator sees before finalizing a full checkout
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct CheckoutAssessment {
    /// The selection would leave nobody from the visit on premises
    pub requires_confirmation: bool,
    /// Today (in the configured zone) is the last planned day of the visit
    pub is_last_planned_day: bool,
    /// The planned period has already elapsed
    pub period_elapsed: bool,
}

/// Does the selection cover every currently-present visitor?
/// Order and duplicates do not matter.
pub fn selection_covers_all(selected: &[i32], present_ids: &[i32]) -> bool {
    let selected: HashSet<i32> = selected.iter().copied().collect();
    let present: HashSet<i32> = present_ids.iter().copied().collect();
    !present.is_empty() && selected.is_superset(&present)
}

/// Validate that a selection is non-empty and only names present visitors
pub fn validate_selection(selected: &[i32], present_ids: &[i32]) -> AppResult<()> {
    if selected.is_empty() {
        return Err(AppError::BusinessRule(
            "Cannot check out with no visitors selected".to_string(),
        ));
    }
    let present: HashSet<i32> = present_ids.iter().copied().collect();
    for id in selected {
        if !present.contains(id) {
            return Err(AppError::Validation(format!(
                "Visitor {} is not currently checked in",
                id
            )));
        }
    }
    Ok(())
}

/// Informational flags about the visit's planned window, computed on local
/// calendar days in the given zone
pub fn planned_window_info(visit: &Visit, now: DateTime<Utc>, tz: Tz) -> (bool, bool) {
    match visit.planned_date_to {
        Some(until) => {
            let is_last_day = until.with_timezone(&tz).date_naive() == now.with_timezone(&tz).date_naive();
            let elapsed = now > until;
            (is_last_day, elapsed)
        }
        None => (false, false),
    }
}

#[derive(Clone)]
pub struct CheckoutService {
    repository: Repository,
    tz: Tz,
}

impl CheckoutService {
    pub fn new(repository: Repository, tz: Tz) -> Self {
        Self { repository, tz }
    }

    /// Visitors of the visit with a check-in and no check-out yet
    pub async fn list_present(&self, visit_id: i32) -> AppResult<Vec<PresentVisitor>> {
        self.repository.visits.get_by_id(visit_id).await?;
        self.repository.visitors.get_present(visit_id).await
    }

    /// Judge a selection: is it valid, and does it need the confirmation
    /// dialog before finalizing?
    pub async fn assess(
        &self,
        visit_id: i32,
        selected: &[i32],
    ) -> AppResult<CheckoutAssessment> {
        let visit = self.repository.visits.get_by_id(visit_id).await?;
        let present = self.repository.visitors.get_present(visit_id).await?;
        let present_ids: Vec<i32> = present.iter().map(|p| p.visitor_id).collect();

        validate_selection(selected, &present_ids)?;

        let (is_last_planned_day, period_elapsed) =
            planned_window_info(&visit, Utc::now(), self.tz);

        Ok(CheckoutAssessment {
            requires_confirmation: selection_covers_all(selected, &present_ids),
            is_last_planned_day,
            period_elapsed,
        })
    }

    /// Persist checkout timestamps for the selection and, for the complete
    /// outcome, close the visit. The selection is re-validated here; the
    /// assessment step is advisory, this one is authoritative.
    pub async fn finalize(
        &self,
        visit_id: i32,
        selected: &[i32],
        outcome: CheckoutOutcome,
    ) -> AppResult<u64> {
        let visit = self.repository.visits.get_by_id(visit_id).await?;
        if visit.status == VisitStatus::Completed || visit.status == VisitStatus::Cancelled {
            return Err(AppError::BusinessRule(
                "Visit is already closed".to_string(),
            ));
        }

        let present = self.repository.visitors.get_present(visit_id).await?;
        let present_ids: Vec<i32> = present.iter().map(|p| p.visitor_id).collect();
        validate_selection(selected, &present_ids)?;

        let now = Utc::now();
        let checked_out = self
            .repository
            .visitors
            .check_out(visit_id, selected, now)
            .await?;

        match outcome {
            CheckoutOutcome::Complete => {
                self.repository.visits.complete(visit_id, now).await?;
                tracing::info!(visit_id, checked_out, "Checkout finalized, visit completed");
            }
            CheckoutOutcome::Return => {
                // Visit stays open; the group intends to come back
                tracing::info!(visit_id, checked_out, "Checkout finalized, visit stays open");
            }
        }

        Ok(checked_out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{VisitStatus, VisitType};
    use chrono::{Duration, NaiveDateTime};

    fn at(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
    }

    fn visit_until(until: Option<DateTime<Utc>>) -> Visit {
        Visit {
            id: 1,
            branch_id: 1,
            company_id: None,
            visit_type: VisitType::Planned,
            status: VisitStatus::InProgress,
            pin_code: None,
            pin_expires_at: None,
            planned_date_from: None,
            planned_date_to: until,
            invitation_email: None,
            invitation_confirmed_at: None,
            completed_at: None,
            created_at: at("2026-03-01 08:00:00"),
        }
    }

    #[test]
    fn test_full_selection_requires_confirmation() {
        assert!(selection_covers_all(&[1, 2], &[1, 2]));
        assert!(selection_covers_all(&[2, 1], &[1, 2]));
    }

    #[test]
    fn test_partial_selection_skips_confirmation() {
        assert!(!selection_covers_all(&[1], &[1, 2]));
    }

    #[test]
    fn test_empty_present_set_never_confirms() {
        assert!(!selection_covers_all(&[], &[]));
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        assert!(validate_selection(&[], &[1, 2]).is_err());
    }

    #[test]
    fn test_selection_of_absent_visitor_is_rejected() {
        assert!(validate_selection(&[3], &[1, 2]).is_err());
        assert!(validate_selection(&[1], &[1, 2]).is_ok());
    }

    #[test]
    fn test_last_planned_day_uses_local_calendar() {
        let tz: Tz = "Europe/Prague".parse().unwrap();
        // Window ends 23:00 local on March 1st; at 00:30 local March 2nd
        // (still March 1st in UTC) it is no longer the last day.
        let until = at("2026-03-01 22:00:00");
        let now = at("2026-03-01 23:30:00");
        let visit = visit_until(Some(until));
        let (is_last_day, elapsed) = planned_window_info(&visit, now, tz);
        assert!(!is_last_day);
        assert!(elapsed);
    }

    #[test]
    fn test_last_planned_day_matches_on_same_local_day() {
        let tz: Tz = "Europe/Prague".parse().unwrap();
        let until = at("2026-03-01 16:00:00");
        let now = at("2026-03-01 17:00:00");
        let visit = visit_until(Some(until));
        let (is_last_day, elapsed) = planned_window_info(&visit, now, tz);
        assert!(is_last_day);
        assert!(elapsed);
    }

    #[test]
    fn test_period_not_elapsed_before_window_end() {
        let tz: Tz = "Europe/Prague".parse().unwrap();
        let until = at("2026-03-01 18:00:00");
        let now = until - Duration::hours(2);
        let visit = visit_until(Some(until));
        let (is_last_day, elapsed) = planned_window_info(&visit, now, tz);
        assert!(is_last_day);
        assert!(!elapsed);
    }

    #[test]
    fn test_no_planned_window_reports_nothing() {
        let visit = visit_until(None);
        let tz: Tz = "Europe/Prague".parse().unwrap();
        let (is_last_day, elapsed) = planned_window_info(&visit, Utc::now(), tz);
        assert!(!is_last_day);
        assert!(!elapsed);
    }
}
