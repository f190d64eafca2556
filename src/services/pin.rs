//! PIN lifecycle service: generation, validation, extension and
//! time-based status of visit access codes.
//!
//! All stored timestamps are UTC instants; every wall-clock decision takes
//! the configured zone explicitly. Mixing naive local and UTC readings is
//! exactly the defect class this module is built to rule out.

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use rand::Rng;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    i18n,
    models::{Language, Visit},
    repository::Repository,
};

/// PIN length in digits
pub const PIN_LENGTH: usize = 6;

/// Bounded number of draws when searching for an unused code
const MAX_PIN_DRAWS: usize = 25;

/// Time-based state of a PIN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PinState {
    /// No expiry recorded; the PIN never runs out
    Unlimited,
    /// Still valid, comfortably ahead of expiry
    Valid,
    /// Still valid but expiring soon
    Warning,
    /// Expiry has passed
    Expired,
}

/// Status report for operators: state plus a human-readable duration in
/// the requested language and the expiry as local wall-clock time
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PinStatusReport {
    pub state: PinState,
    /// Remaining time while valid, elapsed time once expired
    pub duration_text: Option<String>,
    /// Expiry formatted in the configured zone
    pub expires_at_local: Option<String>,
}

/// Pure state computation. The boundary is exclusive on the expired side:
/// at exactly `expires_at` the PIN is already expired.
pub fn pin_state(
    expires_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    warning_hours: i64,
) -> PinState {
    match expires_at {
        None => PinState::Unlimited,
        Some(at) if now < at => {
            if at - now < Duration::hours(warning_hours) {
                PinState::Warning
            } else {
                PinState::Valid
            }
        }
        Some(_) => PinState::Expired,
    }
}

/// Base timestamp for an extension: the current expiry while it is still
/// in the future, otherwise the invocation time. A stale expiry is never
/// silently extended.
pub fn extension_base(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> DateTime<Utc> {
    match expires_at {
        Some(at) if at > now => at,
        _ => now,
    }
}

/// Syntactic check on terminal PIN input
pub fn is_well_formed(input: &str) -> bool {
    input.len() == PIN_LENGTH && input.chars().all(|c| c.is_ascii_digit())
}

/// Pick which visit a PIN refers to. Codes are unique among non-expired
/// PINs only, so an expired visit may still hold the same code as a newer
/// active one; any unexpired holder wins. With only expired holders the
/// newest is returned so the visitor gets the expiry message rather than
/// "invalid".
pub fn preferred_pin_holder(visits: Vec<Visit>, now: DateTime<Utc>) -> Option<Visit> {
    let mut expired = None;
    for visit in visits {
        if pin_state(visit.pin_expires_at, now, 0) == PinState::Expired {
            expired.get_or_insert(visit);
        } else {
            return Some(visit);
        }
    }
    expired
}

fn random_pin<R: Rng>(rng: &mut R) -> String {
    format!("{:06}", rng.gen_range(100000..=999999))
}

#[derive(Clone)]
pub struct PinService {
    repository: Repository,
    tz: Tz,
    default_hours: i64,
    warning_hours: i64,
}

impl PinService {
    pub fn new(repository: Repository, tz: Tz, default_hours: i64, warning_hours: i64) -> Self {
        Self {
            repository,
            tz,
            default_hours,
            warning_hours,
        }
    }

    /// Generate a fresh PIN for a visit and persist it with the default
    /// expiry. Fails on cancelled visits.
    pub async fn generate(&self, visit_id: i32) -> AppResult<(String, DateTime<Utc>)> {
        let visit = self.repository.visits.get_by_id(visit_id).await?;
        if !visit.allows_pin_actions() {
            return Err(AppError::BusinessRule(
                "Cannot generate a PIN for a cancelled visit".to_string(),
            ));
        }

        let now = Utc::now();
        let pin = self.draw_unused_pin(now).await?;
        let expires_at = now + Duration::hours(self.default_hours);
        self.repository.visits.set_pin(visit_id, &pin, Some(expires_at)).await?;

        tracing::info!(visit_id, "Generated PIN, valid until {}", expires_at);
        Ok((pin, expires_at))
    }

    /// Extend the PIN by a number of hours. Presets are 24/48/168 but any
    /// positive value is accepted from the admin API.
    pub async fn extend_hours(&self, visit_id: i32, hours: i64) -> AppResult<DateTime<Utc>> {
        if hours <= 0 {
            return Err(AppError::Validation("Extension hours must be positive".to_string()));
        }
        let visit = self.repository.visits.get_by_id(visit_id).await?;
        self.check_extendable(&visit)?;

        let now = Utc::now();
        let new_expiry = extension_base(visit.pin_expires_at, now) + Duration::hours(hours);
        self.repository.visits.set_pin_expiry(visit_id, new_expiry).await?;

        tracing::info!(visit_id, hours, "Extended PIN to {}", new_expiry);
        Ok(new_expiry)
    }

    /// Set the PIN expiry to an operator-chosen absolute timestamp
    pub async fn extend_until(&self, visit_id: i32, at: DateTime<Utc>) -> AppResult<DateTime<Utc>> {
        let visit = self.repository.visits.get_by_id(visit_id).await?;
        self.check_extendable(&visit)?;

        if at <= Utc::now() {
            return Err(AppError::Validation(
                "New expiry must be in the future".to_string(),
            ));
        }
        self.repository.visits.set_pin_expiry(visit_id, at).await?;

        tracing::info!(visit_id, "Set PIN expiry to {}", at);
        Ok(at)
    }

    /// Status report for a visit's PIN
    pub async fn status(&self, visit_id: i32, lang: Language) -> AppResult<PinStatusReport> {
        let visit = self.repository.visits.get_by_id(visit_id).await?;
        if visit.pin_code.is_none() {
            return Err(AppError::NotFound(format!(
                "Visit {} has no PIN",
                visit_id
            )));
        }
        Ok(self.report(visit.pin_expires_at, Utc::now(), lang))
    }

    /// Build the report from raw values; `now` is explicit for testability
    pub fn report(
        &self,
        expires_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        lang: Language,
    ) -> PinStatusReport {
        let state = pin_state(expires_at, now, self.warning_hours);
        let duration_text = match (state, expires_at) {
            (PinState::Unlimited, _) | (_, None) => None,
            (PinState::Expired, Some(at)) => Some(i18n::format_duration(now - at, lang)),
            (_, Some(at)) => Some(i18n::format_duration(at - now, lang)),
        };
        let expires_at_local = expires_at
            .map(|at| at.with_timezone(&self.tz).format("%d.%m.%Y %H:%M").to_string());
        PinStatusReport {
            state,
            duration_text,
            expires_at_local,
        }
    }

    /// Equality plus expiry check used by the terminal PIN-entry steps
    pub fn validate(&self, input: &str, visit: &Visit, now: DateTime<Utc>) -> AppResult<()> {
        match &visit.pin_code {
            Some(code) if code == input => {}
            _ => return Err(AppError::InvalidPin),
        }
        match pin_state(visit.pin_expires_at, now, self.warning_hours) {
            PinState::Expired => Err(AppError::ExpiredPin),
            _ => Ok(()),
        }
    }

    fn check_extendable(&self, visit: &Visit) -> AppResult<()> {
        if !visit.allows_pin_actions() {
            return Err(AppError::BusinessRule(
                "Cannot extend the PIN of a cancelled visit".to_string(),
            ));
        }
        if visit.pin_code.is_none() {
            return Err(AppError::BusinessRule(
                "Visit has no PIN to extend".to_string(),
            ));
        }
        Ok(())
    }

    /// Draw a 6-digit code unused among non-expired PINs
    async fn draw_unused_pin(&self, now: DateTime<Utc>) -> AppResult<String> {
        for _ in 0..MAX_PIN_DRAWS {
            let candidate = random_pin(&mut rand::thread_rng());
            if !self.repository.visits.pin_in_use(&candidate, now).await? {
                return Ok(candidate);
            }
        }
        Err(AppError::Internal(
            "Could not find an unused PIN code".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::{VisitStatus, VisitType};
    use chrono::NaiveDateTime;
    use rand::SeedableRng;

    fn at(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
    }

    fn visit_with_pin(id: i32, expires_at: Option<DateTime<Utc>>) -> Visit {
        Visit {
            id,
            branch_id: 1,
            company_id: None,
            visit_type: VisitType::Planned,
            status: VisitStatus::Scheduled,
            pin_code: Some("123456".to_string()),
            pin_expires_at: expires_at,
            planned_date_from: None,
            planned_date_to: None,
            invitation_email: None,
            invitation_confirmed_at: None,
            completed_at: None,
            created_at: at("2026-03-01 08:00:00"),
        }
    }

    #[test]
    fn test_no_expiry_is_unlimited() {
        assert_eq!(pin_state(None, Utc::now(), 6), PinState::Unlimited);
    }

    #[test]
    fn test_state_boundary_is_exclusive_on_the_expired_side() {
        let expiry = at("2026-03-01 12:00:00");
        assert_eq!(
            pin_state(Some(expiry), expiry - Duration::seconds(1), 6),
            PinState::Warning
        );
        assert_eq!(pin_state(Some(expiry), expiry, 6), PinState::Expired);
        assert_eq!(
            pin_state(Some(expiry), expiry + Duration::seconds(1), 6),
            PinState::Expired
        );
    }

    #[test]
    fn test_warning_under_six_hours() {
        let expiry = at("2026-03-01 12:00:00");
        assert_eq!(
            pin_state(Some(expiry), expiry - Duration::hours(7), 6),
            PinState::Valid
        );
        assert_eq!(
            pin_state(Some(expiry), expiry - Duration::hours(5), 6),
            PinState::Warning
        );
    }

    #[test]
    fn test_extension_base_uses_current_expiry_while_valid() {
        let now = at("2026-03-01 12:00:00");
        let expiry = now + Duration::hours(3);
        assert_eq!(extension_base(Some(expiry), now), expiry);
    }

    #[test]
    fn test_extension_base_falls_back_to_now_when_expired() {
        let now = at("2026-03-01 12:00:00");
        let stale = now - Duration::hours(3);
        assert_eq!(extension_base(Some(stale), now), now);
        assert_eq!(extension_base(None, now), now);
    }

    #[test]
    fn test_active_holder_wins_over_expired_holder_with_same_code() {
        let now = at("2026-03-01 12:00:00");
        let expired = visit_with_pin(1, Some(now - Duration::hours(2)));
        let active = visit_with_pin(2, Some(now + Duration::hours(2)));
        // Newest-first ordering puts the expired row first; the active
        // holder must still be chosen.
        let picked = preferred_pin_holder(vec![expired, active], now).unwrap();
        assert_eq!(picked.id, 2);
    }

    #[test]
    fn test_unlimited_holder_counts_as_active() {
        let now = at("2026-03-01 12:00:00");
        let expired = visit_with_pin(1, Some(now - Duration::hours(2)));
        let unlimited = visit_with_pin(2, None);
        let picked = preferred_pin_holder(vec![expired, unlimited], now).unwrap();
        assert_eq!(picked.id, 2);
    }

    #[test]
    fn test_only_expired_holders_yield_the_first_one() {
        let now = at("2026-03-01 12:00:00");
        let older = visit_with_pin(1, Some(now - Duration::hours(5)));
        let newer = visit_with_pin(2, Some(now - Duration::hours(1)));
        let picked = preferred_pin_holder(vec![newer, older], now).unwrap();
        assert_eq!(picked.id, 2);
    }

    #[test]
    fn test_no_holders_yield_none() {
        assert!(preferred_pin_holder(vec![], Utc::now()).is_none());
    }

    #[test]
    fn test_random_pin_stays_in_the_six_digit_range() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let pin = random_pin(&mut rng);
            assert!(is_well_formed(&pin));
            let n: u32 = pin.parse().unwrap();
            assert!((100000..=999999).contains(&n));
        }
    }

    #[test]
    fn test_pin_well_formed() {
        assert!(is_well_formed("123456"));
        assert!(!is_well_formed("12345"));
        assert!(!is_well_formed("1234567"));
        assert!(!is_well_formed("12345a"));
        assert!(!is_well_formed(""));
    }
}
