//! Visits repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{VisitStatus, VisitType},
        visit::{CreateVisit, Visit, VisitQuery},
    },
};

#[derive(Clone)]
pub struct VisitsRepository {
    pool: Pool<Postgres>,
}

impl VisitsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get visit by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Visit> {
        sqlx::query_as::<_, Visit>("SELECT * FROM visits WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Visit with id {} not found", id)))
    }

    /// All non-cancelled visits holding this PIN code, newest first.
    /// Uniqueness is only enforced among non-expired PINs, so an expired
    /// visit may share a code with a newer active one; the caller picks
    /// the active holder.
    pub async fn find_by_pin(&self, pin: &str) -> AppResult<Vec<Visit>> {
        let visits = sqlx::query_as::<_, Visit>(
            r#"
            SELECT * FROM visits
            WHERE pin_code = $1 AND status != 'cancelled'
            ORDER BY created_at DESC
            "#,
        )
        .bind(pin)
        .fetch_all(&self.pool)
        .await?;
        Ok(visits)
    }

    /// Is this code held by any visit whose PIN has not expired yet?
    /// A NULL expiry counts as active (unlimited PIN).
    pub async fn pin_in_use(&self, pin: &str, now: DateTime<Utc>) -> AppResult<bool> {
        let in_use: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM visits
                WHERE pin_code = $1
                  AND status != 'cancelled'
                  AND (pin_expires_at IS NULL OR pin_expires_at > $2)
            )
            "#,
        )
        .bind(pin)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(in_use)
    }

    /// Store a PIN code and its expiry on a visit
    pub async fn set_pin(
        &self,
        id: i32,
        pin: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE visits SET pin_code = $1, pin_expires_at = $2 WHERE id = $3")
            .bind(pin)
            .bind(expires_at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Update only the PIN expiry
    pub async fn set_pin_expiry(&self, id: i32, expires_at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE visits SET pin_expires_at = $1 WHERE id = $2")
            .bind(expires_at)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Update visit status
    pub async fn set_status(&self, id: i32, status: VisitStatus) -> AppResult<()> {
        sqlx::query("UPDATE visits SET status = $1 WHERE id = $2")
            .bind(status)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Close the visit: status completed plus completion timestamp
    pub async fn complete(&self, id: i32, now: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("UPDATE visits SET status = 'completed', completed_at = $1 WHERE id = $2")
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Stamp the invitation as confirmed and move the visit to confirmed
    pub async fn confirm_invitation(&self, id: i32, now: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            "UPDATE visits SET invitation_confirmed_at = $1, status = 'confirmed' WHERE id = $2",
        )
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Create a new visit
    pub async fn create(&self, visit: &CreateVisit, status: VisitStatus) -> AppResult<Visit> {
        let created = sqlx::query_as::<_, Visit>(
            r#"
            INSERT INTO visits (
                branch_id, company_id, visit_type, status,
                planned_date_from, planned_date_to, invitation_email
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(visit.branch_id)
        .bind(visit.company_id)
        .bind(visit.visit_type)
        .bind(status)
        .bind(visit.planned_date_from)
        .bind(visit.planned_date_to)
        .bind(&visit.invitation_email)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// List visits by filter
    pub async fn list(&self, query: &VisitQuery) -> AppResult<Vec<Visit>> {
        let visits = sqlx::query_as::<_, Visit>(
            r#"
            SELECT * FROM visits
            WHERE ($1::int IS NULL OR branch_id = $1)
              AND ($2::int IS NULL OR company_id = $2)
              AND ($3::text IS NULL OR status = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(query.branch_id)
        .bind(query.company_id)
        .bind(query.status)
        .bind(query.limit.unwrap_or(50))
        .bind(query.offset.unwrap_or(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(visits)
    }

    /// Find open visits whose present visitors match a name fragment.
    /// Used by the terminal checkout search.
    pub async fn search_open_by_visitor_name(&self, name: &str) -> AppResult<Vec<Visit>> {
        let pattern = format!("%{}%", name.trim());
        let visits = sqlx::query_as::<_, Visit>(
            r#"
            SELECT DISTINCT v.* FROM visits v
            JOIN visit_visitors vv ON vv.visit_id = v.id
            JOIN visitors p ON p.id = vv.visitor_id
            WHERE v.status = 'in_progress'
              AND vv.checked_in_at IS NOT NULL
              AND vv.checked_out_at IS NULL
              AND (p.first_name ILIKE $1 OR p.last_name ILIKE $1)
            ORDER BY v.id
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;
        Ok(visits)
    }

    /// Create a walk-in visit, already in progress
    pub async fn create_walkin(&self, branch_id: i32) -> AppResult<Visit> {
        let created = sqlx::query_as::<_, Visit>(
            r#"
            INSERT INTO visits (branch_id, visit_type, status)
            VALUES ($1, $2, 'in_progress')
            RETURNING *
            "#,
        )
        .bind(branch_id)
        .bind(VisitType::Walkin)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }
}
