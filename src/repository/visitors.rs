//! Visitors repository: visitor rows plus the visit/visitor join with
//! check-in state and training flags

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::visitor::{PresentVisitor, RegisterVisitor, TrainingStep, Visitor, VisitVisitor},
};

#[derive(Clone)]
pub struct VisitorsRepository {
    pool: Pool<Postgres>,
}

impl VisitorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get visitor by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Visitor> {
        sqlx::query_as::<_, Visitor>("SELECT * FROM visitors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Visitor with id {} not found", id)))
    }

    /// Create a visitor row
    pub async fn create(&self, visitor: &RegisterVisitor) -> AppResult<Visitor> {
        let created = sqlx::query_as::<_, Visitor>(
            r#"
            INSERT INTO visitors (first_name, last_name, position)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&visitor.first_name)
        .bind(&visitor.last_name)
        .bind(&visitor.position)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// Attach a visitor to a visit (idempotent on the pair)
    pub async fn attach_to_visit(&self, visit_id: i32, visitor_id: i32) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO visit_visitors (visit_id, visitor_id)
            VALUES ($1, $2)
            ON CONFLICT (visit_id, visitor_id) DO NOTHING
            "#,
        )
        .bind(visit_id)
        .bind(visitor_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record a check-in for one visitor on one visit
    pub async fn check_in(
        &self,
        visit_id: i32,
        visitor_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE visit_visitors
            SET checked_in_at = $1, checked_out_at = NULL
            WHERE visit_id = $2 AND visitor_id = $3
            "#,
        )
        .bind(now)
        .bind(visit_id)
        .bind(visitor_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Visitors of a visit who are checked in with no recorded check-out
    pub async fn get_present(&self, visit_id: i32) -> AppResult<Vec<PresentVisitor>> {
        let present = sqlx::query_as::<_, PresentVisitor>(
            r#"
            SELECT p.id as visitor_id, p.first_name, p.last_name, p.position,
                   vv.checked_in_at
            FROM visit_visitors vv
            JOIN visitors p ON p.id = vv.visitor_id
            WHERE vv.visit_id = $1
              AND vv.checked_in_at IS NOT NULL
              AND vv.checked_out_at IS NULL
            ORDER BY vv.checked_in_at
            "#,
        )
        .bind(visit_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(present)
    }

    /// Visitors attached to a visit who have not checked in yet
    pub async fn get_pending_ids(&self, visit_id: i32) -> AppResult<Vec<i32>> {
        let ids = sqlx::query_scalar::<_, i32>(
            "SELECT visitor_id FROM visit_visitors WHERE visit_id = $1 AND checked_in_at IS NULL",
        )
        .bind(visit_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Stamp checkout timestamps for a set of visitors on one visit.
    /// Returns the number of rows actually updated.
    pub async fn check_out(
        &self,
        visit_id: i32,
        visitor_ids: &[i32],
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE visit_visitors
            SET checked_out_at = $1
            WHERE visit_id = $2
              AND visitor_id = ANY($3)
              AND checked_in_at IS NOT NULL
              AND checked_out_at IS NULL
            "#,
        )
        .bind(now)
        .bind(visit_id)
        .bind(visitor_ids)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Get the join row for one visitor on one visit
    pub async fn get_participation(
        &self,
        visit_id: i32,
        visitor_id: i32,
    ) -> AppResult<VisitVisitor> {
        sqlx::query_as::<_, VisitVisitor>(
            "SELECT * FROM visit_visitors WHERE visit_id = $1 AND visitor_id = $2",
        )
        .bind(visit_id)
        .bind(visitor_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Visitor {} is not part of visit {}",
                visitor_id, visit_id
            ))
        })
    }

    /// Flip one training flag. Flags only ever go false -> true.
    pub async fn set_training_flag(
        &self,
        visit_id: i32,
        visitor_id: i32,
        step: TrainingStep,
    ) -> AppResult<()> {
        // Column name comes from a closed enum, never from user input
        let sql = format!(
            "UPDATE visit_visitors SET {} = TRUE WHERE visit_id = $1 AND visitor_id = $2",
            step.column()
        );
        sqlx::query(&sql)
            .bind(visit_id)
            .bind(visitor_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Stamp the training as fully completed
    pub async fn complete_training(
        &self,
        visit_id: i32,
        visitor_id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE visit_visitors
            SET training_completed_at = $1
            WHERE visit_id = $2 AND visitor_id = $3
            "#,
        )
        .bind(now)
        .bind(visit_id)
        .bind(visitor_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
