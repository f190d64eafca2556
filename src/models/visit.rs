//! Visit model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::enums::{VisitStatus, VisitType};

/// Visit model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Visit {
    pub id: i32,
    pub branch_id: i32,
    pub company_id: Option<i32>,
    pub visit_type: VisitType,
    pub status: VisitStatus,
    pub pin_code: Option<String>,
    pub pin_expires_at: Option<DateTime<Utc>>,
    pub planned_date_from: Option<DateTime<Utc>>,
    pub planned_date_to: Option<DateTime<Utc>>,
    pub invitation_email: Option<String>,
    pub invitation_confirmed_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Visit {
    /// A visit can act on its PIN only while it has not been cancelled
    pub fn allows_pin_actions(&self) -> bool {
        self.status != VisitStatus::Cancelled
    }
}

/// Create visit request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVisit {
    pub branch_id: i32,
    pub company_id: Option<i32>,
    pub visit_type: VisitType,
    pub planned_date_from: Option<DateTime<Utc>>,
    pub planned_date_to: Option<DateTime<Utc>>,
    #[validate(email)]
    pub invitation_email: Option<String>,
}

/// Visit list filter
#[derive(Debug, Deserialize, ToSchema)]
pub struct VisitQuery {
    pub branch_id: Option<i32>,
    pub company_id: Option<i32>,
    pub status: Option<VisitStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
