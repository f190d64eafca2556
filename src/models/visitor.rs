//! Visitor model and the visit/visitor join row

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Visitor model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Visitor {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub position: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One visitor's participation in one visit, with check-in state
/// and terminal training progress
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct VisitVisitor {
    pub visit_id: i32,
    pub visitor_id: i32,
    pub checked_in_at: Option<DateTime<Utc>>,
    pub checked_out_at: Option<DateTime<Utc>>,
    pub training_step_video: bool,
    pub training_step_map: bool,
    pub training_step_risks: bool,
    pub training_step_department: bool,
    pub training_step_additional: bool,
    pub training_completed_at: Option<DateTime<Utc>>,
}

/// A visitor currently on premises for a visit, as shown in the
/// checkout selection list
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PresentVisitor {
    pub visitor_id: i32,
    pub first_name: String,
    pub last_name: String,
    pub position: Option<String>,
    pub checked_in_at: DateTime<Utc>,
}

/// New visitor registration payload (walk-in form)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterVisitor {
    #[validate(length(min = 1, max = 120))]
    pub first_name: String,
    #[validate(length(min = 1, max = 120))]
    pub last_name: String,
    #[validate(length(max = 120))]
    pub position: Option<String>,
}

/// The terminal training steps, in the fixed order the kiosk walks
/// visitors through them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrainingStep {
    Video,
    Map,
    Risks,
    Department,
    Additional,
}

impl TrainingStep {
    /// Column flipped when this step is completed
    pub fn column(&self) -> &'static str {
        match self {
            TrainingStep::Video => "training_step_video",
            TrainingStep::Map => "training_step_map",
            TrainingStep::Risks => "training_step_risks",
            TrainingStep::Department => "training_step_department",
            TrainingStep::Additional => "training_step_additional",
        }
    }

    /// The step after this one, None after the last
    pub fn next(&self) -> Option<TrainingStep> {
        match self {
            TrainingStep::Video => Some(TrainingStep::Map),
            TrainingStep::Map => Some(TrainingStep::Risks),
            TrainingStep::Risks => Some(TrainingStep::Department),
            TrainingStep::Department => Some(TrainingStep::Additional),
            TrainingStep::Additional => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_training_order_is_linear_and_ends() {
        let mut step = TrainingStep::Video;
        let mut seen = vec![step];
        while let Some(next) = step.next() {
            seen.push(next);
            step = next;
        }
        assert_eq!(
            seen,
            vec![
                TrainingStep::Video,
                TrainingStep::Map,
                TrainingStep::Risks,
                TrainingStep::Department,
                TrainingStep::Additional,
            ]
        );
    }
}
