//! Visit administration service

use chrono::Utc;
use chrono_tz::Tz;

use crate::{
    error::{AppError, AppResult},
    models::{
        enums::{VisitStatus, VisitType},
        visit::{CreateVisit, Visit, VisitQuery},
        visitor::{RegisterVisitor, Visitor},
    },
    repository::Repository,
    services::{email::EmailService, pin::PinService},
};

#[derive(Clone)]
pub struct VisitsService {
    repository: Repository,
    pin: PinService,
    email: EmailService,
    tz: Tz,
}

impl VisitsService {
    pub fn new(repository: Repository, pin: PinService, email: EmailService, tz: Tz) -> Self {
        Self {
            repository,
            pin,
            email,
            tz,
        }
    }

    /// Get a visit by id
    pub async fn get(&self, id: i32) -> AppResult<Visit> {
        self.repository.visits.get_by_id(id).await
    }

    /// List visits by filter
    pub async fn list(&self, query: &VisitQuery) -> AppResult<Vec<Visit>> {
        self.repository.visits.list(query).await
    }

    /// Create a visit. Planned visits with an invitation address get a PIN
    /// generated and the invitation mail sent immediately.
    pub async fn create(&self, request: CreateVisit) -> AppResult<(Visit, Option<String>)> {
        let status = match request.visit_type {
            VisitType::Planned => VisitStatus::Scheduled,
            VisitType::Walkin => VisitStatus::InProgress,
        };
        let invitation_email = request.invitation_email.clone();
        let visit = self.repository.visits.create(&request, status).await?;

        let mut pin = None;
        if visit.visit_type == VisitType::Planned {
            if let Some(email) = invitation_email {
                let (code, expires_at) = self.pin.generate(visit.id).await?;
                let valid_until = expires_at
                    .with_timezone(&self.tz)
                    .format("%d.%m.%Y %H:%M")
                    .to_string();
                self.email
                    .send_invitation(&email, &code, &valid_until)
                    .await?;
                pin = Some(code);
            }
        }

        // Re-read to pick up the PIN columns
        let visit = self.repository.visits.get_by_id(visit.id).await?;
        Ok((visit, pin))
    }

    /// Cancel a visit; cancelled visits no longer offer PIN actions
    pub async fn cancel(&self, id: i32) -> AppResult<Visit> {
        self.repository.visits.get_by_id(id).await?;
        self.repository
            .visits
            .set_status(id, VisitStatus::Cancelled)
            .await?;
        tracing::info!(visit_id = id, "Visit cancelled");
        self.repository.visits.get_by_id(id).await
    }

    /// Stamp the invitation as confirmed
    pub async fn confirm_invitation(&self, id: i32) -> AppResult<Visit> {
        let visit = self.repository.visits.get_by_id(id).await?;
        if visit.status != VisitStatus::Scheduled {
            return Err(AppError::BusinessRule(
                "Only scheduled visits can be confirmed".to_string(),
            ));
        }
        self.repository
            .visits
            .confirm_invitation(id, Utc::now())
            .await?;
        self.repository.visits.get_by_id(id).await
    }

    /// Pre-register a visitor on a visit
    pub async fn add_visitor(&self, id: i32, request: &RegisterVisitor) -> AppResult<Visitor> {
        self.repository.visits.get_by_id(id).await?;
        let visitor = self.repository.visitors.create(request).await?;
        self.repository.visitors.attach_to_visit(id, visitor.id).await?;
        Ok(visitor)
    }
}
