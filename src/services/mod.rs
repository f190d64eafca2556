//! Business logic services

pub mod checkout;
pub mod email;
pub mod pin;
pub mod session;
pub mod templates;
pub mod terminal;
pub mod visits;

use chrono_tz::Tz;

use crate::{
    config::{EmailConfig, TerminalConfig},
    error::{AppError, AppResult},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub pin: pin::PinService,
    pub checkout: checkout::CheckoutService,
    pub terminal: terminal::TerminalService,
    pub visits: visits::VisitsService,
    pub session: session::SessionService,
    pub email: email::EmailService,
    pub templates: templates::TemplateRenderer,
    /// The configured local zone, exposed for display formatting
    pub timezone: Tz,
}

impl Services {
    /// Create all services with the given repository
    pub async fn new(
        repository: Repository,
        terminal_config: TerminalConfig,
        email_config: EmailConfig,
        session: session::SessionService,
    ) -> AppResult<Self> {
        let timezone: Tz = terminal_config
            .timezone
            .parse()
            .map_err(|_| {
                AppError::Internal(format!(
                    "Unknown time zone '{}' in terminal config",
                    terminal_config.timezone
                ))
            })?;

        let pin = pin::PinService::new(
            repository.clone(),
            timezone,
            terminal_config.pin_default_hours,
            terminal_config.pin_warning_hours,
        );
        let checkout = checkout::CheckoutService::new(repository.clone(), timezone);
        let terminal = terminal::TerminalService::new(
            repository.clone(),
            pin.clone(),
            checkout.clone(),
            terminal_config.branch_id,
        );
        let email = email::EmailService::new(email_config);
        let visits = visits::VisitsService::new(
            repository.clone(),
            pin.clone(),
            email.clone(),
            timezone,
        );

        Ok(Self {
            pin,
            checkout,
            terminal,
            visits,
            session,
            email,
            templates: templates::TemplateRenderer::new(&terminal_config.templates_dir),
            timezone,
        })
    }
}
