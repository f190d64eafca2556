//! Gatehouse Visitor Management System
//!
//! A Rust server for visitor management: kiosk terminal check-in/check-out,
//! PIN lifecycle for planned visits, and an admin REST API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod i18n;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
