//! API handlers: the admin JSON endpoints and the kiosk terminal pages

pub mod health;
pub mod openapi;
pub mod terminal;
pub mod visits;
