//! A booking marketplace for musicians and the organizations that hire them.
//!
//! Organizations post events, musicians apply to play them, and booked
//! musicians upload pictures of their gigs to a public gallery.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod file;
pub mod models;
pub mod routes;
pub mod util;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::Router;
use sqlx::SqlitePool;

use crate::config::Config;

/// Everything a handler needs, shared across requests.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }
}

/// Builds the full HTTP application.
pub fn app(state: AppState) -> Router {
    routes::router(state)
}
