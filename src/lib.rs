// SPDX-License-Identifier: MIT

//! Timetally: personal daily time-tracking ledger and analytics.
//!
//! This crate provides the activity ledger for a 1440-minute daily
//! budget, the analytics aggregator over one day's activities, and the
//! backend API serving both.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use std::sync::Arc;

use config::Config;
use db::SyncGateway;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub gateway: Arc<dyn SyncGateway>,
}
