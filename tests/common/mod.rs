// SPDX-License-Identifier: MIT

use std::sync::Arc;

use timetally::config::Config;
use timetally::db::MemoryGateway;
use timetally::middleware::create_jwt;
use timetally::routes::create_router;
use timetally::AppState;

/// Create a test app backed by the in-memory gateway.
/// Returns the router, the shared state, and the gateway for direct
/// store manipulation.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, Arc<MemoryGateway>) {
    let config = Config::test_default();
    let gateway = Arc::new(MemoryGateway::new());

    let state = Arc::new(AppState {
        config,
        gateway: gateway.clone(),
    });

    (create_router(state.clone()), state, gateway)
}

/// Create a session JWT for a test user.
#[allow(dead_code)]
pub fn create_test_jwt(uid: &str, signing_key: &[u8]) -> String {
    create_jwt(uid, signing_key).expect("JWT creation should not fail")
}
