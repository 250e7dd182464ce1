use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Routes that only need a valid session token, whatever its role.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /auth/me
        // Lets the admin client check whether its stored token is still accepted.
        .route("/auth/me", get(handlers::get_me))
}
