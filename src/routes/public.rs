use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Read-only content for the portfolio front end, plus the two anonymous writes: admin login
/// and the visitor contact form.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe used by monitors and load balancers.
        .route("/health", get(handlers::health))
        // POST /auth/login
        // Exchanges admin credentials for a bearer token.
        .route("/auth/login", post(handlers::login))
        // GET /bio
        // The singleton profile. Created with placeholder content on first read.
        .route("/bio", get(handlers::get_bio))
        // GET /projects, GET /projects/{id}
        .route("/projects", get(handlers::list_projects))
        .route("/projects/{id}", get(handlers::get_project))
        // GET /skills, GET /skills/{id}
        .route("/skills", get(handlers::list_skills))
        .route("/skills/{id}", get(handlers::get_skill))
        // POST /contact/submit
        // Stores a visitor message. Validated, never authenticated.
        .route("/contact/submit", post(handlers::submit_contact))
}
