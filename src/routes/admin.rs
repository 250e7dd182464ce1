use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Admin Router Module
///
/// Every content mutation plus the contact inbox.
///
/// Access Control:
/// The handlers take `AdminUser`, so the role check travels with the handler itself rather
/// than with the router it happens to be mounted on.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // PUT /bio (multipart)
        .route("/bio", put(handlers::update_bio))
        // POST /projects (multipart)
        .route("/projects", post(handlers::create_project))
        // PUT/DELETE /projects/{id}
        // Replacing or deleting a project also removes its stored picture.
        .route(
            "/projects/{id}",
            put(handlers::update_project).delete(handlers::delete_project),
        )
        // POST /skills, PUT/DELETE /skills/{id}
        .route("/skills", post(handlers::create_skill))
        .route(
            "/skills/{id}",
            put(handlers::update_skill).delete(handlers::delete_skill),
        )
        // GET /contact
        // The inbox of visitor messages, newest first.
        .route("/contact", get(handlers::list_contacts))
        // PUT /contact/{id}/read
        .route("/contact/{id}/read", put(handlers::mark_contact_read))
        // DELETE /contact/{id}
        .route("/contact/{id}", axum::routing::delete(handlers::delete_contact))
}
