use crate::{
    AppState,
    auth::{AdminUser, AuthUser, issue_token},
    errors::ApiError,
    models::{
        Bio, BioForm, Contact, ContactRequest, ContactSubmitted, CreateSkillRequest, LoginRequest,
        LoginResponse, MessageResponse, Project, ProjectForm, ProjectUpdate, Skill,
        UpdateSkillRequest, UserSummary,
    },
    password::verify_password,
    storage::discard_image,
    upload::MultipartForm,
    validation::{FieldError, Validate},
};
use axum::{
    Json,
    extract::{Multipart, Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use uuid::Uuid;

type ApiResult<T> = Result<T, ApiError>;

/// Resolves a path id. Anything that is not a UUID cannot name a stored row.
fn parse_id(raw: &str, not_found: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found(not_found))
}

// --- Health ---

/// health
///
/// [Public Route] Liveness probe for monitors and load balancers.
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Server is running", body = MessageResponse))
)]
pub async fn health() -> Json<MessageResponse> {
    Json(MessageResponse::new("Server is running"))
}

// --- Auth ---

/// login
///
/// [Public Route] Exchanges the admin e-mail and password for a signed session token.
/// Unknown e-mail and wrong password produce the same 401 so accounts cannot be probed.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation failed", body = [FieldError]),
        (status = 401, description = "Invalid credentials", body = MessageResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Json(payload) = payload?;
    let credentials = payload.validate()?;

    let Some(user) = state.repo.find_admin_by_email(&credentials.email).await? else {
        tracing::warn!(email = %credentials.email, "login attempt for unknown admin");
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    };

    // bcrypt is CPU bound; keep it off the async workers.
    let hash = user.password_hash.clone();
    let matches = tokio::task::spawn_blocking(move || verify_password(&credentials.password, &hash))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    if !matches {
        tracing::warn!(user_id = %user.id, "login attempt with wrong password");
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = issue_token(&user, &state.config.jwt_secret, state.config.token_ttl)?;
    tracing::info!(user_id = %user.id, "admin logged in");

    Ok(Json(LoginResponse {
        token,
        user: UserSummary::from(&user),
    }))
}

/// get_me
///
/// [Authenticated Route] Returns the identity carried by the presented token.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current identity", body = UserSummary),
        (status = 401, description = "No token"),
        (status = 403, description = "Invalid or expired token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(user: AuthUser) -> Json<UserSummary> {
    Json(user.into())
}

// --- Bio ---

/// get_bio
///
/// [Public Route] Returns the profile, creating the placeholder on first access.
#[utoipa::path(
    get,
    path = "/api/bio",
    responses((status = 200, description = "Profile", body = Bio))
)]
pub async fn get_bio(State(state): State<AppState>) -> ApiResult<Json<Bio>> {
    Ok(Json(state.repo.get_bio().await?))
}

/// update_bio
///
/// [Admin Route] Merges the submitted multipart fields into the profile. A new picture in
/// the `image` field replaces the stored one, which is then deleted.
#[utoipa::path(
    put,
    path = "/api/bio",
    request_body(content = BioForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated profile", body = Bio),
        (status = 400, description = "Name, title, and description are required", body = MessageResponse),
        (status = 413, description = "File too large", body = MessageResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_bio(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<Json<Bio>> {
    let form = MultipartForm::read(multipart, state.config.max_upload_bytes).await?;

    let mut bio = state.repo.get_bio().await?;
    BioForm::from_form(&form).apply(&mut bio);
    if !bio.has_required_fields() {
        return Err(ApiError::bad_request(
            "Name, title, and description are required",
        ));
    }

    let mut replaced = None;
    if let Some(image) = &form.image {
        let path = state.storage.save_image(image).await?;
        replaced = Some(std::mem::replace(&mut bio.image, path));
    }

    let saved = match state.repo.save_bio(&bio).await {
        Ok(saved) => saved,
        Err(e) => {
            if replaced.is_some() {
                discard_image(&state.storage, &bio.image).await;
            }
            return Err(e.into());
        }
    };

    if let Some(old) = replaced {
        discard_image(&state.storage, &old).await;
    }
    tracing::info!(admin = %admin.id, "bio updated");
    Ok(Json(saved))
}

// --- Projects ---

/// list_projects
///
/// [Public Route] All projects, newest first.
#[utoipa::path(
    get,
    path = "/api/projects",
    responses((status = 200, description = "Projects", body = [Project]))
)]
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.repo.list_projects().await?))
}

/// get_project
///
/// [Public Route]
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project", body = Project),
        (status = 404, description = "Project not found", body = MessageResponse)
    )
)]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    let id = parse_id(&id, "Project not found")?;
    state
        .repo
        .get_project(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Project not found"))
}

/// create_project
///
/// [Admin Route] Creates a project from a multipart form. The picture is stored first; if the
/// insert fails it is removed again so no orphan file stays behind.
#[utoipa::path(
    post,
    path = "/api/projects",
    request_body(content = ProjectForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Created", body = Project),
        (status = 400, description = "Validation failed", body = [FieldError]),
        (status = 413, description = "File too large", body = MessageResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_project(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let form = MultipartForm::read(multipart, state.config.max_upload_bytes).await?;
    let mut project = ProjectForm::from_form(&form).validate()?;

    if let Some(image) = &form.image {
        project.image = state.storage.save_image(image).await?;
    }
    let image = project.image.clone();

    match state.repo.create_project(project).await {
        Ok(created) => {
            tracing::info!(admin = %admin.id, project_id = %created.id, "project created");
            Ok((StatusCode::CREATED, Json(created)))
        }
        Err(e) => {
            discard_image(&state.storage, &image).await;
            Err(e.into())
        }
    }
}

/// update_project
///
/// [Admin Route] Partial update from a multipart form. Only submitted fields change.
#[utoipa::path(
    put,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body(content = ProjectForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated", body = Project),
        (status = 400, description = "Validation failed", body = [FieldError]),
        (status = 404, description = "Project not found", body = MessageResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_project(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<Project>> {
    let id = parse_id(&id, "Project not found")?;
    let form = MultipartForm::read(multipart, state.config.max_upload_bytes).await?;
    let mut changes = ProjectUpdate(ProjectForm::from_form(&form)).validate()?;

    let existing = state
        .repo
        .get_project(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    if let Some(image) = &form.image {
        changes.image = Some(state.storage.save_image(image).await?);
    }
    let new_image = changes.image.clone();

    let updated = match state.repo.update_project(id, changes).await {
        Ok(Some(updated)) => updated,
        // Deleted between the lookup and the update.
        Ok(None) => {
            if let Some(path) = &new_image {
                discard_image(&state.storage, path).await;
            }
            return Err(ApiError::not_found("Project not found"));
        }
        Err(e) => {
            if let Some(path) = &new_image {
                discard_image(&state.storage, path).await;
            }
            return Err(e.into());
        }
    };

    if new_image.is_some() {
        discard_image(&state.storage, &existing.image).await;
    }
    tracing::info!(admin = %admin.id, project_id = %id, "project updated");
    Ok(Json(updated))
}

/// delete_project
///
/// [Admin Route] Removes the project and its stored picture.
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Project not found", body = MessageResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_project(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id, "Project not found")?;
    let removed = state
        .repo
        .delete_project(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    discard_image(&state.storage, &removed.image).await;
    tracing::info!(admin = %admin.id, project_id = %id, "project deleted");
    Ok(Json(MessageResponse::new("Project deleted successfully")))
}

// --- Skills ---

/// list_skills
///
/// [Public Route] All skills grouped by category, then alphabetical.
#[utoipa::path(
    get,
    path = "/api/skills",
    responses((status = 200, description = "Skills", body = [Skill]))
)]
pub async fn list_skills(State(state): State<AppState>) -> ApiResult<Json<Vec<Skill>>> {
    Ok(Json(state.repo.list_skills().await?))
}

#[utoipa::path(
    get,
    path = "/api/skills/{id}",
    params(("id" = Uuid, Path, description = "Skill id")),
    responses(
        (status = 200, description = "Skill", body = Skill),
        (status = 404, description = "Skill not found", body = MessageResponse)
    )
)]
pub async fn get_skill(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Skill>> {
    let id = parse_id(&id, "Skill not found")?;
    state
        .repo
        .get_skill(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Skill not found"))
}

/// create_skill
///
/// [Admin Route]
#[utoipa::path(
    post,
    path = "/api/skills",
    request_body = CreateSkillRequest,
    responses(
        (status = 201, description = "Created", body = Skill),
        (status = 400, description = "Validation failed", body = [FieldError])
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_skill(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    payload: Result<Json<CreateSkillRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Skill>)> {
    let Json(payload) = payload?;
    let skill = state.repo.create_skill(payload.validate()?).await?;
    tracing::info!(admin = %admin.id, skill_id = %skill.id, "skill created");
    Ok((StatusCode::CREATED, Json(skill)))
}

/// update_skill
///
/// [Admin Route] Partial update. Each submitted field is validated like on create.
#[utoipa::path(
    put,
    path = "/api/skills/{id}",
    params(("id" = Uuid, Path, description = "Skill id")),
    request_body = UpdateSkillRequest,
    responses(
        (status = 200, description = "Updated", body = Skill),
        (status = 400, description = "Validation failed", body = [FieldError]),
        (status = 404, description = "Skill not found", body = MessageResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_skill(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateSkillRequest>, JsonRejection>,
) -> ApiResult<Json<Skill>> {
    let id = parse_id(&id, "Skill not found")?;
    let Json(payload) = payload?;
    let changes = payload.validate()?;

    let skill = state
        .repo
        .update_skill(id, changes)
        .await?
        .ok_or_else(|| ApiError::not_found("Skill not found"))?;
    tracing::info!(admin = %admin.id, skill_id = %id, "skill updated");
    Ok(Json(skill))
}

#[utoipa::path(
    delete,
    path = "/api/skills/{id}",
    params(("id" = Uuid, Path, description = "Skill id")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Skill not found", body = MessageResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_skill(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id, "Skill not found")?;
    if !state.repo.delete_skill(id).await? {
        return Err(ApiError::not_found("Skill not found"));
    }
    tracing::info!(admin = %admin.id, skill_id = %id, "skill deleted");
    Ok(Json(MessageResponse::new("Skill deleted successfully")))
}

// --- Contact ---

/// submit_contact
///
/// [Public Route] Stores a visitor message from the contact form.
#[utoipa::path(
    post,
    path = "/api/contact/submit",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Message sent successfully", body = ContactSubmitted),
        (status = 400, description = "Validation failed", body = [FieldError])
    )
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<ContactSubmitted>)> {
    let Json(payload) = payload?;
    let contact = state.repo.create_contact(payload.validate()?).await?;
    tracing::info!(contact_id = %contact.id, "contact message received");
    Ok((
        StatusCode::CREATED,
        Json(ContactSubmitted {
            message: "Message sent successfully".to_string(),
            contact,
        }),
    ))
}

/// list_contacts
///
/// [Admin Route] Inbox, newest first.
#[utoipa::path(
    get,
    path = "/api/contact",
    responses((status = 200, description = "Messages", body = [Contact])),
    security(("bearer_auth" = []))
)]
pub async fn list_contacts(
    _admin: AdminUser,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<Contact>>> {
    Ok(Json(state.repo.list_contacts().await?))
}

#[utoipa::path(
    put,
    path = "/api/contact/{id}/read",
    params(("id" = Uuid, Path, description = "Contact id")),
    responses(
        (status = 200, description = "Marked as read", body = Contact),
        (status = 404, description = "Contact not found", body = MessageResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_contact_read(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Contact>> {
    let id = parse_id(&id, "Contact not found")?;
    state
        .repo
        .mark_contact_read(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Contact not found"))
}

#[utoipa::path(
    delete,
    path = "/api/contact/{id}",
    params(("id" = Uuid, Path, description = "Contact id")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Contact not found", body = MessageResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_contact(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    let id = parse_id(&id, "Contact not found")?;
    if !state.repo.delete_contact(id).await? {
        return Err(ApiError::not_found("Contact not found"));
    }
    tracing::info!(admin = %admin.id, contact_id = %id, "contact deleted");
    Ok(Json(MessageResponse::new("Contact deleted successfully")))
}
