mod common;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use common::{TestContext, user_with_role};
use portfolio_api::{
    ApiError, MockStorageService,
    auth::{AdminUser, AuthUser},
    handlers,
    models::{ContactRequest, CreateSkillRequest, SkillCategory, UpdateSkillRequest},
};
use serde_json::json;
use uuid::Uuid;

fn admin() -> AdminUser {
    let user = user_with_role("admin");
    AdminUser(AuthUser {
        id: user.id,
        email: user.email,
        role: user.role,
    })
}

fn skill_request(name: &str, category: &str, proficiency: i64) -> CreateSkillRequest {
    CreateSkillRequest {
        name: Some(name.to_string()),
        category: Some(category.to_string()),
        proficiency: Some(json!(proficiency)),
        icon: None,
    }
}

// --- BIO ---

#[tokio::test]
async fn get_bio_creates_placeholder_once() {
    let ctx = TestContext::new();

    let Json(first) = handlers::get_bio(State(ctx.state.clone())).await.unwrap();
    let Json(second) = handlers::get_bio(State(ctx.state.clone())).await.unwrap();

    assert_eq!(first.id, second.id);
    assert!(first.has_required_fields());
    assert_eq!(first.image, "");
}

// --- PROJECTS ---

#[tokio::test]
async fn list_projects_is_newest_first() {
    let ctx = TestContext::new();
    ctx.repo.insert_project_dated("Old", 30);
    ctx.repo.insert_project_dated("New", 1);
    ctx.repo.insert_project_dated("Middle", 10);

    let Json(projects) = handlers::list_projects(State(ctx.state.clone())).await.unwrap();
    let titles: Vec<&str> = projects.iter().map(|p| p.title.as_str()).collect();

    assert_eq!(titles, ["New", "Middle", "Old"]);
}

#[tokio::test]
async fn get_project_unknown_id_is_not_found() {
    let ctx = TestContext::new();

    let err = handlers::get_project(State(ctx.state.clone()), Path(Uuid::new_v4().to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound(ref msg) if msg == "Project not found"));
}

#[tokio::test]
async fn delete_project_survives_storage_failure() {
    let ctx = TestContext::with_storage(MockStorageService::new_failing());
    let project = ctx.repo.insert_project_dated("Doomed", 0);

    let result = handlers::delete_project(
        admin(),
        State(ctx.state.clone()),
        Path(project.id.to_string()),
    )
    .await;

    assert!(result.is_ok());
    assert_eq!(ctx.repo.project_count(), 0);
}

#[tokio::test]
async fn delete_project_twice_is_not_found() {
    let ctx = TestContext::new();
    let project = ctx.repo.insert_project_dated("Once", 0);

    handlers::delete_project(admin(), State(ctx.state.clone()), Path(project.id.to_string()))
        .await
        .unwrap();
    let err = handlers::delete_project(admin(), State(ctx.state.clone()), Path(project.id.to_string()))
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

// --- SKILLS ---

#[tokio::test]
async fn skills_sorted_by_category_then_name() {
    let ctx = TestContext::new();
    for (name, category) in [
        ("React", "Frontend"),
        ("Rust", "Backend"),
        ("Axum", "Backend"),
        ("Postgres", "Database"),
    ] {
        handlers::create_skill(admin(), State(ctx.state.clone()), Ok(Json(skill_request(name, category, 70))))
            .await
            .unwrap();
    }

    let Json(skills) = handlers::list_skills(State(ctx.state.clone())).await.unwrap();
    let names: Vec<&str> = skills.iter().map(|s| s.name.as_str()).collect();

    assert_eq!(names, ["Axum", "Rust", "Postgres", "React"]);
}

#[tokio::test]
async fn create_skill_returns_201() {
    let ctx = TestContext::new();

    let (status, Json(skill)) = handlers::create_skill(
        admin(),
        State(ctx.state.clone()),
        Ok(Json(skill_request("  Docker ", "Tools", 0))),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(skill.name, "Docker");
    assert_eq!(skill.category, SkillCategory::Tools);
    assert_eq!(skill.proficiency, 0);
}

#[tokio::test]
async fn update_skill_validates_provided_fields_only() {
    let ctx = TestContext::new();
    let (_, Json(skill)) = handlers::create_skill(
        admin(),
        State(ctx.state.clone()),
        Ok(Json(skill_request("Go", "Backend", 40))),
    )
    .await
    .unwrap();

    let err = handlers::update_skill(
        admin(),
        State(ctx.state.clone()),
        Path(skill.id.to_string()),
        Ok(Json(UpdateSkillRequest {
            proficiency: Some(json!(101)),
            ..Default::default()
        })),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Validation(ref errors) if errors[0].path == "proficiency"));

    let Json(updated) = handlers::update_skill(
        admin(),
        State(ctx.state.clone()),
        Path(skill.id.to_string()),
        Ok(Json(UpdateSkillRequest {
            category: Some("Other".to_string()),
            ..Default::default()
        })),
    )
    .await
    .unwrap();
    assert_eq!(updated.category, SkillCategory::Other);
    assert_eq!(updated.proficiency, 40);
}

#[tokio::test]
async fn update_missing_skill_is_not_found() {
    let ctx = TestContext::new();

    let err = handlers::update_skill(
        admin(),
        State(ctx.state.clone()),
        Path(Uuid::new_v4().to_string()),
        Ok(Json(UpdateSkillRequest::default())),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ApiError::NotFound(ref msg) if msg == "Skill not found"));
}

#[tokio::test]
async fn repository_failure_is_a_server_error() {
    let ctx = TestContext::new();
    ctx.repo.set_fail_writes(true);

    let err = handlers::create_skill(
        admin(),
        State(ctx.state.clone()),
        Ok(Json(skill_request("Rust", "Backend", 90))),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

// --- CONTACT ---

#[tokio::test]
async fn contacts_listed_newest_first() {
    let ctx = TestContext::new();
    for name in ["First", "Second"] {
        handlers::submit_contact(
            State(ctx.state.clone()),
            Ok(Json(ContactRequest {
                name: Some(name.to_string()),
                email: Some("visitor@example.com".to_string()),
                message: Some("Hi".to_string()),
            })),
        )
        .await
        .unwrap();
    }

    let Json(contacts) = handlers::list_contacts(admin(), State(ctx.state.clone()))
        .await
        .unwrap();

    assert_eq!(contacts[0].name, "Second");
    assert_eq!(contacts[1].name, "First");
    assert!(contacts.iter().all(|c| !c.read));
}

#[tokio::test]
async fn mark_missing_contact_read_is_not_found() {
    let ctx = TestContext::new();

    let err = handlers::mark_contact_read(admin(), State(ctx.state.clone()), Path(Uuid::new_v4().to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::NotFound(ref msg) if msg == "Contact not found"));
}

#[tokio::test]
async fn delete_missing_contact_is_not_found() {
    let ctx = TestContext::new();

    let err = handlers::delete_contact(admin(), State(ctx.state.clone()), Path("not-an-id".to_string()))
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}
