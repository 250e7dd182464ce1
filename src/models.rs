use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    upload::MultipartForm,
    validation::{Checker, FieldError, Validate, parse_flag, parse_tags},
};

/// The only role that may authenticate.
pub const ADMIN_ROLE: &str = "admin";

// --- Core Documents (Mapped to Database) ---

/// Bio
///
/// Singleton profile of the site owner, stored in the `bio` table. Exactly one row exists;
/// it is created with placeholder content the first time it is read.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Bio {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub title: String,
    pub description: String,
    // Public path or URL of the profile picture. Empty when none was uploaded.
    pub image: String,
    pub resume_link: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    #[sqlx(json)]
    pub social_links: SocialLinks,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[serde(default)]
#[ts(export)]
pub struct SocialLinks {
    pub github: String,
    pub linkedin: String,
    pub twitter: String,
    pub portfolio: String,
}

impl SocialLinks {
    /// Overlays the keys present in a JSON object string onto the current links.
    /// Unknown keys and non-string values are ignored. Returns false if `raw` is not a JSON object.
    pub fn merge_json(&mut self, raw: &str) -> bool {
        let Ok(serde_json::Value::Object(map)) = serde_json::from_str::<serde_json::Value>(raw)
        else {
            return false;
        };
        for (key, value) in map {
            let Some(value) = value.as_str() else { continue };
            let slot = match key.as_str() {
                "github" => &mut self.github,
                "linkedin" => &mut self.linkedin,
                "twitter" => &mut self.twitter,
                "portfolio" => &mut self.portfolio,
                _ => continue,
            };
            *slot = value.to_string();
        }
        true
    }
}

impl Bio {
    /// Content used when the singleton is read before the owner ever saved it.
    pub fn placeholder() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: "Portfolio Owner".to_string(),
            title: "Full-Stack Web Developer".to_string(),
            description: "Full-stack developer building responsive, real-time web applications."
                .to_string(),
            image: String::new(),
            resume_link: String::new(),
            email: String::new(),
            phone: String::new(),
            location: String::new(),
            social_links: SocialLinks::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Name, title and description may never be blank.
    pub fn has_required_fields(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.title.trim().is_empty()
            && !self.description.trim().is_empty()
    }
}

/// Project
///
/// A portfolio entry from the `projects` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Project {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image: String,
    pub technologies: Vec<String>,
    pub github_link: String,
    pub live_link: String,
    // Display date; lists are ordered by it, newest first.
    #[ts(type = "string")]
    pub date: DateTime<Utc>,
    pub featured: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// SkillCategory
///
/// Closed set of skill groupings. Stored as its name in a TEXT column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub enum SkillCategory {
    Frontend,
    Backend,
    Database,
    Tools,
    Other,
}

#[derive(Debug, Error)]
#[error("unknown skill category `{0}`")]
pub struct UnknownCategory(pub String);

impl SkillCategory {
    pub const ALL: [SkillCategory; 5] = [
        Self::Frontend,
        Self::Backend,
        Self::Database,
        Self::Tools,
        Self::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Frontend => "Frontend",
            Self::Backend => "Backend",
            Self::Database => "Database",
            Self::Tools => "Tools",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for SkillCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for SkillCategory {
    type Error = UnknownCategory;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == value)
            .ok_or(UnknownCategory(value))
    }
}

/// Skill
///
/// A named competency from the `skills` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Skill {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub category: SkillCategory,
    // Always within 0..=100.
    pub proficiency: i32,
    pub icon: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Contact
///
/// A visitor message from the `contacts` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Contact {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub message: String,
    pub read: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// User
///
/// The admin account from the `users` table. Never serialized: the hash stays server-side.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

// --- Validated Inputs (Repository Arguments) ---

#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub github_link: String,
    pub live_link: String,
    pub featured: bool,
    pub image: String,
}

/// Partial project update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub technologies: Option<Vec<String>>,
    pub github_link: Option<String>,
    pub live_link: Option<String>,
    pub featured: Option<bool>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSkill {
    pub name: String,
    pub category: SkillCategory,
    pub proficiency: i32,
    pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillChanges {
    pub name: Option<String>,
    pub category: Option<SkillCategory>,
    pub proficiency: Option<i32>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

// --- Request Payloads (Input Schemas) ---

/// ProjectForm
///
/// Text fields of the multipart body for `POST /projects` and `PUT /projects/{id}`.
/// The optional picture travels in the file field `image`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProjectForm {
    pub title: Option<String>,
    pub description: Option<String>,
    /// JSON array of strings, e.g. `["Rust","Axum"]`.
    #[schema(example = r#"["Rust","Axum"]"#)]
    pub technologies: Option<String>,
    pub github_link: Option<String>,
    pub live_link: Option<String>,
    /// `"true"` marks the project as featured.
    pub featured: Option<String>,
}

impl ProjectForm {
    pub fn from_form(form: &MultipartForm) -> Self {
        Self {
            title: form.text("title"),
            description: form.text("description"),
            technologies: form.text("technologies"),
            github_link: form.text("githubLink"),
            live_link: form.text("liveLink"),
            featured: form.text("featured"),
        }
    }

    fn technologies(checker: &mut Checker, raw: Option<String>) -> Option<Vec<String>> {
        let raw = raw.filter(|r| !r.trim().is_empty())?;
        let tags = parse_tags(&raw);
        if tags.is_none() {
            checker.fail("technologies", "technologies must be a JSON array of strings");
        }
        tags
    }
}

impl Validate for ProjectForm {
    type Output = NewProject;

    fn validate(self) -> Result<NewProject, Vec<FieldError>> {
        let mut checker = Checker::new();
        let title = checker.required_text("title", self.title);
        let description = checker.required_text("description", self.description);
        let technologies = Self::technologies(&mut checker, self.technologies).unwrap_or_default();
        checker.finish(NewProject {
            title,
            description,
            technologies,
            github_link: self.github_link.unwrap_or_default(),
            live_link: self.live_link.unwrap_or_default(),
            featured: self.featured.as_deref().is_some_and(parse_flag),
            image: String::new(),
        })
    }
}

/// ProjectUpdate
///
/// Validation rules for a partial project update: provided title and description must be
/// non-empty, links may be cleared, technologies are only replaced when non-blank.
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate(pub ProjectForm);

impl Validate for ProjectUpdate {
    type Output = ProjectChanges;

    fn validate(self) -> Result<ProjectChanges, Vec<FieldError>> {
        let form = self.0;
        let mut checker = Checker::new();
        let title = checker.optional_text("title", form.title);
        let description = checker.optional_text("description", form.description);
        let technologies = ProjectForm::technologies(&mut checker, form.technologies);
        checker.finish(ProjectChanges {
            title,
            description,
            technologies,
            github_link: form.github_link,
            live_link: form.live_link,
            featured: form.featured.as_deref().map(parse_flag),
            image: None,
        })
    }
}

/// BioForm
///
/// Text fields of the multipart body for `PUT /bio`. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BioForm {
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub resume_link: Option<String>,
    /// JSON object string; provided keys overwrite the stored links.
    #[schema(example = r#"{"github":"https://github.com/me"}"#)]
    pub social_links: Option<String>,
}

impl BioForm {
    pub fn from_form(form: &MultipartForm) -> Self {
        Self {
            name: form.text("name"),
            title: form.text("title"),
            description: form.text("description"),
            email: form.text("email"),
            phone: form.text("phone"),
            location: form.text("location"),
            resume_link: form.text("resumeLink"),
            social_links: form.text("socialLinks"),
        }
    }

    /// Merges the submitted fields into `bio`.
    pub fn apply(self, bio: &mut Bio) {
        if let Some(name) = self.name {
            bio.name = name.trim().to_string();
        }
        if let Some(title) = self.title {
            bio.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            bio.description = description;
        }
        if let Some(email) = self.email {
            bio.email = email;
        }
        if let Some(phone) = self.phone {
            bio.phone = phone;
        }
        if let Some(location) = self.location {
            bio.location = location;
        }
        if let Some(resume_link) = self.resume_link {
            bio.resume_link = resume_link;
        }
        if let Some(raw) = self.social_links.filter(|raw| !raw.trim().is_empty()) {
            if !bio.social_links.merge_json(&raw) {
                tracing::warn!("ignoring unparsable socialLinks field");
            }
        }
    }
}

/// CreateSkillRequest
///
/// Input payload for `POST /skills`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateSkillRequest {
    pub name: Option<String>,
    #[schema(example = "Backend")]
    pub category: Option<String>,
    /// Integer 0-100. Numeric strings are accepted.
    #[schema(value_type = Option<i32>, example = 80)]
    #[ts(type = "number | string | null")]
    pub proficiency: Option<serde_json::Value>,
    pub icon: Option<String>,
}

fn check_category(checker: &mut Checker, raw: String) -> Option<SkillCategory> {
    let category = SkillCategory::try_from(raw).ok();
    if category.is_none() {
        checker.fail(
            "category",
            "category must be one of Frontend, Backend, Database, Tools, Other",
        );
    }
    category
}

impl Validate for CreateSkillRequest {
    type Output = NewSkill;

    fn validate(self) -> Result<NewSkill, Vec<FieldError>> {
        let mut checker = Checker::new();
        let name = checker.required_text("name", self.name);
        let category = check_category(&mut checker, self.category.unwrap_or_default());
        let proficiency = checker.int_in_range("proficiency", self.proficiency.as_ref(), 0, 100);
        match (category, proficiency) {
            (Some(category), Some(proficiency)) => checker.finish(NewSkill {
                name,
                category,
                proficiency,
                icon: self.icon.unwrap_or_default(),
            }),
            _ => Err(checker.into_errors()),
        }
    }
}

/// UpdateSkillRequest
///
/// Partial update payload for `PUT /skills/{id}`. Each provided field is validated like on create.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateSkillRequest {
    pub name: Option<String>,
    pub category: Option<String>,
    #[schema(value_type = Option<i32>)]
    #[ts(type = "number | string | null")]
    pub proficiency: Option<serde_json::Value>,
    pub icon: Option<String>,
}

impl Validate for UpdateSkillRequest {
    type Output = SkillChanges;

    fn validate(self) -> Result<SkillChanges, Vec<FieldError>> {
        let mut checker = Checker::new();
        let name = checker.optional_text("name", self.name);
        let category = self
            .category
            .and_then(|raw| check_category(&mut checker, raw));
        let proficiency = self
            .proficiency
            .as_ref()
            .and_then(|value| checker.int_in_range("proficiency", Some(value), 0, 100));
        checker.finish(SkillChanges {
            name,
            category,
            proficiency,
            icon: self.icon,
        })
    }
}

/// ContactRequest
///
/// Input payload for the public contact form (`POST /contact/submit`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ContactRequest {
    pub name: Option<String>,
    #[schema(example = "visitor@example.com")]
    pub email: Option<String>,
    pub message: Option<String>,
}

impl Validate for ContactRequest {
    type Output = NewContact;

    fn validate(self) -> Result<NewContact, Vec<FieldError>> {
        let mut checker = Checker::new();
        let name = checker.required_text("name", self.name);
        let email = checker.email("email", self.email);
        let message = checker.required_text("message", self.message);
        checker.finish(NewContact {
            name,
            email,
            message,
        })
    }
}

/// LoginRequest
///
/// Input payload for `POST /auth/login`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    #[schema(example = "admin@example.com")]
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Validate for LoginRequest {
    type Output = Credentials;

    fn validate(self) -> Result<Credentials, Vec<FieldError>> {
        let mut checker = Checker::new();
        let email = checker.email("email", self.email);
        let password = match self.password {
            Some(password) if !password.is_empty() => password,
            _ => {
                checker.fail("password", "password is required");
                String::new()
            }
        };
        checker.finish(Credentials { email, password })
    }
}

// --- Responses (Output Schemas) ---

/// UserSummary
///
/// Public view of the admin identity, returned by login and `GET /auth/me`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub role: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// ContactSubmitted
///
/// Confirmation returned to the visitor together with the stored message.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ContactSubmitted {
    pub message: String,
    pub contact: Contact,
}
