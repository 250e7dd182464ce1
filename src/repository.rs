use crate::models::{
    Bio, Contact, NewContact, NewProject, NewSkill, NewUser, Project, ProjectChanges, Skill,
    SkillChanges, User, ADMIN_ROLE,
};
use async_trait::async_trait;
use sqlx::{PgPool, types::Json};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

/// Repository Trait
///
/// Abstract contract for all persistence operations, so handlers can run against Postgres
/// in production and an in-memory implementation in tests.
///
/// **Send + Sync + async_trait** make the trait object (`Arc<dyn Repository>`) shareable
/// across Axum's task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Bio (singleton) ---
    // Returns the profile, creating the placeholder document on first access.
    async fn get_bio(&self) -> RepoResult<Bio>;
    // Upserts the singleton with the given content.
    async fn save_bio(&self, bio: &Bio) -> RepoResult<Bio>;

    // --- Projects ---
    // Newest `date` first.
    async fn list_projects(&self) -> RepoResult<Vec<Project>>;
    async fn get_project(&self, id: Uuid) -> RepoResult<Option<Project>>;
    async fn find_project_by_title(&self, title: &str) -> RepoResult<Option<Project>>;
    async fn create_project(&self, project: NewProject) -> RepoResult<Project>;
    // Partial update; `None` fields keep their stored value.
    async fn update_project(&self, id: Uuid, changes: ProjectChanges) -> RepoResult<Option<Project>>;
    // Returns the removed row so the caller can clean up its image.
    async fn delete_project(&self, id: Uuid) -> RepoResult<Option<Project>>;

    // --- Skills ---
    // Ordered by category, then name.
    async fn list_skills(&self) -> RepoResult<Vec<Skill>>;
    async fn get_skill(&self, id: Uuid) -> RepoResult<Option<Skill>>;
    async fn create_skill(&self, skill: NewSkill) -> RepoResult<Skill>;
    async fn update_skill(&self, id: Uuid, changes: SkillChanges) -> RepoResult<Option<Skill>>;
    async fn delete_skill(&self, id: Uuid) -> RepoResult<bool>;

    // --- Contacts ---
    async fn create_contact(&self, contact: NewContact) -> RepoResult<Contact>;
    // Newest first.
    async fn list_contacts(&self) -> RepoResult<Vec<Contact>>;
    async fn mark_contact_read(&self, id: Uuid) -> RepoResult<Option<Contact>>;
    async fn delete_contact(&self, id: Uuid) -> RepoResult<bool>;

    // --- Admin account ---
    async fn find_admin_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> RepoResult<User>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const BIO_COLUMNS: &str = "id, name, title, description, image, resume_link, email, phone, \
                           location, social_links, created_at, updated_at";
const PROJECT_COLUMNS: &str = "id, title, description, image, technologies, github_link, \
                               live_link, date, featured, created_at, updated_at";
const SKILL_COLUMNS: &str = "id, name, category, proficiency, icon, created_at, updated_at";
const CONTACT_COLUMNS: &str = "id, name, email, message, read, created_at, updated_at";
const USER_COLUMNS: &str = "id, email, password_hash, role, created_at";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_bio(&self) -> RepoResult<Option<Bio>> {
        let bio = sqlx::query_as::<_, Bio>(&format!("SELECT {BIO_COLUMNS} FROM bio LIMIT 1"))
            .fetch_optional(&self.pool)
            .await?;
        Ok(bio)
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    /// get_bio
    ///
    /// The `singleton` column is UNIQUE and always true, so concurrent first reads insert at
    /// most one placeholder; the loser's insert is a no-op.
    async fn get_bio(&self) -> RepoResult<Bio> {
        if let Some(bio) = self.fetch_bio().await? {
            return Ok(bio);
        }

        let placeholder = Bio::placeholder();
        sqlx::query(
            r#"
            INSERT INTO bio (id, name, title, description, image, resume_link, email, phone,
                             location, social_links, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW())
            ON CONFLICT (singleton) DO NOTHING
            "#,
        )
        .bind(placeholder.id)
        .bind(&placeholder.name)
        .bind(&placeholder.title)
        .bind(&placeholder.description)
        .bind(&placeholder.image)
        .bind(&placeholder.resume_link)
        .bind(&placeholder.email)
        .bind(&placeholder.phone)
        .bind(&placeholder.location)
        .bind(Json(&placeholder.social_links))
        .execute(&self.pool)
        .await?;
        tracing::info!("created placeholder bio");

        match self.fetch_bio().await? {
            Some(bio) => Ok(bio),
            None => Err(sqlx::Error::RowNotFound.into()),
        }
    }

    /// save_bio
    ///
    /// Upsert keyed on the singleton marker; `created_at` of an existing row is preserved.
    async fn save_bio(&self, bio: &Bio) -> RepoResult<Bio> {
        let saved = sqlx::query_as::<_, Bio>(&format!(
            r#"
            INSERT INTO bio (id, name, title, description, image, resume_link, email, phone,
                             location, social_links, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW(), NOW())
            ON CONFLICT (singleton) DO UPDATE SET
                name = EXCLUDED.name,
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                image = EXCLUDED.image,
                resume_link = EXCLUDED.resume_link,
                email = EXCLUDED.email,
                phone = EXCLUDED.phone,
                location = EXCLUDED.location,
                social_links = EXCLUDED.social_links,
                updated_at = NOW()
            RETURNING {BIO_COLUMNS}
            "#
        ))
        .bind(bio.id)
        .bind(&bio.name)
        .bind(&bio.title)
        .bind(&bio.description)
        .bind(&bio.image)
        .bind(&bio.resume_link)
        .bind(&bio.email)
        .bind(&bio.phone)
        .bind(&bio.location)
        .bind(Json(&bio.social_links))
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    async fn list_projects(&self) -> RepoResult<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY date DESC, created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(projects)
    }

    async fn get_project(&self, id: Uuid) -> RepoResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(project)
    }

    async fn find_project_by_title(&self, title: &str) -> RepoResult<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE title = $1 LIMIT 1"
        ))
        .bind(title)
        .fetch_optional(&self.pool)
        .await?;
        Ok(project)
    }

    async fn create_project(&self, project: NewProject) -> RepoResult<Project> {
        let created = sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (id, title, description, image, technologies, github_link,
                                  live_link, date, featured, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), $8, NOW(), NOW())
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.image)
        .bind(&project.technologies)
        .bind(&project.github_link)
        .bind(&project.live_link)
        .bind(project.featured)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// update_project
    ///
    /// `COALESCE` keeps the stored column for every `None` in `changes`.
    async fn update_project(&self, id: Uuid, changes: ProjectChanges) -> RepoResult<Option<Project>> {
        let updated = sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                technologies = COALESCE($4, technologies),
                github_link = COALESCE($5, github_link),
                live_link = COALESCE($6, live_link),
                featured = COALESCE($7, featured),
                image = COALESCE($8, image),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.technologies)
        .bind(changes.github_link)
        .bind(changes.live_link)
        .bind(changes.featured)
        .bind(changes.image)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete_project(&self, id: Uuid) -> RepoResult<Option<Project>> {
        let deleted = sqlx::query_as::<_, Project>(&format!(
            "DELETE FROM projects WHERE id = $1 RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(deleted)
    }

    async fn list_skills(&self) -> RepoResult<Vec<Skill>> {
        let skills = sqlx::query_as::<_, Skill>(&format!(
            "SELECT {SKILL_COLUMNS} FROM skills ORDER BY category ASC, name ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(skills)
    }

    async fn get_skill(&self, id: Uuid) -> RepoResult<Option<Skill>> {
        let skill = sqlx::query_as::<_, Skill>(&format!(
            "SELECT {SKILL_COLUMNS} FROM skills WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(skill)
    }

    async fn create_skill(&self, skill: NewSkill) -> RepoResult<Skill> {
        let created = sqlx::query_as::<_, Skill>(&format!(
            r#"
            INSERT INTO skills (id, name, category, proficiency, icon, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, NOW(), NOW())
            RETURNING {SKILL_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&skill.name)
        .bind(skill.category.as_str())
        .bind(skill.proficiency)
        .bind(&skill.icon)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn update_skill(&self, id: Uuid, changes: SkillChanges) -> RepoResult<Option<Skill>> {
        let updated = sqlx::query_as::<_, Skill>(&format!(
            r#"
            UPDATE skills
            SET name = COALESCE($2, name),
                category = COALESCE($3, category),
                proficiency = COALESCE($4, proficiency),
                icon = COALESCE($5, icon),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {SKILL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.category.map(|c| c.as_str()))
        .bind(changes.proficiency)
        .bind(changes.icon)
        .fetch_optional(&self.pool)
        .await?;
        Ok(updated)
    }

    async fn delete_skill(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM skills WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_contact(&self, contact: NewContact) -> RepoResult<Contact> {
        let created = sqlx::query_as::<_, Contact>(&format!(
            r#"
            INSERT INTO contacts (id, name, email, message, read, created_at, updated_at)
            VALUES ($1, $2, $3, $4, false, NOW(), NOW())
            RETURNING {CONTACT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.message)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn list_contacts(&self) -> RepoResult<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, Contact>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contacts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(contacts)
    }

    async fn mark_contact_read(&self, id: Uuid) -> RepoResult<Option<Contact>> {
        let contact = sqlx::query_as::<_, Contact>(&format!(
            "UPDATE contacts SET read = true, updated_at = NOW() WHERE id = $1 RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(contact)
    }

    async fn delete_contact(&self, id: Uuid) -> RepoResult<bool> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_admin_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND role = $2"
        ))
        .bind(email)
        .bind(ADMIN_ROLE)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, role, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }
}
