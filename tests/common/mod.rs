#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use chrono::{Duration, Utc};
use portfolio_api::{
    AppConfig, AppState, MockStorageService,
    auth::issue_token,
    models::{
        Bio, Contact, NewContact, NewProject, NewSkill, NewUser, Project, ProjectChanges, Skill,
        SkillChanges, User, ADMIN_ROLE,
    },
    repository::{RepoResult, Repository, RepositoryError, RepositoryState},
    storage::StorageState,
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};
use uuid::Uuid;

// --- IN-MEMORY REPOSITORY ---

#[derive(Default)]
struct Store {
    bio: Option<Bio>,
    projects: Vec<Project>,
    skills: Vec<Skill>,
    contacts: Vec<Contact>,
    users: Vec<User>,
}

/// Repository double that keeps every table in memory and mirrors the Postgres ordering
/// rules. `fail_writes` makes every mutating call return a database error.
#[derive(Default)]
pub struct InMemoryRepository {
    store: Mutex<Store>,
    pub fail_writes: AtomicBool,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_write(&self) -> RepoResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    pub fn project_count(&self) -> usize {
        self.store.lock().unwrap().projects.len()
    }

    /// Inserts a project with an explicit display date, for ordering tests.
    pub fn insert_project_dated(&self, title: &str, days_ago: i64) -> Project {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: format!("{title} description"),
            image: String::new(),
            technologies: vec![],
            github_link: String::new(),
            live_link: String::new(),
            date: now - Duration::days(days_ago),
            featured: false,
            created_at: now,
            updated_at: now,
        };
        self.store.lock().unwrap().projects.push(project.clone());
        project
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_bio(&self) -> RepoResult<Bio> {
        let mut store = self.store.lock().unwrap();
        Ok(store.bio.get_or_insert_with(Bio::placeholder).clone())
    }

    async fn save_bio(&self, bio: &Bio) -> RepoResult<Bio> {
        self.check_write()?;
        let mut store = self.store.lock().unwrap();
        let mut saved = bio.clone();
        if let Some(existing) = &store.bio {
            saved.id = existing.id;
            saved.created_at = existing.created_at;
        }
        saved.updated_at = Utc::now();
        store.bio = Some(saved.clone());
        Ok(saved)
    }

    async fn list_projects(&self) -> RepoResult<Vec<Project>> {
        let mut projects = self.store.lock().unwrap().projects.clone();
        projects.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(projects)
    }

    async fn get_project(&self, id: Uuid) -> RepoResult<Option<Project>> {
        let store = self.store.lock().unwrap();
        Ok(store.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn find_project_by_title(&self, title: &str) -> RepoResult<Option<Project>> {
        let store = self.store.lock().unwrap();
        Ok(store.projects.iter().find(|p| p.title == title).cloned())
    }

    async fn create_project(&self, project: NewProject) -> RepoResult<Project> {
        self.check_write()?;
        let now = Utc::now();
        let created = Project {
            id: Uuid::new_v4(),
            title: project.title,
            description: project.description,
            image: project.image,
            technologies: project.technologies,
            github_link: project.github_link,
            live_link: project.live_link,
            date: now,
            featured: project.featured,
            created_at: now,
            updated_at: now,
        };
        self.store.lock().unwrap().projects.push(created.clone());
        Ok(created)
    }

    async fn update_project(&self, id: Uuid, changes: ProjectChanges) -> RepoResult<Option<Project>> {
        self.check_write()?;
        let mut store = self.store.lock().unwrap();
        let Some(project) = store.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            project.title = title;
        }
        if let Some(description) = changes.description {
            project.description = description;
        }
        if let Some(technologies) = changes.technologies {
            project.technologies = technologies;
        }
        if let Some(github_link) = changes.github_link {
            project.github_link = github_link;
        }
        if let Some(live_link) = changes.live_link {
            project.live_link = live_link;
        }
        if let Some(featured) = changes.featured {
            project.featured = featured;
        }
        if let Some(image) = changes.image {
            project.image = image;
        }
        project.updated_at = Utc::now();
        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, id: Uuid) -> RepoResult<Option<Project>> {
        self.check_write()?;
        let mut store = self.store.lock().unwrap();
        let position = store.projects.iter().position(|p| p.id == id);
        Ok(position.map(|i| store.projects.remove(i)))
    }

    async fn list_skills(&self) -> RepoResult<Vec<Skill>> {
        let mut skills = self.store.lock().unwrap().skills.clone();
        skills.sort_by(|a, b| {
            (a.category.as_str(), a.name.as_str()).cmp(&(b.category.as_str(), b.name.as_str()))
        });
        Ok(skills)
    }

    async fn get_skill(&self, id: Uuid) -> RepoResult<Option<Skill>> {
        let store = self.store.lock().unwrap();
        Ok(store.skills.iter().find(|s| s.id == id).cloned())
    }

    async fn create_skill(&self, skill: NewSkill) -> RepoResult<Skill> {
        self.check_write()?;
        let now = Utc::now();
        let created = Skill {
            id: Uuid::new_v4(),
            name: skill.name,
            category: skill.category,
            proficiency: skill.proficiency,
            icon: skill.icon,
            created_at: now,
            updated_at: now,
        };
        self.store.lock().unwrap().skills.push(created.clone());
        Ok(created)
    }

    async fn update_skill(&self, id: Uuid, changes: SkillChanges) -> RepoResult<Option<Skill>> {
        self.check_write()?;
        let mut store = self.store.lock().unwrap();
        let Some(skill) = store.skills.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            skill.name = name;
        }
        if let Some(category) = changes.category {
            skill.category = category;
        }
        if let Some(proficiency) = changes.proficiency {
            skill.proficiency = proficiency;
        }
        if let Some(icon) = changes.icon {
            skill.icon = icon;
        }
        skill.updated_at = Utc::now();
        Ok(Some(skill.clone()))
    }

    async fn delete_skill(&self, id: Uuid) -> RepoResult<bool> {
        self.check_write()?;
        let mut store = self.store.lock().unwrap();
        let before = store.skills.len();
        store.skills.retain(|s| s.id != id);
        Ok(store.skills.len() < before)
    }

    async fn create_contact(&self, contact: NewContact) -> RepoResult<Contact> {
        self.check_write()?;
        let now = Utc::now();
        let created = Contact {
            id: Uuid::new_v4(),
            name: contact.name,
            email: contact.email,
            message: contact.message,
            read: false,
            created_at: now,
            updated_at: now,
        };
        // Newest first, even when two messages share a timestamp.
        self.store.lock().unwrap().contacts.insert(0, created.clone());
        Ok(created)
    }

    async fn list_contacts(&self) -> RepoResult<Vec<Contact>> {
        let mut contacts = self.store.lock().unwrap().contacts.clone();
        contacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(contacts)
    }

    async fn mark_contact_read(&self, id: Uuid) -> RepoResult<Option<Contact>> {
        self.check_write()?;
        let mut store = self.store.lock().unwrap();
        let Some(contact) = store.contacts.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };
        contact.read = true;
        contact.updated_at = Utc::now();
        Ok(Some(contact.clone()))
    }

    async fn delete_contact(&self, id: Uuid) -> RepoResult<bool> {
        self.check_write()?;
        let mut store = self.store.lock().unwrap();
        let before = store.contacts.len();
        store.contacts.retain(|c| c.id != id);
        Ok(store.contacts.len() < before)
    }

    async fn find_admin_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .users
            .iter()
            .find(|u| u.email == email && u.role == ADMIN_ROLE)
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> RepoResult<User> {
        self.check_write()?;
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        self.store.lock().unwrap().users.push(created.clone());
        Ok(created)
    }
}

// --- TEST HARNESS ---

/// Everything a test needs: the assembled state plus typed handles on the doubles behind it.
pub struct TestContext {
    pub state: AppState,
    pub repo: Arc<InMemoryRepository>,
    pub storage: MockStorageService,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_storage(MockStorageService::new())
    }

    pub fn with_storage(storage: MockStorageService) -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        let state = AppState {
            repo: repo.clone() as RepositoryState,
            storage: Arc::new(storage.clone()) as StorageState,
            config: AppConfig::default(),
        };
        Self {
            state,
            repo,
            storage,
        }
    }

    pub fn router(&self) -> axum::Router {
        portfolio_api::create_router(self.state.clone())
    }

    pub fn admin_token(&self) -> String {
        token_for(&self.state.config, ADMIN_ROLE)
    }

    pub fn token_with_role(&self, role: &str) -> String {
        token_for(&self.state.config, role)
    }
}

pub fn user_with_role(role: &str) -> User {
    User {
        id: Uuid::new_v4(),
        email: "admin@example.com".to_string(),
        password_hash: String::new(),
        role: role.to_string(),
        created_at: Utc::now(),
    }
}

pub fn token_for(config: &AppConfig, role: &str) -> String {
    issue_token(&user_with_role(role), &config.jwt_secret, config.token_ttl).unwrap()
}

// --- MULTIPART BODIES ---

pub const BOUNDARY: &str = "portfolio-test-boundary";

/// Builds a `multipart/form-data` body by hand for `oneshot` router tests.
#[derive(Default)]
pub struct MultipartBody {
    bytes: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, data: &[u8]) -> Self {
        self.bytes.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.bytes.extend_from_slice(data);
        self.bytes.extend_from_slice(b"\r\n");
        self
    }

    pub fn content_type() -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    pub fn finish(mut self) -> Body {
        self.bytes
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Body::from(self.bytes)
    }
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
