use thiserror::Error;

use crate::{
    models::{ADMIN_ROLE, Bio, NewProject, NewUser, SocialLinks},
    password::hash_password,
    repository::{Repository, RepositoryError},
    validation::normalize_email,
};

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@example.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("could not hash password: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

#[derive(Debug, PartialEq, Eq)]
pub enum AdminSeed {
    Created,
    AlreadyExists,
}

/// Titles of the sample projects inserted and skipped by `seed_content`.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ContentSeed {
    pub inserted: Vec<String>,
    pub skipped: Vec<String>,
}

/// seed_admin
///
/// Creates the admin account unless an admin with the same e-mail exists. Safe to rerun.
pub async fn seed_admin(
    repo: &dyn Repository,
    email: &str,
    password: &str,
) -> Result<AdminSeed, SeedError> {
    let email = normalize_email(email);
    if repo.find_admin_by_email(&email).await?.is_some() {
        return Ok(AdminSeed::AlreadyExists);
    }

    let password_hash = hash_password(password)?;
    let user = repo
        .create_user(NewUser {
            email,
            password_hash,
            role: ADMIN_ROLE.to_string(),
        })
        .await?;
    tracing::info!(user_id = %user.id, email = %user.email, "admin account created");
    Ok(AdminSeed::Created)
}

/// seed_content
///
/// Overwrites the profile with the sample bio and inserts each sample project whose title is
/// not stored yet.
pub async fn seed_content(repo: &dyn Repository) -> Result<ContentSeed, SeedError> {
    let mut bio = repo.get_bio().await?;
    apply_sample_bio(&mut bio);
    let bio = repo.save_bio(&bio).await?;
    tracing::info!(name = %bio.name, "bio upserted");

    let mut report = ContentSeed::default();
    for project in sample_projects() {
        if repo.find_project_by_title(&project.title).await?.is_some() {
            tracing::info!(title = %project.title, "project already exists, skipped");
            report.skipped.push(project.title);
            continue;
        }
        let created = repo.create_project(project).await?;
        tracing::info!(title = %created.title, "project inserted");
        report.inserted.push(created.title);
    }
    Ok(report)
}

fn apply_sample_bio(bio: &mut Bio) {
    bio.name = "Portfolio Owner".to_string();
    bio.title = "Full-Stack Web Developer".to_string();
    bio.description = "Full-stack developer focused on responsive interfaces, real-time \
                       features and well-tested backend services."
        .to_string();
    bio.email = String::new();
    bio.phone = String::new();
    bio.resume_link = String::new();
    bio.social_links = SocialLinks {
        github: "https://github.com/".to_string(),
        linkedin: "https://www.linkedin.com/".to_string(),
        twitter: String::new(),
        portfolio: String::new(),
    };
}

fn sample_projects() -> Vec<NewProject> {
    let tags = |tags: &[&str]| tags.iter().map(|t| t.to_string()).collect::<Vec<_>>();
    vec![
        NewProject {
            title: "E-Commerce Platform".to_string(),
            description: "Online store with authentication, product catalog, cart and checkout, \
                          plus an admin dashboard for users, products and orders."
                .to_string(),
            technologies: tags(&["React", "Node.js", "JWT", "REST APIs", "Docker"]),
            github_link: String::new(),
            live_link: String::new(),
            featured: true,
            image: String::new(),
        },
        NewProject {
            title: "Task Management System".to_string(),
            description: "Collaborative task board with role-based dashboards, drag-and-drop \
                          assignment and real-time updates."
                .to_string(),
            technologies: tags(&["React", "Node.js", "WebSockets", "Docker"]),
            github_link: String::new(),
            live_link: String::new(),
            featured: false,
            image: String::new(),
        },
    ]
}
