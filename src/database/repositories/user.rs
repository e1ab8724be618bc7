//! User repository implementation

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::models::user::{Role, User, UserLocation};
use crate::utils::errors::{CampusHubError, Result};

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub identity_token: String,
    pub email: String,
    pub name: String,
    pub image_url: Option<String>,
    pub role: String,
    pub onboarding_completed: bool,
    pub location: Option<Json<UserLocation>>,
    pub interests: Vec<String>,
    pub free_events_created: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = CampusHubError;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(User {
            id: row.id,
            identity_token: row.identity_token,
            email: row.email,
            name: row.name,
            image_url: row.image_url,
            role: row.role.parse::<Role>()?,
            onboarding_completed: row.onboarding_completed,
            location: row.location.map(|Json(location)| location),
            interests: row.interests,
            free_events_created: row.free_events_created,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_users(rows: Vec<UserRow>) -> Result<Vec<User>> {
    rows.into_iter().map(User::try_from).collect()
}

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, identity_token, email, name, image_url, role, onboarding_completed, location, interests, free_events_created, created_at, updated_at FROM users WHERE id = $1"
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Find user by the authentication provider's subject
    pub async fn find_by_identity_token(&self, identity_token: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, identity_token, email, name, image_url, role, onboarding_completed, location, interests, free_events_created, created_at, updated_at FROM users WHERE identity_token = $1"
        )
        .bind(identity_token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Find user by email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, identity_token, email, name, image_url, role, onboarding_completed, location, interests, free_events_created, created_at, updated_at FROM users WHERE email = $1 ORDER BY created_at ASC LIMIT 1"
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// List all users, newest first
    pub async fn list(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, identity_token, email, name, image_url, role, onboarding_completed, location, interests, free_events_created, created_at, updated_at FROM users ORDER BY created_at DESC"
        )
        .fetch_all(&self.pool)
        .await?;

        into_users(rows)
    }

    /// Create a new user
    pub async fn insert(conn: &mut PgConnection, user: &User) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (id, identity_token, email, name, image_url, role, onboarding_completed, location, interests, free_events_created, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id, identity_token, email, name, image_url, role, onboarding_completed, location, interests, free_events_created, created_at, updated_at
            "#
        )
        .bind(user.id)
        .bind(&user.identity_token)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.image_url)
        .bind(user.role.as_str())
        .bind(user.onboarding_completed)
        .bind(user.location.clone().map(Json))
        .bind(&user.interests)
        .bind(user.free_events_created)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&mut *conn)
        .await?;

        User::try_from(row)
    }

    /// Load a user and hold its row lock until the transaction ends
    pub async fn lock(conn: &mut PgConnection, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, identity_token, email, name, image_url, role, onboarding_completed, location, interests, free_events_created, created_at, updated_at FROM users WHERE id = $1 FOR UPDATE"
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(User::try_from).transpose()
    }

    pub async fn lock_by_email(conn: &mut PgConnection, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, identity_token, email, name, image_url, role, onboarding_completed, location, interests, free_events_created, created_at, updated_at FROM users WHERE email = $1 ORDER BY created_at ASC LIMIT 1 FOR UPDATE"
        )
        .bind(email)
        .fetch_optional(&mut *conn)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Write every mutable column of `user`
    pub async fn save(conn: &mut PgConnection, user: &User) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET email = $2,
                name = $3,
                image_url = $4,
                role = $5,
                onboarding_completed = $6,
                location = $7,
                interests = $8,
                updated_at = $9
            WHERE id = $1
            RETURNING id, identity_token, email, name, image_url, role, onboarding_completed, location, interests, free_events_created, created_at, updated_at
            "#
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.image_url)
        .bind(user.role.as_str())
        .bind(user.onboarding_completed)
        .bind(user.location.clone().map(Json))
        .bind(&user.interests)
        .bind(user.updated_at)
        .fetch_one(&mut *conn)
        .await?;

        User::try_from(row)
    }

    pub async fn increment_events_created(conn: &mut PgConnection, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE users SET free_events_created = free_events_created + 1 WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    pub async fn superadmin_exists(conn: &mut PgConnection) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE role = 'superadmin')")
            .fetch_one(&mut *conn)
            .await?;

        Ok(exists.0)
    }
}
