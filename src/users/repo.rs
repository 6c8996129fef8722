use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub verification_code: Uuid, // immutable after creation
    pub verified: bool,
    pub name: Option<String>,
    pub headline: Option<String>,
    pub about: Option<String>,
    pub kind: Option<String>,
    pub area: Option<String>,
    pub contact: Option<String>,
    pub created_at: OffsetDateTime,
}

/// Fields required to persist a freshly registered user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub verification_code: Uuid,
}

/// Repository interface over the credential store. The store owns
/// uniqueness of `email` and `verification_code`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;
    async fn find_by_verification_code(&self, code: Uuid) -> anyhow::Result<Option<User>>;
    async fn insert(&self, new: NewUser) -> anyhow::Result<User>;
    async fn update(&self, user: &User) -> anyhow::Result<User>;
}

const USER_COLUMNS: &str = "id, email, password_hash, verification_code, verified, \
                            name, headline, about, kind, area, contact, created_at";

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_verification_code(&self, code: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE verification_code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn insert(&self, new: NewUser) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, verification_code) \
             VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.verification_code)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn update(&self, user: &User) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users \
             SET verified = $2, name = $3, headline = $4, about = $5, \
                 kind = $6, area = $7, contact = $8 \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(user.verified)
        .bind(&user.name)
        .bind(&user.headline)
        .bind(&user.about)
        .bind(&user.kind)
        .bind(&user.area)
        .bind(&user.contact)
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::Mutex;

    /// In-memory stand-in for the Postgres store, used by service tests.
    #[derive(Default)]
    pub struct InMemoryStore {
        users: Mutex<Vec<User>>,
    }

    impl InMemoryStore {
        pub fn get(&self, email: &str) -> Option<User> {
            self.users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.email == email)
                .cloned()
        }
    }

    #[async_trait]
    impl UserStore for InMemoryStore {
        async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
            Ok(self.get(email))
        }

        async fn find_by_verification_code(&self, code: Uuid) -> anyhow::Result<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.verification_code == code)
                .cloned())
        }

        async fn insert(&self, new: NewUser) -> anyhow::Result<User> {
            let mut users = self.users.lock().unwrap();
            if users.iter().any(|u| u.email == new.email) {
                anyhow::bail!("duplicate email");
            }
            let user = User {
                id: Uuid::new_v4(),
                email: new.email,
                password_hash: new.password_hash,
                verification_code: new.verification_code,
                verified: false,
                name: None,
                headline: None,
                about: None,
                kind: None,
                area: None,
                contact: None,
                created_at: OffsetDateTime::now_utc(),
            };
            users.push(user.clone());
            Ok(user)
        }

        async fn update(&self, user: &User) -> anyhow::Result<User> {
            let mut users = self.users.lock().unwrap();
            let slot = users
                .iter_mut()
                .find(|u| u.id == user.id)
                .ok_or_else(|| anyhow::anyhow!("no such user"))?;
            *slot = user.clone();
            Ok(user.clone())
        }
    }
}
