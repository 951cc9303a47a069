use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::database::models::User;
use crate::database::{DatabaseError, DocumentStore, Repository};
use crate::filter::FilterData;
use crate::types::Role;

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("{0}")]
    Invalid(String),
    #[error("An account with email {0} already exists")]
    EmailTaken(String),
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("User not found")]
    NotFound,
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
}

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone)]
pub struct UserService {
    users: Repository<User>,
    password_cost: u32,
}

impl UserService {
    pub fn new(store: Arc<dyn DocumentStore>, password_cost: u32) -> Self {
        Self {
            users: Repository::new(store),
            password_cost,
        }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<User, UserError> {
        let name = required(input.name, "name")?;
        let email = normalize_email(&required(input.email, "email")?)?;
        let password = input.password.ok_or(UserError::MissingField("password"))?;
        if password.len() < MIN_PASSWORD_LEN {
            return Err(UserError::Invalid(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        if self.find_by_email(&email).await?.is_some() {
            return Err(UserError::EmailTaken(email));
        }

        let password_hash = self.hash(password).await?;
        let user = new_user(name, email, password_hash, input.phone, Role::Customer);
        self.users.save(&user).await?;
        info!("Registered user {} ({})", user.id, user.email);
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User, UserError> {
        let email = email.trim().to_lowercase();
        let user = self.find_by_email(&email).await?.ok_or(UserError::InvalidCredentials)?;
        let (candidate, stored) = (password.to_string(), user.password_hash.clone());
        let matches = tokio::task::spawn_blocking(move || verify_password(&candidate, &stored))
            .await
            .map_err(|e| UserError::Hashing(e.to_string()))?;
        match matches {
            Ok(true) => Ok(user),
            Ok(false) => Err(UserError::InvalidCredentials),
            Err(e) => {
                warn!("Unreadable password hash for user {}: {}", user.id, e);
                Err(UserError::InvalidCredentials)
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> Result<User, UserError> {
        self.users.get(id).await?.ok_or(UserError::NotFound)
    }

    pub async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<User, UserError> {
        let mut user = self.get(id).await?;
        if let Some(name) = update.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(UserError::MissingField("name"));
            }
            user.name = name.to_string();
        }
        if let Some(phone) = update.phone {
            let phone = phone.trim();
            user.phone = (!phone.is_empty()).then(|| phone.to_string());
        }
        user.updated_at = Utc::now();
        self.users.save(&user).await?;
        Ok(user)
    }

    /// Create the admin account, or promote and reset an existing one.
    pub async fn ensure_admin(&self, email: &str, password: &str, name: &str) -> Result<User, UserError> {
        let email = normalize_email(email)?;
        let password_hash = self.hash(password.to_string()).await?;
        let user = match self.find_by_email(&email).await? {
            Some(mut user) => {
                user.role = Role::Admin;
                user.password_hash = password_hash;
                user.updated_at = Utc::now();
                user
            }
            None => new_user(name.to_string(), email, password_hash, None, Role::Admin),
        };
        self.users.save(&user).await?;
        info!("Admin account ready: {}", user.email);
        Ok(user)
    }

    pub async fn count_customers(&self) -> Result<u64, UserError> {
        Ok(self
            .users
            .count(FilterData::new().with_where(json!({ "role": "customer" })))
            .await?)
    }

    /// Hashing runs on the blocking pool.
    async fn hash(&self, password: String) -> Result<String, UserError> {
        let cost = self.password_cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| UserError::Hashing(e.to_string()))?
            .map_err(|e| UserError::Hashing(e.to_string()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserError> {
        Ok(self
            .users
            .select_one(FilterData::new().with_where(json!({ "email": email })))
            .await?)
    }
}

fn new_user(name: String, email: String, password_hash: String, phone: Option<String>, role: Role) -> User {
    let now = Utc::now();
    User {
        id: Uuid::now_v7(),
        name,
        email,
        phone,
        role,
        password_hash,
        created_at: now,
        updated_at: now,
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, UserError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(UserError::MissingField(field))
}

fn normalize_email(email: &str) -> Result<String, UserError> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(UserError::Invalid(format!("Invalid email address: {}", email))),
    }
}
