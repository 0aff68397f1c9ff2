//! Credential storage over the `logins` store
//!
//! A login record holds `username`, `password` (encoded PBKDF2 hash), `role`
//! and `user_id`, the key of the account it belongs to. The `username` index
//! is unique, so a second login for the same name is a constraint violation.

use crate::error::{AuthError, AuthResult};
use crate::hash::{hash_password, verify_password, DEFAULT_ROUNDS};
use crate::session::{Role, Session};
use clinic_store::{Key, Record, StoreError, StoreHandle, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// Registers logins and authenticates users
#[derive(Debug, Clone)]
pub struct CredentialStore {
    logins: Arc<dyn StoreHandle>,
    rounds: u32,
}

impl CredentialStore {
    /// Create credential store over a logins store
    #[must_use]
    pub fn new(logins: Arc<dyn StoreHandle>) -> Self {
        Self {
            logins,
            rounds: DEFAULT_ROUNDS,
        }
    }

    /// With PBKDF2 iteration count for new hashes
    #[inline]
    #[must_use]
    pub fn with_rounds(mut self, rounds: u32) -> Self {
        self.rounds = rounds.max(1);
        self
    }

    /// Register a login
    ///
    /// # Errors
    /// - `AuthError::Store(ConstraintViolation)` if the username is taken
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: Role,
        user: Key,
    ) -> AuthResult<Key> {
        let record = Record::new()
            .with("username", username)
            .with("password", hash_password(password, self.rounds))
            .with("role", role.as_str())
            .with("user_id", user);
        let key = self.logins.add(record).await?;
        info!(username, role = %role, "Login registered");
        Ok(key)
    }

    /// Create the login of an existing admin; the username is the admin's email
    ///
    /// # Errors
    /// - `AuthError::UnknownAccount` if no admin has `admin_id`, or it has no
    ///   email
    pub async fn create_admin_login(
        &self,
        admins: &dyn StoreHandle,
        admin_id: &Key,
        password: &str,
    ) -> AuthResult<Key> {
        let admin = admins.require(admin_id).await.map_err(|err| match err {
            StoreError::NotFound { .. } => AuthError::UnknownAccount(admin_id.to_string()),
            other => AuthError::Store(other),
        })?;
        let email = admin
            .text("email")
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| AuthError::UnknownAccount(format!("admin {admin_id} has no email")))?
            .to_string();

        self.register(&email, password, Role::Admin, admin_id.clone())
            .await
    }

    /// Check a username/password pair and open a session
    ///
    /// Unknown usernames and wrong passwords both yield
    /// `AuthError::InvalidCredentials`.
    pub async fn authenticate(&self, username: &str, password: &str) -> AuthResult<Session> {
        let matches = self
            .logins
            .get_all_by_index("username", &Value::from(username))
            .await?;
        let Some(login) = matches.into_iter().next() else {
            warn!(username, "Login failed: unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        let encoded = login
            .text("password")
            .ok_or_else(|| AuthError::malformed("login record has no password"))?;
        if !verify_password(password, encoded)? {
            warn!(username, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let role = login
            .text("role")
            .and_then(|r| r.parse::<Role>().ok())
            .unwrap_or(Role::Admin);
        let user = login
            .get("user_id")
            .and_then(Value::as_key)
            .or_else(|| login.key(&self.logins.schema().key_field))
            .ok_or_else(|| AuthError::UnknownAccount(username.to_string()))?;

        info!(username, role = %role, "Login succeeded");
        Ok(Session {
            user,
            username: username.to_string(),
            role,
        })
    }
}
