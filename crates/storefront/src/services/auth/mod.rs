//! Authentication service.
//!
//! Password registration and sign-in, plus the account owner's profile
//! changes. Session issuance lives in the route layer.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::SqlitePool;

use autocatalog_core::{Email, Role, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::user::{ProfileUpdate, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Profile changes as submitted by the account owner.
#[derive(Debug, Clone, Default)]
pub struct ProfileChange<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub language: Option<&'a str>,
    pub current_password: Option<&'a str>,
    pub new_password: Option<&'a str>,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new user with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        name: Option<&str>,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        self.users
            .create(&email, name, &password_hash, role)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Apply the owner's profile changes.
    ///
    /// Changing the password requires the current one.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailTaken` if another account uses the email.
    /// Returns `AuthError::CurrentPasswordRequired` or
    /// `AuthError::CurrentPasswordIncorrect` for a rejected password change.
    /// Returns `AuthError::UserNotFound` if the account no longer exists.
    pub async fn update_profile(
        &self,
        user_id: &UserId,
        change: &ProfileChange<'_>,
    ) -> Result<User, AuthError> {
        let email = Email::parse(change.email)?;

        if let Some(existing) = self.users.get_by_email(&email).await?
            && &existing.id != user_id
        {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = match change.new_password.filter(|p| !p.is_empty()) {
            Some(new_password) => {
                let current = change
                    .current_password
                    .filter(|p| !p.is_empty())
                    .ok_or(AuthError::CurrentPasswordRequired)?;
                let stored = self
                    .users
                    .password_hash_for(user_id)
                    .await
                    .map_err(not_found_as_missing_user)?;
                verify_password(current, &stored)
                    .map_err(|_| AuthError::CurrentPasswordIncorrect)?;
                validate_password(new_password)?;
                Some(hash_password(new_password)?)
            }
            None => None,
        };

        let update = ProfileUpdate {
            name: change.name.to_owned(),
            email,
            language: change
                .language
                .filter(|l| !l.is_empty())
                .unwrap_or("en")
                .to_owned(),
            password_hash,
        };

        self.users
            .update_profile(user_id, &update)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => not_found_as_missing_user(other),
            })
    }
}

fn not_found_as_missing_user(err: RepositoryError) -> AuthError {
    match err {
        RepositoryError::NotFound => AuthError::UserNotFound,
        other => AuthError::Repository(other),
    }
}

/// Check password requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` for passwords under the minimum length.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password with Argon2id and a fresh salt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_support;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(validate_password("short"), Err(AuthError::WeakPassword(_))));
        assert!(validate_password("longenough").is_ok());
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let pool = test_support::pool().await;
        let auth = AuthService::new(&pool);

        let user = auth
            .register(Some("Kim"), "kim@example.com", "password123", Role::User)
            .await
            .unwrap();
        assert_eq!(user.role, Role::User);

        assert!(matches!(
            auth.register(None, "KIM@example.com", "password123", Role::User).await,
            Err(AuthError::UserAlreadyExists)
        ));

        let logged_in = auth.login("kim@example.com", "password123").await.unwrap();
        assert_eq!(logged_in.id, user.id);
        assert!(matches!(
            auth.login("kim@example.com", "nope-nope").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody@example.com", "password123").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_profile_password_change_rules() {
        let pool = test_support::pool().await;
        let auth = AuthService::new(&pool);
        let user = auth
            .register(None, "lee@example.com", "password123", Role::User)
            .await
            .unwrap();
        auth.register(None, "taken@example.com", "password123", Role::User)
            .await
            .unwrap();

        let mut change = ProfileChange {
            name: "Lee",
            email: "taken@example.com",
            ..ProfileChange::default()
        };
        assert!(matches!(
            auth.update_profile(&user.id, &change).await,
            Err(AuthError::EmailTaken)
        ));

        change.email = "lee@example.com";
        change.new_password = Some("newpassword1");
        assert!(matches!(
            auth.update_profile(&user.id, &change).await,
            Err(AuthError::CurrentPasswordRequired)
        ));

        change.current_password = Some("wrong-password");
        assert!(matches!(
            auth.update_profile(&user.id, &change).await,
            Err(AuthError::CurrentPasswordIncorrect)
        ));

        change.current_password = Some("password123");
        let updated = auth.update_profile(&user.id, &change).await.unwrap();
        assert_eq!(updated.name.as_deref(), Some("Lee"));
        assert_eq!(updated.language, "en");
        assert!(auth.login("lee@example.com", "newpassword1").await.is_ok());
    }
}
