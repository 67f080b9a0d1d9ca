//! # Staff users, roles and token claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::CustomerResponse;
use crate::error::{Result, ResultExt};

// =====================================
// Roles
// =====================================
/// Who a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Manager,
    Admin,
}

impl Role {
    /// Back office access.
    #[must_use]
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Manager | Self::Admin)
    }
}

// =====================================
// Password Hashing
// =====================================
/// Argon2 hash with a fresh random salt.
///
/// # Errors
/// Fails only if the hasher itself fails.
pub fn hash_password(password: &str) -> Result<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);

    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_internal()?
        .to_string())
}

/// Check `password` against a stored Argon2 hash.
///
/// # Errors
/// Fails when the stored hash cannot be parsed.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed_hash = PasswordHash::new(password_hash).map_internal()?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

// =====================================
// Staff User Entity
// =====================================
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// # Errors
    /// Fails when the stored hash is malformed.
    pub fn verify_password(&self, password: &str) -> Result<bool> {
        verify_password(password, &self.password_hash)
    }
}

/// Insert payload for a staff user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub role: Role,
}

impl CreateUser {
    /// Hashes the password.
    ///
    /// # Errors
    /// Fails if hashing fails.
    pub fn new(
        email: impl Into<String>,
        password: &str,
        name: Option<String>,
        role: Role,
    ) -> Result<Self> {
        Ok(Self {
            id: super::new_id(),
            email: email.into().to_lowercase(),
            password_hash: hash_password(password)?,
            name,
            role,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

// =====================================
// Auth Requests / Responses
// =====================================
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StaffLoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CustomerLoginRequest {
    #[validate(length(min = 3, max = 32, message = "Nickname must be 3-32 characters"))]
    pub nickname: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// The logged-in principal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Profile {
    Customer(CustomerResponse),
    Staff(UserResponse),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub profile: Profile,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

// =====================================
// JWT Claims
// =====================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Customer id or staff user id, depending on `role`
    pub sub: String,

    pub role: Role,

    /// Expiration (unix seconds)
    pub exp: i64,

    /// Issued at (unix seconds)
    pub iat: i64,
}

impl Claims {
    #[must_use]
    pub fn new(subject: &str, role: Role, expiration_hours: u64) -> Self {
        let now = Utc::now();
        // ten years is plenty and keeps the arithmetic in range
        let hours = i64::try_from(expiration_hours.min(24 * 365 * 10)).unwrap_or(24);
        let exp = now + chrono::Duration::hours(hours);

        Self {
            sub: subject.to_string(),
            role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        }
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Customer id, if the token belongs to a customer.
    #[must_use]
    pub fn customer_id(&self) -> Option<&str> {
        (self.role == Role::Customer).then_some(self.sub.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(verify_password("s3cret-pass", &hash).unwrap());
        assert!(!verify_password("wrong-pass", &hash).unwrap());
    }

    #[test]
    fn claims_expiration() {
        let claims = Claims::new("c1", Role::Customer, 1);
        assert!(!claims.is_expired());
        assert_eq!(claims.customer_id(), Some("c1"));

        let expired = Claims {
            sub: "u1".to_string(),
            role: Role::Admin,
            exp: Utc::now().timestamp() - 3600,
            iat: Utc::now().timestamp() - 7200,
        };
        assert!(expired.is_expired());
        assert_eq!(expired.customer_id(), None);
    }

    #[test]
    fn staff_roles() {
        assert!(Role::Admin.is_staff());
        assert!(Role::Manager.is_staff());
        assert!(!Role::Customer.is_staff());
    }
}
