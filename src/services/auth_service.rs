//! # Authentication service
//!
//! Staff log in with email and password, customers with nickname and
//! password. Both get an HS256 JWT whose claims carry the subject id and
//! role.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{info, instrument, warn};
use validator::Validate;

use super::{CustomerService, Service};
use crate::{
    config::Config,
    database::{Repository, UserRepository},
    error::{AppError, Result},
    models::{
        verify_password, Claims, CreateUser, CustomerLoginRequest, LoginResponse, Profile,
        RegisterCustomerRequest, Role, StaffLoginRequest, User, UserResponse,
    },
};

#[derive(Debug, Clone)]
pub struct AuthService {
    users: UserRepository,
    customers: Arc<CustomerService>,
    config: Arc<Config>,
}

impl Service for AuthService {}

impl AuthService {
    #[must_use]
    pub fn new(users: UserRepository, customers: Arc<CustomerService>, config: Arc<Config>) -> Self {
        Self {
            users,
            customers,
            config,
        }
    }

    /// Back office login.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn staff_login(&self, request: StaffLoginRequest) -> Result<LoginResponse> {
        request.validate()?;

        let user = self
            .users
            .find_by_email(&request.email)
            .await?
            .ok_or_else(invalid_credentials)?;

        if !user.is_active {
            return Err(AppError::Forbidden("Account is deactivated".to_string()));
        }

        if !user.verify_password(&request.password)? {
            warn!(email = %request.email, "Failed staff login attempt");
            return Err(invalid_credentials());
        }

        info!(user_id = %user.id, "Staff user logged in");
        let (id, role) = (user.id.clone(), user.role);
        self.issue(&id, role, Profile::Staff(user.into()))
    }

    /// Storefront login. Customers created by staff have no password and
    /// cannot log in.
    #[instrument(skip(self, request), fields(nickname = %request.nickname))]
    pub async fn customer_login(&self, request: CustomerLoginRequest) -> Result<LoginResponse> {
        request.validate()?;

        let customer = self
            .customers
            .find_by_nickname(&request.nickname)
            .await?
            .ok_or_else(invalid_credentials)?;

        let Some(hash) = customer.password_hash.as_deref() else {
            return Err(invalid_credentials());
        };

        if !verify_password(&request.password, hash)? {
            warn!(nickname = %request.nickname, "Failed customer login attempt");
            return Err(invalid_credentials());
        }

        if !customer.is_active {
            return Err(AppError::Forbidden("Account is deactivated".to_string()));
        }

        info!(customer_id = %customer.id, "Customer logged in");
        let id = customer.id.clone();
        self.issue(&id, Role::Customer, Profile::Customer(customer.into()))
    }

    /// Sign up and log in in one step.
    pub async fn register(&self, request: RegisterCustomerRequest) -> Result<LoginResponse> {
        let customer = self.customers.register(request).await?;
        let id = customer.id.clone();
        self.issue(&id, Role::Customer, Profile::Customer(customer.into()))
    }

    /// Fresh token for a still-valid one whose owner still exists and is
    /// active.
    pub async fn refresh(&self, token: &str) -> Result<LoginResponse> {
        let claims = self.verify_token(token)?;
        let profile = self.profile(&claims).await?;
        self.issue(&claims.sub, claims.role, profile)
    }

    /// Current profile of the token owner.
    ///
    /// # Errors
    /// `Unauthorized` when the account no longer exists or was deactivated.
    pub async fn profile(&self, claims: &Claims) -> Result<Profile> {
        let gone = || AppError::Unauthorized("Account no longer available".to_string());

        if claims.role == Role::Customer {
            return match self.customers.get(&claims.sub).await {
                Ok(customer) if customer.is_active => Ok(Profile::Customer(customer.into())),
                Ok(_) | Err(AppError::NotFound(_)) => Err(gone()),
                Err(e) => Err(e),
            };
        }

        let user = self
            .users
            .find_by_id(&claims.sub)
            .await?
            .filter(|u| u.is_active && u.role == claims.role)
            .ok_or_else(gone)?;

        Ok(Profile::Staff(user.into()))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.config.jwt_secret.as_bytes());
        let validation = Validation::new(Algorithm::HS256);

        let token_data = decode::<Claims>(token, &decoding_key, &validation).map_err(|e| {
            warn!(error = %e, "Token verification failed");
            AppError::Unauthorized("Invalid token".to_string())
        })?;

        if token_data.claims.is_expired() {
            return Err(AppError::Unauthorized("Token expired".to_string()));
        }

        Ok(token_data.claims)
    }

    /// Create the configured admin account when no staff user exists yet.
    /// Returns the new account, if one was created.
    #[instrument(skip(self))]
    pub async fn bootstrap_admin(&self) -> Result<Option<UserResponse>> {
        let (Some(email), Some(password)) = (&self.config.admin_email, &self.config.admin_password)
        else {
            return Ok(None);
        };

        if self.users.count().await? > 0 {
            return Ok(None);
        }

        let create = CreateUser::new(email.as_str(), password, Some("Administrator".to_string()), Role::Admin)?;
        let user: User = self.users.create(&create).await?;

        info!(user_id = %user.id, email = %user.email, "Bootstrap admin created");
        Ok(Some(user.into()))
    }

    /// Add a staff account.
    #[instrument(skip(self, password))]
    pub async fn create_staff(&self, email: &str, password: &str, name: Option<String>, role: Role) -> Result<UserResponse> {
        if !role.is_staff() {
            return Err(AppError::BadRequest("Staff role required".to_string()));
        }
        if password.chars().count() < 8 {
            return Err(AppError::BadRequest(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let user = self.users.create(&CreateUser::new(email, password, name, role)?).await?;
        Ok(user.into())
    }

    fn issue(&self, subject: &str, role: Role, profile: Profile) -> Result<LoginResponse> {
        let claims = Claims::new(subject, role, self.config.jwt_expiration_hours);
        let encoding_key = EncodingKey::from_secret(self.config.jwt_secret.as_bytes());
        let token = encode(&Header::default(), &claims, &encoding_key)?;

        Ok(LoginResponse {
            profile,
            token,
            expires_at: DateTime::<Utc>::from_timestamp(claims.exp, 0).unwrap_or_else(Utc::now),
        })
    }
}

/// Same answer for unknown accounts and wrong passwords.
fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".to_string())
}

// =====================================
// Token Utilities
// =====================================
/// Token of an `Authorization: Bearer <token>` header value.
#[must_use]
pub fn extract_token_from_header(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use crate::database::{CustomerRepository, Database, PriceTypeRepository};

    async fn service(config: Config) -> AuthService {
        let db = Database::in_memory().await.unwrap();
        let customers = Arc::new(CustomerService::new(
            CustomerRepository::new(db.clone()),
            PriceTypeRepository::new(db.clone()),
        ));

        AuthService::new(UserRepository::new(db), customers, Arc::new(config))
    }

    #[test]
    fn test_extract_token() {
        assert_eq!(extract_token_from_header("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_token_from_header("Basic abc123"), None);
        assert_eq!(extract_token_from_header("Bearer "), None);
        assert_eq!(extract_token_from_header("abc123"), None);
    }

    #[tokio::test]
    async fn bootstrap_runs_once() {
        let config = ConfigBuilder::new()
            .admin("boss@example.com", "admin-pass-1")
            .build();
        let auth = service(config).await;

        let admin = auth.bootstrap_admin().await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(auth.bootstrap_admin().await.unwrap().is_none());

        let login = auth
            .staff_login(StaffLoginRequest {
                email: "Boss@Example.com".to_string(),
                password: "admin-pass-1".to_string(),
            })
            .await
            .unwrap();

        let claims = auth.verify_token(&login.token).unwrap();
        assert_eq!(claims.role, Role::Admin);
        assert!(matches!(auth.profile(&claims).await.unwrap(), Profile::Staff(_)));
    }

    #[tokio::test]
    async fn customer_register_login_and_refresh() {
        let auth = service(ConfigBuilder::new().build()).await;

        let registered = auth
            .register(RegisterCustomerRequest {
                nickname: "ali".to_string(),
                full_name: "Ali Valiyev".to_string(),
                phone: "+998901234567".to_string(),
                password: "secret-pass".to_string(),
                address: None,
            })
            .await
            .unwrap();
        let claims = auth.verify_token(&registered.token).unwrap();
        assert_eq!(claims.customer_id(), Some(claims.sub.as_str()));

        let err = auth
            .customer_login(CustomerLoginRequest {
                nickname: "ali".to_string(),
                password: "wrong-pass".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let login = auth
            .customer_login(CustomerLoginRequest {
                nickname: "ALI".to_string(),
                password: "secret-pass".to_string(),
            })
            .await
            .unwrap();

        let refreshed = auth.refresh(&login.token).await.unwrap();
        assert!(matches!(refreshed.profile, Profile::Customer(_)));
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() {
        let auth = service(ConfigBuilder::new().jwt_secret("one-secret").build()).await;
        let other = service(ConfigBuilder::new().jwt_secret("another-secret").build()).await;

        let token = other
            .issue("u1", Role::Admin, Profile::Staff(UserResponse {
                id: "u1".to_string(),
                email: "x@example.com".to_string(),
                name: None,
                role: Role::Admin,
                is_active: true,
                created_at: Utc::now(),
            }))
            .unwrap()
            .token;

        assert!(matches!(auth.verify_token(&token), Err(AppError::Unauthorized(_))));
    }
}
