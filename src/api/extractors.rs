//! # Custom Extractors
//!
//! Authentication, locale negotiation and validated JSON bodies. Each
//! extractor runs before the handler; a rejection short-circuits the
//! request with the matching [`AppError`] response.

use axum::{
    async_trait,
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Query},
    http::{header, request::Parts, Request},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use validator::Validate;

use crate::{
    error::AppError,
    models::{Claims, Locale, Role},
    services::{extract_token_from_header, AppState},
};

// =====================================
// Bearer Token Extractor
// =====================================
/// Raw token of the `Authorization: Bearer` header.
///
/// ```rust,ignore
/// async fn handler(BearerToken(token): BearerToken) -> ... {}
/// ```
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for BearerToken {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = extract_token_from_header(auth_header).ok_or_else(|| {
            AppError::Unauthorized("Invalid Authorization header format".to_string())
        })?;

        Ok(BearerToken(token.to_string()))
    }
}

// =====================================
// Auth Extractors
// =====================================
/// Any logged-in principal, customer or staff.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let claims = state.auth_service.verify_token(&token)?;

        Ok(AuthUser(claims))
    }
}

/// A logged-in customer.
#[derive(Debug, Clone)]
pub struct CustomerUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for CustomerUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if claims.role != Role::Customer {
            return Err(AppError::Forbidden("Customer account required".to_string()));
        }

        Ok(CustomerUser(claims))
    }
}

/// Admin only; guards deletes of price types and customers.
#[derive(Debug, Clone)]
pub struct AdminUser(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthUser(claims) = AuthUser::from_request_parts(parts, state).await?;
        if claims.role != Role::Admin {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        Ok(AdminUser(claims))
    }
}

// =====================================
// Optional Auth Extractor
// =====================================
/// Claims when a valid token was sent, `None` otherwise. Never rejects,
/// so storefront endpoints keep working for guests with stale tokens.
#[derive(Debug, Clone, Default)]
pub struct OptionalAuth {
    claims: Option<Claims>,
}

impl OptionalAuth {
    #[must_use]
    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    #[must_use]
    pub fn customer_id(&self) -> Option<&str> {
        self.claims.as_ref().and_then(Claims::customer_id)
    }

    #[must_use]
    pub fn is_staff(&self) -> bool {
        self.claims.as_ref().is_some_and(|c| c.role.is_staff())
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let claims = AuthUser::from_request_parts(parts, state)
            .await
            .ok()
            .map(|AuthUser(claims)| claims);

        Ok(OptionalAuth { claims })
    }
}

// =====================================
// Locale Extractor
// =====================================
#[derive(Debug, Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

/// Response language: `?lang=` first, then `Accept-Language`, then the
/// configured default. Unsupported values are skipped, not rejected.
#[derive(Debug, Clone, Copy)]
pub struct RequestLocale(pub Locale);

#[async_trait]
impl FromRequestParts<AppState> for RequestLocale {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let from_query = Query::<LangQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(q)| q.lang)
            .and_then(|lang| Locale::from_tag(&lang));

        let locale = from_query
            .or_else(|| {
                parts
                    .headers
                    .get(header::ACCEPT_LANGUAGE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(Locale::from_accept_language)
            })
            .unwrap_or(state.config.default_locale);

        Ok(RequestLocale(locale))
    }
}

// =====================================
// JSON with Validation
// =====================================
/// JSON body that has passed its `validator` rules.
///
/// ```rust,ignore
/// async fn handler(ValidatedJson(body): ValidatedJson<PartnershipRequest>) -> ... {}
/// ```
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data): Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| AppError::BadRequest(format!("Invalid JSON: {e}")))?;

        data.validate()?;

        Ok(ValidatedJson(data))
    }
}

/// Plain JSON body with rejections rendered as our error envelope.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data): Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e: JsonRejection| AppError::BadRequest(format!("Invalid JSON: {e}")))?;

        Ok(JsonBody(data))
    }
}
