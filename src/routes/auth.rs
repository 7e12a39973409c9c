/**
 * Authentication Routes
 * JWT-based admin sessions: login, verify, logout and the AdminSession guard
 */
use axum::{
    extract::{FromRequestParts, State},
    http::{request::Parts, HeaderMap},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::db::models::{Admin, LoginForm};
use crate::error::{ApiError, ApiResult};
use crate::routes::{SuccessResponse, Valid};
use crate::state::AppState;

// ============================================================================
// Types
// ============================================================================

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub name: String,
    pub exp: i64,
    pub iat: i64,
}

/// Authenticated admin, extracted from `Authorization: Bearer <jwt>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
    pub admin: Admin,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    pub success: bool,
    pub is_valid: bool,
    pub admin: Option<AdminSession>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Sign a session token for `admin`. Returns the token and its expiry.
pub fn issue_token(
    config: &Config,
    admin: &Admin,
) -> Result<(String, DateTime<Utc>), jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let exp = now + Duration::hours(config.session_ttl_hours);

    let claims = Claims {
        sub: admin.id.to_string(),
        email: admin.email.clone(),
        name: admin.name.clone(),
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )?;
    Ok((token, exp))
}

/// Verify and decode access token
pub fn verify_access_token(secret: &str, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Extract bearer token from Authorization header
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn session_from_token(secret: &str, token: &str) -> Option<AdminSession> {
    let claims = verify_access_token(secret, token)
        .map_err(|e| tracing::debug!("Token verification failed: {}", e))
        .ok()?;
    let id = Uuid::parse_str(&claims.sub).ok()?;
    Some(AdminSession {
        id,
        email: claims.email,
        name: claims.name,
    })
}

/// Hash a password with bcrypt on the blocking pool.
pub async fn hash_password(password: String, cost: u32) -> ApiResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("password hashing task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

/// Check a password against a bcrypt hash on the blocking pool.
pub async fn verify_password(password: String, hash: String) -> ApiResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("password check task failed: {e}")))?
        .map_err(|e| ApiError::Internal(format!("password check failed: {e}")))
}

/// Hash checked when the email is unknown, so both login failures cost one
/// bcrypt verification.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| bcrypt::hash("not-an-admin-password", bcrypt::DEFAULT_COST).ok());

/// Spend the same bcrypt work as a real password check, discarding the result.
async fn burn_password_check(password: String) {
    let _ = tokio::task::spawn_blocking(move || {
        DUMMY_HASH
            .as_deref()
            .map(|hash| bcrypt::verify(password, hash))
    })
    .await;
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Authorization required".to_string()))?;

        session_from_token(&state.config().jwt_secret, token)
            .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".to_string()))
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Valid(form): Valid<LoginForm>,
) -> ApiResult<Json<LoginResponse>> {
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let Some(credentials) = state
        .store()
        .admins()
        .find_by_email(&form.email)
        .await
        .map_err(|e| ApiError::from_store(e, "Admin"))?
    else {
        tracing::warn!(email = %form.email, "Login attempt for unknown admin");
        burn_password_check(form.password).await;
        return Err(invalid());
    };

    if !verify_password(form.password, credentials.password_hash.clone()).await? {
        tracing::warn!(email = %form.email, "Login attempt with wrong password");
        return Err(invalid());
    }

    let admin = credentials.to_admin();
    let (access_token, expires_at) = issue_token(state.config(), &admin)
        .map_err(|e| ApiError::Internal(format!("failed to sign token: {e}")))?;

    tracing::info!(admin_id = %admin.id, "Admin logged in");

    Ok(Json(LoginResponse {
        success: true,
        access_token,
        expires_at,
        admin,
    }))
}

/// POST /api/auth/verify
/// Always 200; the body says whether the token is valid.
pub async fn verify_token(State(state): State<AppState>, headers: HeaderMap) -> Json<VerifyResponse> {
    let Some(token) = extract_bearer_token(&headers) else {
        return Json(VerifyResponse {
            success: false,
            is_valid: false,
            admin: None,
            error: Some("No authorization token provided".to_string()),
        });
    };

    match session_from_token(&state.config().jwt_secret, token) {
        Some(session) => Json(VerifyResponse {
            success: true,
            is_valid: true,
            admin: Some(session),
            error: None,
        }),
        None => Json(VerifyResponse {
            success: false,
            is_valid: false,
            admin: None,
            error: Some("Invalid or expired token".to_string()),
        }),
    }
}

/// POST /api/auth/logout
/// Sessions are stateless, so logout only tells the client to drop its token.
pub async fn logout() -> Json<SuccessResponse> {
    SuccessResponse::ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_admin, send, test_config, test_state, TEST_PASSWORD};
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    fn sample_admin() -> Admin {
        Admin {
            id: Uuid::new_v4(),
            email: "root@example.com".to_string(),
            name: "Root".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_verify_access_token_invalid_returns_err() {
        assert!(verify_access_token("secret", "invalid.jwt.token").is_err());
    }

    #[test]
    fn test_token_round_trip_carries_admin_id() {
        let config = test_config();
        let admin = sample_admin();
        let (token, expires_at) = issue_token(&config, &admin).unwrap();
        let claims = verify_access_token(&config.jwt_secret, &token).unwrap();
        assert_eq!(claims.sub, admin.id.to_string());
        assert_eq!(claims.exp, expires_at.timestamp());
        assert!(verify_access_token("another-secret", &token).is_err());
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);
        headers.insert("authorization", "Basic abc".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), None);
        headers.insert("authorization", "Bearer abc.def".parse().unwrap());
        assert_eq!(extract_bearer_token(&headers), Some("abc.def"));
    }

    #[tokio::test]
    async fn test_dummy_hash_is_a_usable_bcrypt_hash() {
        let hash = DUMMY_HASH.as_deref().unwrap();
        assert!(hash.starts_with("$2"));
        assert!(!verify_password("correct-horse".to_string(), hash.to_string())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_unknown_email_still_runs_a_password_check() {
        let (state, _) = test_state();
        let app = crate::create_app(state);

        // Warm the dummy hash so the timing below measures verification only.
        Lazy::force(&DUMMY_HASH);

        let started = std::time::Instant::now();
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "nobody@example.com", "password": TEST_PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid email or password");
        assert!(started.elapsed() >= std::time::Duration::from_millis(5));
    }

    #[tokio::test]
    async fn test_login_with_valid_credentials() {
        let (state, _) = test_state();
        let admin = seed_admin(&state, "root@example.com").await;
        let app = crate::create_app(state);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "root@example.com", "password": TEST_PASSWORD })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["admin"]["id"], admin.id.to_string());
        assert!(body["admin"].get("password").is_none());
        assert!(body["admin"].get("passwordHash").is_none());

        let token = body["accessToken"].as_str().unwrap();
        let (status, body) = send(&app, Method::POST, "/api/auth/verify", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isValid"], true);
        assert_eq!(body["admin"]["email"], "root@example.com");
    }

    #[tokio::test]
    async fn test_login_wrong_password_returns_unauthorized() {
        let (state, _) = test_state();
        seed_admin(&state, "root@example.com").await;
        let app = crate::create_app(state);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "root@example.com", "password": "wrongpassword" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid email or password");
    }

    #[tokio::test]
    async fn test_login_unknown_email_returns_unauthorized() {
        let (state, _) = test_state();
        let app = crate::create_app(state);
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "ghost@example.com", "password": "whatever" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_invalid_email_format_returns_bad_request() {
        let (state, _) = test_state();
        let app = crate::create_app(state);
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "no-at-sign", "password": "admin123" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["fields"].get("email").is_some());
    }

    #[tokio::test]
    async fn test_verify_no_token_returns_error_in_body() {
        let (state, _) = test_state();
        let app = crate::create_app(state);
        let (status, body) = send(&app, Method::POST, "/api/auth/verify", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], false);
        assert_eq!(body["isValid"], false);
    }

    #[tokio::test]
    async fn test_expired_token_is_rejected() {
        let mut config = test_config();
        config.session_ttl_hours = -1;
        let (token, _) = issue_token(&config, &sample_admin()).unwrap();

        let (state, _) = test_state();
        let app = crate::create_app(state);
        let (status, body) =
            send(&app, Method::GET, "/api/admin/works", Some(&token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid or expired token");
    }

    #[tokio::test]
    async fn test_logout_returns_success() {
        let (state, _) = test_state();
        let app = crate::create_app(state);
        let (status, body) = send(&app, Method::POST, "/api/auth/logout", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));
    }
}
