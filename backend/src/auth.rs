use crate::api::AppState;
use crate::error::{ApiError, ApiResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{FromRef, FromRequestParts, Json, Query, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode, Uri},
};
use chess_engine::Identity;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::Row;

pub const USERNAME_LEN: std::ops::RangeInclusive<usize> = 3..=16;
pub const PASSWORD_LEN: std::ops::RangeInclusive<usize> = 7..=72;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    sub: String, // username
    exp: usize,
}

/// Signing material and token lifetime
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl AuthKeys {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        AuthKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    pub fn issue(&self, username: &str) -> ApiResult<String> {
        let expiration = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| ApiError::Internal("Token expiry out of range".into()))?
            .timestamp();

        let claims = Claims {
            sub: username.to_string(),
            exp: expiration as usize,
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|_| ApiError::Internal("Token generation failed".into()))
    }

    pub fn verify(&self, token: &str) -> ApiResult<Identity> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| Identity::new(data.claims.sub))
            .map_err(|_| ApiError::Unauthorized)
    }

    /// Identity from `Authorization: Bearer …` or a `?token=` query parameter
    ///
    /// `Ok(None)` when neither is present; a token that fails to verify is
    /// an error.
    pub fn identity_from(&self, headers: &HeaderMap, uri: &Uri) -> ApiResult<Option<Identity>> {
        let bearer = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string);

        let token = match bearer {
            Some(token) => Some(token),
            None => Query::<TokenQuery>::try_from_uri(uri)
                .ok()
                .and_then(|Query(query)| query.token),
        };

        token.map(|token| self.verify(&token)).transpose()
    }
}

#[derive(Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// An authenticated caller
pub struct AuthUser(pub Identity);

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        state
            .auth
            .identity_from(&parts.headers, &parts.uri)?
            .map(AuthUser)
            .ok_or(ApiError::Unauthorized)
    }
}

fn validate_credentials(username: &str, password: &str) -> ApiResult<()> {
    let starts_with_letter = username
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic());
    if !USERNAME_LEN.contains(&username.chars().count()) || !starts_with_letter {
        return Err(ApiError::InvalidInput(
            "Username must be 3-16 characters and start with a letter".into(),
        ));
    }
    if !PASSWORD_LEN.contains(&password.len()) {
        return Err(ApiError::InvalidInput(
            "Password must be 7-72 characters".into(),
        ));
    }
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<StatusCode> {
    validate_credentials(&payload.username, &payload.password)?;

    // 1. Hash Password
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(payload.password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|_| ApiError::Internal("Password hashing failed".into()))?;

    // 2. Insert into DB
    let result = sqlx::query(
        "INSERT INTO users (id, username, password_hash, created_at) VALUES ($1, $2, $3, $4)",
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(&payload.username)
    .bind(&password_hash)
    .bind(Utc::now())
    .execute(&state.db)
    .await;

    match result {
        Ok(_) => {
            tracing::info!("Registered user {}", payload.username);
            Ok(StatusCode::CREATED)
        }
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(ApiError::Conflict("Username already exists".into()))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    // 1. Fetch User
    let user = sqlx::query("SELECT username, password_hash FROM users WHERE username = $1")
        .bind(&payload.username)
        .fetch_optional(&state.db)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    let username: String = user.get("username");
    let password_hash_str: String = user.get("password_hash");

    // 2. Verify Password
    let parsed_hash = PasswordHash::new(&password_hash_str)
        .map_err(|_| ApiError::Internal("Hash parse error".into()))?;

    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        tracing::warn!("Failed login for {}", payload.username);
        return Err(ApiError::InvalidCredentials);
    }

    // 3. Generate JWT
    let token = state.auth.issue(&username)?;

    Ok(Json(LoginResponse { token, username }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn keys() -> AuthKeys {
        AuthKeys::new("test-secret", Duration::days(1))
    }

    #[test]
    fn test_issued_token_verifies_to_username() {
        let keys = keys();
        let token = keys.issue("alice").expect("Should issue");
        assert_eq!(keys.verify(&token).expect("Should verify"), Identity::new("alice"));
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let other = AuthKeys::new("other-secret", Duration::days(1));
        let token = other.issue("alice").expect("Should issue");
        assert!(matches!(keys().verify(&token), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn test_identity_from_header_or_query() {
        let keys = keys();
        let token = keys.issue("bob").expect("Should issue");

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("header"),
        );
        let plain: Uri = "/games/x/ws".parse().expect("uri");
        assert_eq!(
            keys.identity_from(&headers, &plain).expect("valid"),
            Some(Identity::new("bob"))
        );

        let with_query: Uri = format!("/games/x/ws?token={token}").parse().expect("uri");
        assert_eq!(
            keys.identity_from(&HeaderMap::new(), &with_query).expect("valid"),
            Some(Identity::new("bob"))
        );

        assert_eq!(keys.identity_from(&HeaderMap::new(), &plain).expect("none"), None);

        let garbage: Uri = "/games/x/ws?token=garbage".parse().expect("uri");
        assert!(keys.identity_from(&HeaderMap::new(), &garbage).is_err());
    }

    #[test]
    fn test_credential_rules() {
        assert!(validate_credentials("alice", "password1").is_ok());
        assert!(validate_credentials("al", "password1").is_err());
        assert!(validate_credentials("1alice", "password1").is_err());
        assert!(validate_credentials("a_really_long_username", "password1").is_err());
        assert!(validate_credentials("alice", "short").is_err());
    }
}
