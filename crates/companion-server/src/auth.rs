use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use companion_core::models::{Actor, Role, User};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::error::ApiError;
use crate::routes::AppState;

/// What a bearer token asserts about its holder. The whole struct is
/// returned verbatim by `GET /auth/me`, so it carries only public fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject id, the `users.id` of the token holder.
    pub sub: i64,
    pub name: String,
    pub email: String,
    #[serde(rename = "userType")]
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    /// The caller these claims stand for, for access checks.
    pub fn actor(&self) -> Actor {
        Actor {
            subject_id: self.sub,
            role: self.role,
        }
    }
}

/// Issues and verifies the HS256 session tokens.
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl_secs: i64,
}

impl TokenSigner {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::default(),
            ttl_secs: config.token_ttl_secs as i64,
        }
    }

    /// Mint a token for a freshly authenticated user.
    pub fn sign(&self, user: &User) -> Result<String, ApiError> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            iat,
            exp: iat + self.ttl_secs,
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|err| {
            tracing::error!("failed to sign token: {err}");
            ApiError::Internal("server error".to_string())
        })
    }

    /// Check signature and expiry. Every failure collapses into the same
    /// 401 so callers cannot probe for why a token was refused.
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| ApiError::Unauthorized("invalid token".to_string()))
    }
}

/// Hash a password for storage.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| {
            tracing::error!("failed to hash password: {err}");
            ApiError::Internal("server error".to_string())
        })
}

/// Check a password against a stored hash. An unparseable hash counts as
/// a mismatch; the row is unusable either way.
pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            tracing::warn!("stored password hash is unreadable: {err}");
            false
        }
    }
}

fn is_public_path(path: &str) -> bool {
    matches!(path, "/" | "/health" | "/auth/signup" | "/auth/login")
}

/// Token gate for everything that is not a public path. On success the
/// verified [`Claims`] are inserted into request extensions for handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if is_public_path(request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("missing authorization header".to_string()))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthorized("malformed auth header".to_string()))?;

    let claims = state.tokens.verify(token)?;
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
