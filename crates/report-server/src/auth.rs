//! Bearer-JWT authentication

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

/// Verifies HS256 bearer tokens and extracts the user id claim
#[derive(Clone)]
pub struct AuthVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

#[derive(Debug, Deserialize)]
struct Claims {
    sub: Subject,
}

#[derive(Debug, Deserialize)]
struct Subject {
    user_id: String,
}

impl AuthVerifier {
    /// Create a verifier over a shared secret
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify a token and return its user id
    pub fn verify(&self, token: &str) -> Result<String, ApiError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(
            |error| match error.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::Unauthorized("Token has expired".to_string())
                }
                _ => ApiError::Unauthorized("Invalid token".to_string()),
            },
        )?;

        let user_id = data.claims.sub.user_id;
        if user_id.is_empty() {
            return Err(ApiError::Unauthorized("user id not found".to_string()));
        }
        Ok(user_id)
    }
}

/// Authenticated request principal
///
/// Extracting this from a request enforces the bearer-token check.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// User id from the token's `sub.user_id` claim
    pub user_id: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, ApiError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Token is missing".to_string()))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Invalid token format".to_string()))?;

        let user_id = state.auth.verify(token)?;
        Ok(AuthUser { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde_json::json;

    fn token(secret: &str, user_id: &str, exp_offset: i64) -> String {
        let exp = chrono::Utc::now().timestamp() + exp_offset;
        let claims = json!({"sub": {"user_id": user_id}, "exp": exp});
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("token")
    }

    #[test]
    fn test_valid_token() {
        let verifier = AuthVerifier::new("secret");
        let user_id = verifier.verify(&token("secret", "user-1", 3600)).expect("verify");
        assert_eq!(user_id, "user-1");
    }

    #[test]
    fn test_expired_token() {
        let verifier = AuthVerifier::new("secret");
        let err = verifier.verify(&token("secret", "user-1", -3600)).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(message) if message == "Token has expired"));
    }

    #[test]
    fn test_wrong_secret() {
        let verifier = AuthVerifier::new("secret");
        let err = verifier.verify(&token("other", "user-1", 3600)).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(message) if message == "Invalid token"));
    }

    #[test]
    fn test_empty_user_id() {
        let verifier = AuthVerifier::new("secret");
        let err = verifier.verify(&token("secret", "", 3600)).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(message) if message == "user id not found"));
    }
}
