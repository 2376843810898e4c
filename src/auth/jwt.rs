use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// Claims issued by the identity provider. Tokens are only verified here.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub username: String,
    pub exp: usize,
    pub iat: usize,
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        AppError::Unauthorized
    })
}

#[cfg(test)]
pub fn sign_token(user_id: Uuid, role: &str, username: &str, secret: &str) -> String {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        role: role.to_string(),
        username: username.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(8)).timestamp() as usize,
    };
    encode(&Header::new(Algorithm::HS256), &claims, &EncodingKey::from_secret(secret.as_bytes()))
        .expect("test token signs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_claims_with_the_right_secret() {
        let id = Uuid::new_v4();
        let token = sign_token(id, "supervisor", "ana", "s3cret");
        let claims = verify_token(&token, "s3cret").unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, "supervisor");
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let token = sign_token(Uuid::new_v4(), "technician", "luis", "s3cret");
        assert!(matches!(verify_token(&token, "other"), Err(AppError::Unauthorized)));
    }
}
