use anyhow::{Context, Result};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::models::plan::Plan;
use crate::models::user::User;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (user id)
    pub username: String,
    #[serde(default)]
    pub plan: Plan,
    pub exp: usize, // Expiration time (as UTC timestamp)
    pub iat: usize, // Issued at (as UTC timestamp)
}

pub fn create_token(secret: Option<&str>, user: &User) -> Result<String> {
    let jwt_secret = secret.context("JWT_SECRET not set")?;

    let now = chrono::Utc::now();
    let expiry = now + chrono::Duration::days(10); // 10 days validity

    let claims = Claims {
        sub: user.id.clone(),
        username: user.username.clone(),
        plan: user.plan,
        exp: expiry.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .context("Failed to encode JWT")?;

    Ok(token)
}

pub fn validate_token(secret: Option<&str>, token: &str) -> Result<Claims> {
    let jwt_secret = secret.context("JWT_SECRET not set")?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .context("Failed to decode JWT")?;

    Ok(token_data.claims)
}
