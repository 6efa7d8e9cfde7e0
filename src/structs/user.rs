use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::plan::{Capabilities, Plan};

#[derive(Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 32, message = "Username must be 3-32 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    pub plan: Plan,
}

#[derive(Deserialize)]
pub struct PlanRequest {
    pub pro: bool,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub user_id: String,
    pub username: String,
    pub plan: Plan,
    pub capabilities: Capabilities,
}
