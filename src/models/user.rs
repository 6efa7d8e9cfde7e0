use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::plan::Plan;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub password_hash: String,
    #[serde(default)]
    pub plan: Plan,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(username: String, email: Option<String>, password_hash: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username,
            email,
            password_hash,
            plan: Plan::Free,
            created_at: Utc::now(),
            last_login: None,
        }
    }
}

// For API responses - stripped of sensitive data
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub plan: Plan,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            plan: user.plan,
            created_at: user.created_at,
            last_login: user.last_login,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_hides_password_hash() {
        let user = User::new("ada".into(), None, "$2b$04$hash".into());
        let json = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["plan"], "free");
    }
}
