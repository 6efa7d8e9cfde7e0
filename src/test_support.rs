use std::sync::Arc;

use actix_web::web;

use crate::config::{BackendConfig, Config};
use crate::db::memory::MemoryStore;
use crate::db::store::{Backend, UserStore};
use crate::models::plan::Plan;
use crate::models::user::User;
use crate::state::app_state::AppState;
use crate::style::StyledRenderer;
use crate::utils::jwt::create_token;

pub const ORIGIN: &str = "http://localhost:8080";
pub const SECRET: &str = "test-secret";

pub fn config() -> Config {
    Config {
        bind_address: "127.0.0.1".into(),
        port: 8080,
        host: ORIGIN.into(),
        jwt_secret: Some(SECRET.into()),
        cors_origins: Vec::new(),
        bcrypt_cost: 4,
        backend: BackendConfig::Memory,
    }
}

pub fn state(store: Option<Arc<MemoryStore>>) -> web::Data<AppState> {
    web::Data::new(AppState {
        config: config(),
        backend: store.map(|s| Backend::from_shared("memory", s)),
        renderer: Arc::new(StyledRenderer::new()),
    })
}

/// Register a user directly in the store and return a bearer header value.
pub async fn login(store: &MemoryStore, username: &str, plan: Plan) -> (User, String) {
    let mut user = User::new(username.into(), None, "unused".into());
    user.plan = plan;
    store.insert_user(&user).await.unwrap();
    let token = create_token(Some(SECRET), &user).unwrap();
    (user, format!("Bearer {}", token))
}
