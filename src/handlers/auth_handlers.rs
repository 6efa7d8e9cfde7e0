use actix_web::{HttpResponse, Result, error, http::StatusCode, web};
use bcrypt::{hash, verify};
use log::info;
use validator::Validate;

use super::{json_error, store_error};
use crate::db::store::StoreError;
use crate::middlewares::authmw::Session;
use crate::models::plan::Plan;
use crate::models::user::{User, UserResponse};
use crate::state::app_state::AppState;
use crate::structs::user::{LoginRequest, LoginResponse, PlanRequest, SessionResponse, SignupRequest};
use crate::utils::jwt::create_token;

fn issue_token(app_state: &AppState, user: &User) -> Result<String> {
    create_token(app_state.config.jwt_secret.as_deref(), user)
        .map_err(|e| error::ErrorInternalServerError(format!("Token generation failed: {}", e)))
}

pub async fn signup(
    app_state: web::Data<AppState>,
    web::Json(req): web::Json<SignupRequest>,
) -> Result<HttpResponse> {
    if let Err(errors) = req.validate() {
        return Ok(HttpResponse::BadRequest().json(errors));
    }
    let backend = app_state.backend()?;

    let password_hash = hash(&req.password, app_state.config.bcrypt_cost)
        .map_err(|e| error::ErrorInternalServerError(format!("Failed to hash password: {}", e)))?;
    let user = User::new(req.username, req.email, password_hash);

    match backend.users.insert_user(&user).await {
        Ok(()) => {}
        Err(StoreError::Conflict(_)) => {
            return Err(json_error(StatusCode::CONFLICT, "Username already taken"));
        }
        Err(e) => return Err(store_error(e)),
    }
    info!("Registered user {}", user.username);

    let token = issue_token(&app_state, &user)?;
    Ok(HttpResponse::Created().json(LoginResponse {
        token,
        username: user.username,
        plan: user.plan,
    }))
}

pub async fn login(
    app_state: web::Data<AppState>,
    web::Json(req): web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    let backend = app_state.backend()?;

    let user = backend
        .users
        .find_user_by_username(&req.username)
        .await
        .map_err(store_error)?;

    match user {
        Some(user) => {
            let password_matches = verify(&req.password, &user.password_hash)
                .map_err(|_| error::ErrorInternalServerError("Password verification failed"))?;

            if !password_matches {
                return Ok(HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "Invalid credentials"
                })));
            }

            let token = issue_token(&app_state, &user)?;

            backend
                .users
                .touch_last_login(&user.id)
                .await
                .map_err(|e| {
                    error::ErrorInternalServerError(format!("Failed to update last login: {}", e))
                })?;

            Ok(HttpResponse::Ok().json(LoginResponse {
                token,
                username: user.username,
                plan: user.plan,
            }))
        }
        None => Ok(HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Invalid credentials"
        }))),
    }
}

/// The caller's session as the middleware built it from the token.
pub async fn session(session: Session) -> HttpResponse {
    HttpResponse::Ok().json(SessionResponse {
        capabilities: session.plan.capabilities(),
        user_id: session.user_id,
        username: session.username,
        plan: session.plan,
    })
}

/// Stored account details for the caller.
pub async fn profile(app_state: web::Data<AppState>, session: Session) -> Result<HttpResponse> {
    let backend = app_state.backend()?;
    match backend
        .users
        .find_user(&session.user_id)
        .await
        .map_err(store_error)?
    {
        Some(user) => Ok(HttpResponse::Ok().json(UserResponse::from(user))),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "User not found"
        }))),
    }
}

/// Switch between the free and pro plans. Answers with a fresh token that
/// carries the new plan.
pub async fn set_plan(
    app_state: web::Data<AppState>,
    session: Session,
    web::Json(req): web::Json<PlanRequest>,
) -> Result<HttpResponse> {
    let backend = app_state.backend()?;
    let plan = Plan::from_flag(req.pro);

    if !backend
        .users
        .set_plan(&session.user_id, plan)
        .await
        .map_err(store_error)?
    {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "error": "User not found"
        })));
    }

    let user = backend
        .users
        .find_user(&session.user_id)
        .await
        .map_err(store_error)?
        .ok_or_else(|| error::ErrorNotFound("User not found"))?;
    info!("User {} switched to the {} plan", user.username, plan);

    let token = issue_token(&app_state, &user)?;
    Ok(HttpResponse::Ok().json(LoginResponse {
        token,
        username: user.username,
        plan: user.plan,
    }))
}
