use std::future::{Ready, ready};

use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    dev::{Payload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    error::ErrorUnauthorized,
    http::header,
    web,
};
use futures_util::future::LocalBoxFuture;
use serde::Serialize;

use crate::models::plan::Plan;
use crate::state::app_state::AppState;
use crate::utils::jwt::validate_token;

/// Authenticated caller, built from the bearer token and passed to handlers
/// explicitly through the extractor below.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Session {
    pub user_id: String,
    pub username: String,
    pub plan: Plan,
}

impl FromRequest for Session {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Session>()
                .cloned()
                .ok_or_else(|| ErrorUnauthorized("Authentication required")),
        )
    }
}

/// Bearer token middleware. `required` scopes reject anonymous calls;
/// optional scopes only reject malformed or invalid tokens.
pub struct JwtAuth {
    required: bool,
}

impl JwtAuth {
    pub fn required() -> Self {
        Self { required: true }
    }

    pub fn optional() -> Self {
        Self { required: false }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service,
            required: self.required,
        }))
    }
}

pub struct JwtAuthMiddleware<S> {
    service: S,
    required: bool,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Get token from Authorization header
        let auth_header = match req.headers().get(header::AUTHORIZATION) {
            Some(header) => header,
            None if self.required => {
                return Box::pin(async move { Err(ErrorUnauthorized("No authorization header")) });
            }
            None => return Box::pin(self.service.call(req)),
        };

        let auth_header_str = match auth_header.to_str() {
            Ok(header_str) => header_str,
            Err(_) => {
                return Box::pin(
                    async move { Err(ErrorUnauthorized("Invalid authorization header")) },
                );
            }
        };

        let token = match auth_header_str.strip_prefix("Bearer ") {
            Some(token) => token.trim(),
            None => {
                return Box::pin(
                    async move { Err(ErrorUnauthorized("Invalid authorization format")) },
                );
            }
        };

        let secret = req
            .app_data::<web::Data<AppState>>()
            .and_then(|state| state.config.jwt_secret.clone());

        let claims = match validate_token(secret.as_deref(), token) {
            Ok(claims) => claims,
            Err(e) => {
                log::debug!("Rejected token: {:#}", e);
                return Box::pin(async move { Err(ErrorUnauthorized("Invalid token")) });
            }
        };

        // Store the session in request extensions for the extractor
        req.extensions_mut().insert(Session {
            user_id: claims.sub,
            username: claims.username,
            plan: claims.plan,
        });

        Box::pin(self.service.call(req))
    }
}
