use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, StatusCode},
    Error as ActixError, FromRequest, HttpMessage, HttpRequest,
};
use akiba_observability::{record_auth_event, AuthEvent};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;
use std::sync::Arc;

use super::tokens::TokenService;
use crate::errors::{error_response, AuthError};

/// Subject of a verified access token, placed in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAccount(pub String);

impl AuthenticatedAccount {
    pub fn id(&self) -> &str {
        &self.0
    }
}

impl FromRequest for AuthenticatedAccount {
    type Error = AuthError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthenticatedAccount>()
                .cloned()
                .ok_or(AuthError::Unauthorized),
        )
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`. The scheme is
/// matched case-insensitively.
pub fn bearer_token(req: &ServiceRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Rejects requests without a valid access token.
#[derive(Clone)]
pub struct RequireAuth {
    tokens: Arc<TokenService>,
}

impl RequireAuth {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = ActixError;
    type Transform = RequireAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireAuthMiddleware {
            service: Rc::new(service),
            tokens: Arc::clone(&self.tokens),
        }))
    }
}

pub struct RequireAuthMiddleware<S> {
    service: Rc<S>,
    tokens: Arc<TokenService>,
}

impl<S, B> Service<ServiceRequest> for RequireAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = ActixError> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = ActixError;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let tokens = Arc::clone(&self.tokens);

        Box::pin(async move {
            let Some(token) = bearer_token(&req) else {
                let response = error_response(
                    StatusCode::UNAUTHORIZED,
                    "unauthorized",
                    "missing or invalid bearer token",
                    None,
                );
                return Ok(req.into_response(response).map_into_right_body());
            };

            match tokens.verify(&token) {
                Ok(claims) => {
                    req.extensions_mut().insert(AuthenticatedAccount(claims.sub));
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(_) => {
                    record_auth_event(AuthEvent::TokenRejected, None, Some("bearer token failed verification"));
                    let response = error_response(StatusCode::UNAUTHORIZED, "unauthorized", "invalid token", None);
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}
