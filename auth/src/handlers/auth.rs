use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use akiba_models::{AccountProfile, AuthResponse, LoginRequest, MeResponse, SignupRequest};

use crate::errors::{error_response, AuthError};
use crate::services::{AuthResult, AuthenticatedAccount, IdentityService};

fn auth_response(status: StatusCode, result: AuthResult) -> HttpResponse {
    HttpResponse::build(status).json(AuthResponse {
        user: AccountProfile::from(&result.account),
        access_token: result.token,
    })
}

// Validation failures carry an endpoint specific message; every other
// error uses the shared mapping.
fn reject(err: AuthError, invalid_input_message: &str) -> HttpResponse {
    match &err {
        AuthError::InvalidInput(fields) => error_response(
            StatusCode::BAD_REQUEST,
            "validation_error",
            invalid_input_message,
            Some(fields),
        ),
        _ => err.error_response(),
    }
}

pub async fn signup(request: web::Json<SignupRequest>, identity: web::Data<IdentityService>) -> HttpResponse {
    match identity.signup(request.into_inner()).await {
        Ok(result) => auth_response(StatusCode::CREATED, result),
        Err(e) => reject(e, "invalid signup payload"),
    }
}

pub async fn login(request: web::Json<LoginRequest>, identity: web::Data<IdentityService>) -> HttpResponse {
    match identity.login(request.into_inner()).await {
        Ok(result) => auth_response(StatusCode::OK, result),
        Err(e) => reject(e, "invalid login payload"),
    }
}

pub async fn me(caller: AuthenticatedAccount, identity: web::Data<IdentityService>) -> Result<HttpResponse, AuthError> {
    let account = identity.me(caller.id()).await?;
    Ok(HttpResponse::Ok().json(MeResponse {
        user: AccountProfile::from(&account),
    }))
}
