//! Session authentication routes.
//!
//! Browser form posts. Success answers with a redirect to `/` and the
//! HttpOnly session cookie; the pages under `/signin` and `/signout`
//! render the forms that post here.

use actix_web::cookie::{Cookie, SameSite};
use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use folio_core::domain::User;

use crate::middleware::error::{AppError, AppResult};
use crate::state::{AppState, SESSION_COOKIE};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name cannot be empty"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// POST /auth/register
pub async fn register(
    state: web::Data<AppState>,
    form: web::Form<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = form.into_inner();
    req.validate()?;

    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = state
        .passwords
        .hash(&req.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = state
        .users
        .insert(User::new(req.name, req.email, password_hash))
        .await?;
    let session = state.sessions.issue(user.id).await?;

    tracing::info!("Registered user {}", user.id);
    Ok(signed_in_response(session.token))
}

/// POST /auth/signin
pub async fn signin(
    state: web::Data<AppState>,
    form: web::Form<SigninRequest>,
) -> AppResult<HttpResponse> {
    let req = form.into_inner();
    req.validate()?;

    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = state
        .passwords
        .verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    if !valid {
        return Err(AppError::Unauthorized);
    }

    let session = state.sessions.issue(user.id).await?;
    Ok(signed_in_response(session.token))
}

/// POST /auth/signout
///
/// Deletes the session row and expires the cookie. Signing out without a
/// session is a successful no-op.
pub async fn signout(state: web::Data<AppState>, req: HttpRequest) -> AppResult<HttpResponse> {
    if let Some(token) = req
        .cookie(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
    {
        state.sessions.revoke(token).await?;
    }

    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    removal.make_removal();

    Ok(HttpResponse::SeeOther()
        .cookie(removal)
        .insert_header((header::LOCATION, "/"))
        .finish())
}

fn signed_in_response(token: Uuid) -> HttpResponse {
    let cookie = Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .finish();

    HttpResponse::SeeOther()
        .cookie(cookie)
        .insert_header((header::LOCATION, "/"))
        .finish()
}
