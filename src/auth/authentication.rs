use rocket::Request;
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use sqlx::SqlitePool;

use crate::db::resolve_token;
use crate::error::AppError;

use super::{AdminPolicy, CurrentTeacher};

/// Accepts `Authorization: Bearer <token>` first, then `x-token: <token>`.
pub fn extract_token(request: &Request<'_>) -> Option<String> {
    let bearer = request
        .headers()
        .get_one("Authorization")
        .and_then(|value| {
            let parts: Vec<&str> = value.split_whitespace().collect();
            match parts.as_slice() {
                [scheme, token] if scheme.eq_ignore_ascii_case("bearer") => {
                    Some(token.to_string())
                }
                _ => None,
            }
        });

    bearer
        .or_else(|| request.headers().get_one("x-token").map(str::to_string))
        .filter(|token| !token.is_empty())
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentTeacher {
    type Error = AppError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let auth_span = tracing::info_span!("teacher_auth_guard");
        let _guard = auth_span.enter();

        let Some(token) = extract_token(request) else {
            return Outcome::Success(CurrentTeacher(None));
        };

        let db = match request.rocket().state::<SqlitePool>() {
            Some(pool) => pool,
            _ => {
                tracing::error!("Database pool not found in managed state");
                return Outcome::Error((
                    Status::InternalServerError,
                    AppError::Internal("Database pool not configured".to_string()),
                ));
            }
        };

        match resolve_token(db, &token).await {
            Ok(Some(teacher)) => {
                tracing::info!(teacher_id = %teacher.id, "Teacher authenticated via bearer token");
                Outcome::Success(CurrentTeacher(Some(teacher)))
            }
            Ok(None) => {
                tracing::warn!("Unknown bearer token, treating caller as anonymous");
                Outcome::Success(CurrentTeacher(None))
            }
            Err(err) => {
                tracing::error!(error = ?err, "Failed to resolve bearer token");
                Outcome::Error((Status::InternalServerError, err))
            }
        }
    }
}

/// Passes only when the `x-admin-secret` header satisfies the installed [`AdminPolicy`].
pub struct AdminGate;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminGate {
    type Error = AppError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let policy = match request.rocket().state::<Box<dyn AdminPolicy>>() {
            Some(policy) => policy,
            _ => {
                tracing::error!("Admin policy not found in managed state");
                return Outcome::Error((
                    Status::InternalServerError,
                    AppError::Internal("Admin policy not configured".to_string()),
                ));
            }
        };

        if policy.authorize(request.headers().get_one("x-admin-secret")) {
            Outcome::Success(AdminGate)
        } else {
            tracing::warn!(uri = %request.uri(), "Rejected admin request");
            Outcome::Error((
                Status::Unauthorized,
                AppError::AdminAuthorization("Invalid admin secret".to_string()),
            ))
        }
    }
}
