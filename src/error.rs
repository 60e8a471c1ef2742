use opentelemetry_semantic_conventions::{attribute::OTEL_STATUS_CODE, trace::ERROR_TYPE};
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Span, error, warn};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Admin authorization error: {0}")]
    AdminAuthorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Request already approved")]
    AlreadyApproved,

    #[error("Room not open: {0}")]
    RoomNotOpen(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Body of every failed call: `{"success": false, "detail": "..."}`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FailureResponse {
    pub success: bool,
    pub detail: String,
}

impl FailureResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            success: false,
            detail: detail.into(),
        }
    }
}

impl AppError {
    pub fn log_and_record(&self, ctx: &str) {
        let current_span = Span::current();
        let is_valid_span = !current_span.is_none();

        let message = self.to_string();
        let error_kind = match self {
            AppError::Database(err) => {
                error!(error = %message, context = %ctx, db_error = %err, "Database error");
                "database_error"
            }
            AppError::Authentication(msg) => {
                warn!(message = %msg, context = %ctx, "Authentication error");
                "authentication_error"
            }
            AppError::InvalidCredentials => {
                warn!(context = %ctx, "Invalid credentials");
                "invalid_credentials"
            }
            AppError::AdminAuthorization(msg) => {
                warn!(message = %msg, context = %ctx, "Admin authorization error");
                "admin_authorization_error"
            }
            AppError::NotFound(msg) => {
                warn!(message = %msg, context = %ctx, "Not found error");
                "not_found_error"
            }
            AppError::Conflict(msg) => {
                warn!(message = %msg, context = %ctx, "Conflict error");
                "conflict_error"
            }
            AppError::AlreadyApproved => {
                warn!(context = %ctx, "Request already approved");
                "already_approved_error"
            }
            AppError::RoomNotOpen(msg) => {
                warn!(message = %msg, context = %ctx, "Room not open");
                "room_not_open_error"
            }
            AppError::Validation(msg) => {
                warn!(message = %msg, context = %ctx, "Validation error");
                "validation_error"
            }
            AppError::Internal(msg) => {
                error!(message = %msg, context = %ctx, "Internal server error");
                "internal_error"
            }
        };

        if is_valid_span {
            current_span.record("error", tracing::field::display(true));
            current_span.record(ERROR_TYPE, tracing::field::display(error_kind));
            current_span.record("error.message", tracing::field::display(&message));

            if let AppError::Database(_) | AppError::Internal(_) = self {
                current_span.record(OTEL_STATUS_CODE, tracing::field::display("ERROR"));
            }
        }
    }

    /// Business failures answer with 200 and an envelope; only the admin gate
    /// and infrastructure failures use a non-200 status.
    pub fn status_code(&self) -> Status {
        match self {
            AppError::AdminAuthorization(_) => Status::Unauthorized,
            AppError::Database(_) | AppError::Internal(_) => Status::InternalServerError,
            _ => Status::Ok,
        }
    }

    /// Message placed in the envelope's `detail` field.
    pub fn detail(&self) -> String {
        match self {
            AppError::Database(_) | AppError::Internal(_) => "Internal server error".to_string(),
            AppError::Authentication(msg)
            | AppError::AdminAuthorization(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::RoomNotOpen(msg)
            | AppError::Validation(msg) => msg.clone(),
            AppError::InvalidCredentials | AppError::AlreadyApproved => self.to_string(),
        }
    }

    pub fn to_failure_response(&self, context: &str) -> Custom<Json<FailureResponse>> {
        self.log_and_record(context);
        Custom(self.status_code(), Json(FailureResponse::new(self.detail())))
    }

    pub fn unauthorized() -> Self {
        AppError::Authentication("Unauthorized".to_string())
    }
}

impl<'r> rocket::response::Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'static> {
        self.to_failure_response(&format!("Request to {} {}", req.method(), req.uri()))
            .respond_to(req)
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("Cryptography error: {}", error))
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(error: sqlx::migrate::MigrateError) -> Self {
        AppError::Internal(format!("Migration error: {}", error))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<_> = field_errors.keys().collect();
        fields.sort();

        let message = fields
            .first()
            .and_then(|field| field_errors.get(*field))
            .and_then(|errors| errors.first())
            .map(|error| {
                error
                    .message
                    .clone()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", error.code))
            })
            .unwrap_or_else(|| "Invalid request".to_string());

        AppError::Validation(message)
    }
}

/// Maps a unique-constraint violation to `Conflict`, everything else to `Database`.
pub fn conflict_on_unique(error: sqlx::Error, message: &str) -> AppError {
    match &error {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            AppError::Conflict(message.to_string())
        }
        _ => AppError::Database(error),
    }
}
