use std::fmt;

use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse
};
use derive_more::Display;
use serde::Serialize;
use validator::ValidationErrors;

use crate::constants::{MAX_SUBMISSIONS, MAX_SUBMISSIONS_PER_EMAIL};

/// Infrastructure failures: storage backends, configuration, outbound transport.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Storage(String),
    Relay(String),
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Relay(msg) => write!(f, "Email relay error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal server error: {}", msg)
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        // Backend detail stays in the logs
        let body = match self {
            AppError::NotFound(_) => serde_json::json!({"error": self.to_string()}),
            _ => serde_json::json!({"error": "Internal server error"}),
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Relay(_) => StatusCode::BAD_GATEWAY,
            AppError::Storage(_) | AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => AppError::NotFound("Database row not found".into()),
            _ => AppError::Storage(format!("Database error: {}", err))
        }
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Storage(format!("Redis error: {}", err))
    }
}

impl From<deadpool_redis::PoolError> for AppError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        AppError::Storage(format!("Redis pool error: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(format!("IO error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Relay(err.to_string())
    }
}

/// Every way a contact submission attempt can be turned away.
#[derive(Debug, Display)]
pub enum SubmissionError {
    #[display("Spam detected")]
    SpamDetected,

    #[display("Please take your time to fill the form")]
    TimingTooFast,

    #[display(
        "Rate limit exceeded. You can submit {} messages per 24 hours. Please try again in {} hours.",
        MAX_SUBMISSIONS, hours
    )]
    RateLimited { hours: u64 },

    #[display(
        "This email has reached the maximum of {} messages per 24 hours. Please try again in {} hours.",
        MAX_SUBMISSIONS_PER_EMAIL, hours
    )]
    EmailRateLimited { hours: u64 },

    #[display("Validation failed")]
    FieldInvalid(Vec<FieldError>),

    #[display("Your message contains prohibited content")]
    ContentRejected,

    #[display("Failed to send message. Please try again later.")]
    DeliveryFailed,

    #[display("Contact form session not found")]
    SessionNotFound,

    #[display("A submission is already in progress")]
    SubmissionInProgress,

    #[display("Please wait {} seconds before sending another message", seconds)]
    CooldownActive { seconds: u64 },
}

impl std::error::Error for SubmissionError {}

impl SubmissionError {
    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            SubmissionError::SpamDetected => "spam_detected",
            SubmissionError::TimingTooFast => "timing_too_fast",
            SubmissionError::RateLimited { .. } => "rate_limited",
            SubmissionError::EmailRateLimited { .. } => "email_rate_limited",
            SubmissionError::FieldInvalid(_) => "field_invalid",
            SubmissionError::ContentRejected => "content_rejected",
            SubmissionError::DeliveryFailed => "delivery_failed",
            SubmissionError::SessionNotFound => "session_not_found",
            SubmissionError::SubmissionInProgress => "submission_in_progress",
            SubmissionError::CooldownActive { .. } => "cooldown_active",
        }
    }

    /// Per-field errors, when this is a field validation failure.
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            SubmissionError::FieldInvalid(errors) => Some(errors),
            _ => None,
        }
    }
}

impl ResponseError for SubmissionError {
    fn error_response(&self) -> HttpResponse {
        let body = match self {
            SubmissionError::FieldInvalid(errors) => {
                serde_json::json!({
                    "error": self.code(),
                    "message": self.to_string(),
                    "details": errors
                })
            }
            _ => serde_json::json!({
                "error": self.code(),
                "message": self.to_string()
            }),
        };
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            SubmissionError::SpamDetected => StatusCode::BAD_REQUEST,
            SubmissionError::TimingTooFast => StatusCode::BAD_REQUEST,
            SubmissionError::FieldInvalid(_) => StatusCode::BAD_REQUEST,
            SubmissionError::ContentRejected => StatusCode::UNPROCESSABLE_ENTITY,
            SubmissionError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            SubmissionError::EmailRateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            SubmissionError::CooldownActive { .. } => StatusCode::TOO_MANY_REQUESTS,
            SubmissionError::DeliveryFailed => StatusCode::BAD_GATEWAY,
            SubmissionError::SessionNotFound => StatusCode::NOT_FOUND,
            SubmissionError::SubmissionInProgress => StatusCode::CONFLICT,
        }
    }
}

impl From<ValidationErrors> for SubmissionError {
    fn from(errors: ValidationErrors) -> Self {
        let mut field_errors: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(|e| FieldError {
                    field: field.to_string(),
                    message: e
                        .message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "Invalid value".to_string()),
                })
            })
            .collect();
        field_errors.sort_by(|a, b| a.field.cmp(&b.field));

        SubmissionError::FieldInvalid(field_errors)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}
