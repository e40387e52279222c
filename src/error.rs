use axum::{http::StatusCode, response::IntoResponse, Json};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("upstream feed error: {0}")]
    Upstream(String),

    #[error("match {0} not found in the current feed")]
    MatchNotFound(i64),

    #[error("invalid coupon: {0}")]
    InvalidCoupon(String),

    #[error("Telegram error: {0}")]
    Telegram(String),

    #[error("chat rate limit exceeded")]
    RateLimited,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Short operator-facing summary, separate from the raw error detail.
    fn message(&self) -> &'static str {
        match self {
            AppError::Http(_) | AppError::Upstream(_) => "could not reach the live feed",
            AppError::Json(_) => "the live feed returned an unreadable payload",
            AppError::MatchNotFound(_) => "match not found in the current feed",
            AppError::InvalidCoupon(_) => "the coupon payload is invalid or empty",
            AppError::Telegram(_) => "Telegram delivery failed",
            AppError::RateLimited => "too many chat requests, slow down",
            AppError::Config(_) => "server configuration error",
            AppError::Io(_) => "internal IO error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::MatchNotFound(_) => StatusCode::NOT_FOUND,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::InvalidCoupon(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(serde_json::json!({
            "success": false,
            "message": self.message(),
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}
