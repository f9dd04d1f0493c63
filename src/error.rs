use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::models::ErrorBody;

#[derive(Debug, thiserror::Error)]
pub enum AssistError {
  #[error("{0}")]
  Validation(String),
  #[error("file error: {0}")]
  Io(#[from] std::io::Error),
  #[error("upstream request failed: {0}")]
  Upstream(String),
  #[error("invalid configuration: {0}")]
  Config(String),
}

pub type AssistResult<T> = std::result::Result<T, AssistError>;

impl AssistError {
  pub fn status(&self) -> StatusCode {
    match self {
      AssistError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      AssistError::Io(_) | AssistError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
      AssistError::Upstream(_) => StatusCode::BAD_GATEWAY,
    }
  }

  pub fn to_body(&self) -> ErrorBody {
    ErrorBody {
      error: self.to_string(),
      code: self.code().to_string(),
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      AssistError::Validation(_) => "validation_failed",
      AssistError::Io(_) => "io_failed",
      AssistError::Upstream(_) => "upstream_failed",
      AssistError::Config(_) => "config_invalid",
    }
  }
}

impl IntoResponse for AssistError {
  fn into_response(self) -> Response {
    match &self {
      AssistError::Validation(msg) => tracing::warn!(code = self.code(), "{msg}"),
      other => tracing::error!(code = other.code(), "{other}"),
    }
    error_response(self.status(), self.code(), &self.to_string())
  }
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
  let body = Json(serde_json::json!({ "error": message, "code": code }));
  (status, body).into_response()
}
