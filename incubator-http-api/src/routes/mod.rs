pub mod actions;
pub mod health;
pub mod sessions;
pub mod tools;

use axum::http::StatusCode;
use incubator_runtime::IncubatorError;

pub type ApiResult<T> = Result<T, (StatusCode, String)>;

/// Status code for an engine error.
pub fn status_for(error: &IncubatorError) -> StatusCode {
    match error {
        IncubatorError::SessionNotFound(_) | IncubatorError::ActionNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        IncubatorError::UnknownTool(_) => StatusCode::NOT_FOUND,
        IncubatorError::ActionInFlight(_) | IncubatorError::InvalidTransition { .. } => {
            StatusCode::CONFLICT
        }
        e if e.is_external() => StatusCode::BAD_GATEWAY,
        IncubatorError::ConfigError(_) | IncubatorError::SerializationError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::BAD_REQUEST,
    }
}

pub fn api_error(error: IncubatorError) -> (StatusCode, String) {
    (status_for(&error), error.to_string())
}
