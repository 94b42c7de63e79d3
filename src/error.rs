use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::validation::ValidationError;

/// Refusal to build a degenerate model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("at least one room is required")]
    EmptyRooms,

    #[error("at least one group is required")]
    EmptyGroups,

    #[error("at least one slot is required")]
    EmptySlots,
}

/// Failures of the solving machinery itself. A solver that answers
/// "infeasible" has not failed; see `SolveStatus`.
#[derive(Debug, thiserror::Error)]
pub enum SolverError {
    #[error("solver failed: {0}")]
    Backend(String),

    #[error("solver worker aborted: {0}")]
    Worker(String),
}

/// Every way a request can fail.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {}", join_messages(.0))]
    Input(Vec<ValidationError>),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Internal(#[from] SolverError),
}

pub type Result<T> = std::result::Result<T, Error>;

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Input(_) => StatusCode::BAD_REQUEST,
            Error::Model(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Error::Input(errors) => json!({
                "error": self.to_string(),
                "details": errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>(),
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
