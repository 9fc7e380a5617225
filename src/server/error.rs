use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::error::PlannerError;

/// Anything a handler can fail with, on its way out as an HTTP response.
pub enum AppError {
    Planner(PlannerError),
    /// The request body was not JSON of the expected shape.
    Body(JsonRejection),
}

impl From<PlannerError> for AppError {
    fn from(err: PlannerError) -> Self {
        Self::Planner(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        let err = match self {
            AppError::Planner(err) => err,
            AppError::Body(_) => return StatusCode::BAD_REQUEST,
        };
        match err {
            PlannerError::EmptyMessage
            | PlannerError::InvalidWeekKey(_)
            | PlannerError::InvalidPlan(_)
            | PlannerError::MalformedPlan(_) => StatusCode::BAD_REQUEST,
            PlannerError::PlanNotFound(_) => StatusCode::NOT_FOUND,
            PlannerError::LegacyPlan(_) => StatusCode::CONFLICT,
            PlannerError::Model(_) => StatusCode::BAD_GATEWAY,
            PlannerError::Database(_) | PlannerError::Migration(_) | PlannerError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Planner(err) => err.to_string(),
            AppError::Body(rejection) => rejection.body_text(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            error!(error = %message, "request failed");
        } else {
            warn!(error = %message, "request rejected");
        }
        let body = json!({ "status": "error", "message": message });
        (status, Json(body)).into_response()
    }
}

/// `Json<T>` whose rejection is reported through [`AppError`], so a bad body
/// still gets the error envelope.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}
