use thiserror::Error;

use crate::api_connection::ApiConnectionError;
use crate::week::WeekKey;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("language model call failed: {0}")]
    Model(#[from] ApiConnectionError),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("meal plan JSON is malformed: {0}")]
    MalformedPlan(#[from] serde_json::Error),

    #[error("invalid meal plan: {0}")]
    InvalidPlan(String),

    #[error("no meal plan found for {0}")]
    PlanNotFound(WeekKey),

    #[error("meal plan for {0} is stored as free text, not structured JSON")]
    LegacyPlan(WeekKey),

    #[error("invalid week key `{0}`: expected YYYY-MM-DD of a Sunday")]
    InvalidWeekKey(String),

    #[error("no message provided")]
    EmptyMessage,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = PlannerError> = std::result::Result<T, E>;
