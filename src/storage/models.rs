use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::error::PlannerError;
use crate::plan::{MealPlan, MealPlanDocument};
use crate::week::WeekKey;

/// What a `meal_plans.plan` column holds. Older rows hold the model's raw
/// text reply rather than JSON.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "format", content = "plan", rename_all = "snake_case")]
pub enum PlanBody {
    Structured(MealPlan),
    RawText(String),
}

impl PlanBody {
    /// Accepts a bare plan, a `{"meal_plan": ...}` document, or anything
    /// else as raw text.
    pub fn from_stored(text: &str) -> Self {
        if let Ok(plan) = serde_json::from_str::<MealPlan>(text) {
            return PlanBody::Structured(plan);
        }
        if let Ok(doc) = serde_json::from_str::<MealPlanDocument>(text) {
            return PlanBody::Structured(doc.meal_plan);
        }
        PlanBody::RawText(text.to_string())
    }

    pub fn as_structured(&self) -> Option<&MealPlan> {
        match self {
            PlanBody::Structured(plan) => Some(plan),
            PlanBody::RawText(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredPlan {
    pub week_key: WeekKey,
    pub body: PlanBody,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub(crate) struct PlanRow {
    pub week_key: String,
    pub plan: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PlanRow> for StoredPlan {
    type Error = PlannerError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        Ok(Self {
            week_key: row.week_key.parse()?,
            body: PlanBody::from_stored(&row.plan),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Modification {
    pub id: i64,
    pub week_key: WeekKey,
    pub timestamp: DateTime<Utc>,
    pub context: Option<String>,
    pub day: Option<String>,
    pub message: Option<String>,
    pub response: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewModification {
    pub week_key: WeekKey,
    pub context: Option<String>,
    pub day: Option<String>,
    pub message: Option<String>,
    pub response: String,
}

#[derive(Debug, FromRow)]
pub(crate) struct ModificationRow {
    pub id: i64,
    pub week_key: String,
    pub timestamp: DateTime<Utc>,
    pub context: Option<String>,
    pub day: Option<String>,
    pub message: Option<String>,
    pub response: String,
}

impl TryFrom<ModificationRow> for Modification {
    type Error = PlannerError;

    fn try_from(row: ModificationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            week_key: row.week_key.parse()?,
            timestamp: row.timestamp,
            context: row.context,
            day: row.day,
            message: row.message,
            response: row.response,
        })
    }
}
