//! Plan lifecycle on top of a [`LanguageModel`] and a [`PlanStore`]:
//! generation, lookup, chat and SMS follow-ups.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::api_connection::LanguageModel;
use crate::error::{PlannerError, Result};
use crate::plan::prompts::{
    chat_prompt, sms_prompt, weekly_plan_prompt, PLAN_UPDATE_MARKER, SUBSTITUTION_MARKER,
};
use crate::plan::{
    meal_plan_json_schema, parse_meal_plan, ChatContext, ChatTurn, DayPlan, MealPlan,
    MealPlanDocument, ParsedDay, ParsedPlan,
};
use crate::storage::{Modification, NewModification, PlanBody, PlanStore};
use crate::week::{day_name, WeekKey};

const CHAT_MAX_TOKENS: u32 = 1000;
const SMS_MAX_TOKENS: u32 = 500;

pub const NO_PLAN_SMS_REPLY: &str =
    "I couldn't find your current meal plan. Please make sure one is generated first.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default)]
    pub context: ChatContext,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub message: String,
    pub plan_updated: bool,
}

/// One day of a plan, from either storage format.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DayView {
    Structured(DayPlan),
    Legacy(ParsedDay),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroceryList {
    pub sunday: Vec<String>,
    pub wednesday: Vec<String>,
    pub combined: Vec<String>,
}

#[derive(Clone)]
pub struct MealPlanService {
    model: Arc<dyn LanguageModel>,
    store: PlanStore,
    backup_dir: Option<PathBuf>,
}

impl MealPlanService {
    pub fn new(model: Arc<dyn LanguageModel>, store: PlanStore) -> Self {
        Self {
            model,
            store,
            backup_dir: None,
        }
    }

    /// Also write every generated plan as pretty JSON into `dir`.
    pub fn with_backup_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.backup_dir = dir;
        self
    }

    pub fn store(&self) -> &PlanStore {
        &self.store
    }

    /// Asks the model for a fresh plan and stores it, replacing any plan
    /// already stored for `week`.
    pub async fn generate(&self, week: WeekKey) -> Result<MealPlan> {
        info!(%week, "generating meal plan");
        let schema = meal_plan_json_schema();
        let value = self
            .model
            .complete_structured(weekly_plan_prompt(), &schema)
            .await?;

        let plan = plan_from_value(value)?;
        plan.validate()?;
        self.store.save_plan(week, &plan).await?;
        info!(%week, "meal plan stored");

        if let Some(dir) = &self.backup_dir {
            if let Err(e) = write_backup(dir, week, &plan).await {
                warn!(%week, error = %e, "failed to write plan backup");
            }
        }
        Ok(plan)
    }

    /// The stored plan for `week`, generating one only if none exists.
    pub async fn fetch_or_generate(&self, week: WeekKey) -> Result<PlanBody> {
        match self.store.get_plan(week).await? {
            Some(stored) => {
                debug!(%week, "using stored plan");
                Ok(stored.body)
            }
            None => Ok(PlanBody::Structured(self.generate(week).await?)),
        }
    }

    pub async fn weekly(&self, week: WeekKey) -> Result<MealPlan> {
        match self.store.get_plan(week).await? {
            Some(stored) => match stored.body {
                PlanBody::Structured(plan) => Ok(plan),
                PlanBody::RawText(_) => Err(PlannerError::LegacyPlan(week)),
            },
            None => Err(PlannerError::PlanNotFound(week)),
        }
    }

    pub async fn day(&self, week: WeekKey, day: Weekday) -> Result<DayPlan> {
        let plan = self.weekly(week).await?;
        Ok(plan.day(day).clone())
    }

    /// The parsed day of a free-text plan. `Ok(None)` when the text has no
    /// section for that day.
    pub async fn legacy_day(&self, week: WeekKey, day: Weekday) -> Result<Option<ParsedDay>> {
        match self.store.get_plan(week).await? {
            Some(stored) => match stored.body {
                PlanBody::RawText(text) => Ok(parse_meal_plan(&text).day(day).cloned()),
                PlanBody::Structured(_) => Err(PlannerError::InvalidPlan(format!(
                    "{week} is structured; use the structured day view"
                ))),
            },
            None => Err(PlannerError::PlanNotFound(week)),
        }
    }

    /// The plan for `date`, whichever format it was stored in.
    pub async fn day_view(&self, date: NaiveDate) -> Result<DayView> {
        let week = WeekKey::for_date(date);
        let day = date.weekday();
        match self.store.get_plan(week).await? {
            Some(stored) => match stored.body {
                PlanBody::Structured(plan) => Ok(DayView::Structured(plan.day(day).clone())),
                PlanBody::RawText(text) => parse_meal_plan(&text)
                    .day(day)
                    .cloned()
                    .map(DayView::Legacy)
                    .ok_or(PlannerError::PlanNotFound(week)),
            },
            None => Err(PlannerError::PlanNotFound(week)),
        }
    }

    pub async fn chat(&self, request: ChatRequest, today: NaiveDate) -> Result<ChatReply> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(PlannerError::EmptyMessage);
        }

        let week = WeekKey::for_date(today);
        let weekday = today.weekday();
        let plan = self.weekly(week).await?;

        let prompt = chat_prompt(request.context, &plan, weekday, message, &request.history);
        let response = self.model.complete_text(&prompt, CHAT_MAX_TOKENS).await?;

        let updated = request.context.allows_updates() && response.contains(PLAN_UPDATE_MARKER);
        let cleaned = response.replace(PLAN_UPDATE_MARKER, "").trim().to_string();
        if !updated {
            return Ok(ChatReply {
                message: cleaned,
                plan_updated: false,
            });
        }

        let day = (request.context == ChatContext::Today).then(|| day_name(weekday).to_string());
        self.store
            .add_modification(NewModification {
                week_key: week,
                context: Some(request.context.as_str().to_string()),
                day,
                message: Some(message.to_string()),
                response: cleaned.clone(),
            })
            .await?;
        info!(%week, context = request.context.as_str(), "plan update recorded from chat");

        Ok(ChatReply {
            message: cleaned,
            plan_updated: true,
        })
    }

    /// Produces the reply text for an inbound SMS. Sending it is left to the
    /// caller.
    pub async fn handle_sms(&self, from: &str, body: &str, today: NaiveDate) -> Result<String> {
        let week = WeekKey::for_date(today);
        let weekday = today.weekday();
        info!(%from, %week, "handling inbound sms");

        let plan = match self.weekly(week).await {
            Ok(plan) => plan,
            Err(PlannerError::PlanNotFound(_) | PlannerError::LegacyPlan(_)) => {
                return Ok(NO_PLAN_SMS_REPLY.to_string());
            }
            Err(e) => return Err(e),
        };

        let prompt = sms_prompt(weekday, plan.day(weekday), body);
        let response = self.model.complete_text(&prompt, SMS_MAX_TOKENS).await?;

        let Some(rest) = response.trim_start().strip_prefix(SUBSTITUTION_MARKER) else {
            return Ok(response.replace(SUBSTITUTION_MARKER, "").trim().to_string());
        };

        let cleaned = rest.replace(SUBSTITUTION_MARKER, "").trim().to_string();
        self.store
            .add_modification(NewModification {
                week_key: week,
                context: Some("sms".to_string()),
                day: Some(day_name(weekday).to_string()),
                message: Some(body.to_string()),
                response: cleaned.clone(),
            })
            .await?;
        info!(%week, "substitution recorded from sms");
        Ok(cleaned)
    }

    /// Replaces the stored plan after validating it.
    pub async fn update_plan(&self, week: WeekKey, plan: &MealPlan) -> Result<()> {
        plan.validate()?;
        self.store.save_plan(week, plan).await
    }

    pub async fn delete(&self, week: WeekKey) -> Result<bool> {
        let deleted = self.store.delete_plan(week).await?;
        if deleted {
            info!(%week, "meal plan deleted");
        }
        Ok(deleted)
    }

    pub async fn modifications(&self, week: WeekKey) -> Result<Vec<Modification>> {
        self.store.list_modifications(week).await
    }

    pub async fn grocery_list(&self, week: WeekKey) -> Result<GroceryList> {
        let plan = self.weekly(week).await?;
        Ok(GroceryList {
            combined: plan.combined_grocery_list(),
            sunday: plan.grocery_lists.sunday,
            wednesday: plan.grocery_lists.wednesday,
        })
    }

    pub async fn list_weeks(&self) -> Result<Vec<WeekKey>> {
        self.store.list_weeks().await
    }

    /// Stores a free-text plan and returns what could be read from it.
    pub async fn import_text(&self, week: WeekKey, text: &str) -> Result<ParsedPlan> {
        self.store.save_raw_plan(week, text).await?;
        let parsed = parse_meal_plan(text);
        info!(%week, days = parsed.days.len(), "free-text plan imported");
        Ok(parsed)
    }
}

/// Models sometimes drop the `meal_plan` wrapper; both shapes are accepted.
pub fn plan_from_value(value: serde_json::Value) -> Result<MealPlan> {
    if value.get("meal_plan").is_some() {
        let doc: MealPlanDocument = serde_json::from_value(value)?;
        Ok(doc.meal_plan)
    } else {
        Ok(serde_json::from_value(value)?)
    }
}

async fn write_backup(dir: &std::path::Path, week: WeekKey, plan: &MealPlan) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(format!("meal_plan_{}.json", week.date_string()));
    let doc = MealPlanDocument {
        meal_plan: plan.clone(),
    };
    tokio::fs::write(&path, serde_json::to_string_pretty(&doc)?).await?;
    debug!(path = %path.display(), "plan backup written");
    Ok(())
}
