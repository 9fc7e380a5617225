use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Form, Json,
};
use chrono::Datelike;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use super::error::{ApiJson, AppError};
use super::state::AppState;
use crate::error::PlannerError;
use crate::service::{plan_from_value, ChatRequest};
use crate::week::{day_name, WeekKey};

type ApiResult = Result<Json<Value>, AppError>;

/// Texted back when the model call behind an SMS fails.
pub const SMS_ERROR_REPLY: &str =
    "Sorry, something went wrong while processing your message. Please try again.";
const EMPTY_TWIML: &str = r#"<?xml version="1.0" encoding="UTF-8"?><Response></Response>"#;

fn parse_week(raw: &str) -> Result<WeekKey, AppError> {
    raw.parse::<WeekKey>().map_err(AppError::from)
}

fn current_week(state: &AppState) -> WeekKey {
    WeekKey::for_date((state.today)())
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn weekly(State(state): State<AppState>) -> ApiResult {
    let week = current_week(&state);
    let plan = state.service.weekly(week).await?;
    Ok(Json(json!({
        "status": "success",
        "week_key": week,
        "plan": plan,
    })))
}

pub async fn today(State(state): State<AppState>) -> ApiResult {
    let date = (state.today)();
    let plan = state.service.day_view(date).await?;
    Ok(Json(json!({
        "status": "success",
        "day": day_name(date.weekday()),
        "plan": plan,
    })))
}

pub async fn generate(State(state): State<AppState>) -> ApiResult {
    let week = current_week(&state);
    state.service.generate(week).await?;
    Ok(Json(json!({
        "status": "success",
        "message": "Meal plan generated successfully",
        "week_key": week,
    })))
}

pub async fn chat(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ChatRequest>,
) -> ApiResult {
    let reply = state.service.chat(request, (state.today)()).await?;
    Ok(Json(json!({
        "status": "success",
        "message": reply.message,
        "plan_updated": reply.plan_updated,
    })))
}

pub async fn list_plans(State(state): State<AppState>) -> ApiResult {
    let weeks = state.service.list_weeks().await?;
    Ok(Json(json!({ "status": "success", "weeks": weeks })))
}

pub async fn get_plan(State(state): State<AppState>, Path(week_key): Path<String>) -> ApiResult {
    let week = parse_week(&week_key)?;
    let stored = state
        .service
        .store()
        .get_plan(week)
        .await?
        .ok_or(PlannerError::PlanNotFound(week))?;
    Ok(Json(json!({ "status": "success", "plan": stored })))
}

pub async fn put_plan(
    State(state): State<AppState>,
    Path(week_key): Path<String>,
    ApiJson(body): ApiJson<Value>,
) -> ApiResult {
    let week = parse_week(&week_key)?;
    let plan = plan_from_value(body)?;
    state.service.update_plan(week, &plan).await?;
    info!(%week, "meal plan replaced");
    Ok(Json(json!({
        "status": "success",
        "message": "Meal plan updated",
        "week_key": week,
    })))
}

pub async fn delete_plan(
    State(state): State<AppState>,
    Path(week_key): Path<String>,
) -> ApiResult {
    let week = parse_week(&week_key)?;
    if !state.service.delete(week).await? {
        return Err(PlannerError::PlanNotFound(week).into());
    }
    Ok(Json(json!({ "status": "success", "week_key": week, "deleted": true })))
}

pub async fn grocery_list(
    State(state): State<AppState>,
    Path(week_key): Path<String>,
) -> ApiResult {
    let week = parse_week(&week_key)?;
    let list = state.service.grocery_list(week).await?;
    Ok(Json(json!({ "status": "success", "grocery_list": list })))
}

pub async fn modifications(
    State(state): State<AppState>,
    Path(week_key): Path<String>,
) -> ApiResult {
    let week = parse_week(&week_key)?;
    let modifications = state.service.modifications(week).await?;
    Ok(Json(json!({ "status": "success", "modifications": modifications })))
}

/// Twilio's inbound-message webhook payload.
#[derive(Debug, Deserialize)]
pub struct SmsWebhook {
    #[serde(rename = "From")]
    pub from: String,
    #[serde(rename = "Body", default)]
    pub body: String,
}

/// Always answers Twilio with an empty TwiML document; the reply goes out
/// as a separate message through the configured sender.
pub async fn sms_webhook(
    State(state): State<AppState>,
    Form(payload): Form<SmsWebhook>,
) -> impl IntoResponse {
    let reply = match state
        .service
        .handle_sms(&payload.from, &payload.body, (state.today)())
        .await
    {
        Ok(reply) => reply,
        Err(e) => {
            error!(error = %e, "failed to handle inbound sms");
            SMS_ERROR_REPLY.to_string()
        }
    };

    if let Err(e) = state.sms.send(&payload.from, &reply).await {
        error!(error = %e, to = %payload.from, "failed to send sms reply");
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/xml")],
        EMPTY_TWIML,
    )
}
