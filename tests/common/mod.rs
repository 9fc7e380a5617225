#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use meal_planner::api_connection::endpoints::JsonSchemaDefinition;
use meal_planner::api_connection::{ApiConnectionError, LanguageModel};
use meal_planner::plan::MealPlan;
use meal_planner::server::{build_router, AppState};
use meal_planner::service::MealPlanService;
use meal_planner::sms::{SmsError, SmsSender};
use meal_planner::storage::PlanStore;
use meal_planner::week::WeekKey;

/// 2025-03-11, a Tuesday in the week of 2025-03-09.
pub fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 11).unwrap()
}

pub fn current_week() -> WeekKey {
    WeekKey::for_date(fixed_today())
}

/// Replays canned replies in order; an empty queue behaves like a failed call.
#[derive(Default)]
pub struct ScriptedModel {
    texts: Mutex<VecDeque<String>>,
    structured: Mutex<VecDeque<Value>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn reply(self, text: &str) -> Self {
        self.texts.lock().unwrap().push_back(text.to_string());
        self
    }

    pub fn structured(self, value: Value) -> Self {
        self.structured.lock().unwrap().push_back(value);
        self
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete_text(
        &self,
        prompt: &str,
        _max_tokens: u32,
    ) -> Result<String, ApiConnectionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.texts
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(ApiConnectionError::EmptyResponse)
    }

    async fn complete_structured(
        &self,
        prompt: &str,
        _schema: &JsonSchemaDefinition,
    ) -> Result<Value, ApiConnectionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.structured
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(ApiConnectionError::EmptyResponse)
    }
}

/// Records outgoing texts instead of sending them.
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl SmsSender for RecordingSender {
    async fn send(&self, to: &str, body: &str) -> Result<(), SmsError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), body.to_string()));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub service: MealPlanService,
    pub model: Arc<ScriptedModel>,
    pub sms: Arc<RecordingSender>,
}

impl TestApp {
    pub async fn new(model: ScriptedModel) -> Self {
        let model = Arc::new(model);
        let sms = Arc::new(RecordingSender::default());
        let store = PlanStore::in_memory().await.unwrap();
        let service = MealPlanService::new(model.clone(), store);
        let state = AppState::new(service.clone(), sms.clone()).with_today(fixed_today);
        Self {
            router: build_router(state),
            service,
            model,
            sms,
        }
    }

    pub async fn with_plan(model: ScriptedModel) -> Self {
        let app = Self::new(model).await;
        app.service
            .store()
            .save_plan(current_week(), &sample_plan())
            .await
            .unwrap();
        app
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.request(Method::GET, uri, None).await
    }

    pub async fn form(&self, uri: &str, form: &str) -> Response {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.router.clone().oneshot(request).await.unwrap()
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn meal(description: String) -> Value {
    json!({
        "description": description,
        "protein": 40.0,
        "carbs": 30.0,
        "fats": 10.0,
        "calories": 400.0,
        "portion_sizes": { "meat": "6oz chicken breast" }
    })
}

fn day(name: &str) -> Value {
    json!({
        "breakfast": meal(format!("{name} breakfast")),
        "am_snack": meal(format!("{name} am_snack")),
        "lunch": meal(format!("{name} lunch")),
        "pm_snack": meal(format!("{name} pm_snack")),
        "dinner": meal(format!("{name} dinner")),
        "is_prep_day": name == "sunday" || name == "wednesday",
        "is_no_cook_dinner": name == "monday" || name == "wednesday",
    })
}

/// A valid plan as the model would return it (with the `meal_plan` wrapper).
pub fn sample_plan_json() -> Value {
    json!({
        "meal_plan": {
            "overview": {
                "calorie_goal": "2000 kcal",
                "protein_goal": "200g",
                "summary": "High protein, gluten-free week"
            },
            "daily_plans": {
                "sunday": day("sunday"),
                "monday": day("monday"),
                "tuesday": day("tuesday"),
                "wednesday": day("wednesday"),
                "thursday": day("thursday"),
                "friday": day("friday"),
                "saturday": day("saturday"),
            },
            "meal_prep": {
                "sunday": "Grill chicken, cook rice",
                "wednesday": "Brown turkey, roast vegetables"
            },
            "grocery_lists": {
                "sunday": ["Chicken breast", "Rice"],
                "wednesday": ["Ground turkey", "rice"]
            }
        }
    })
}

pub fn sample_plan() -> MealPlan {
    serde_json::from_value(sample_plan_json()["meal_plan"].clone()).unwrap()
}
