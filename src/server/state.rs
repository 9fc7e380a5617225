use chrono::{Local, NaiveDate};
use std::sync::Arc;

use crate::service::MealPlanService;
use crate::sms::SmsSender;

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Clone)]
pub struct AppState {
    pub service: MealPlanService,
    pub sms: Arc<dyn SmsSender>,
    /// Source of "today"; tests pin it to a fixed date.
    pub today: fn() -> NaiveDate,
}

impl AppState {
    pub fn new(service: MealPlanService, sms: Arc<dyn SmsSender>) -> Self {
        Self {
            service,
            sms,
            today: local_today,
        }
    }

    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }
}
