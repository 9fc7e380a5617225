//! Outbound text messages: day summaries, chunking and delivery through
//! Twilio.

use async_trait::async_trait;
use chrono::Weekday;
use thiserror::Error;
use tracing::{debug, info};

use crate::plan::{DayPlan, ParsedDay};
use crate::week::display_day;

/// Longest chunk sent in one message, leaving room for the `(i/n) ` prefix
/// under Twilio's 1600-character cap.
pub const SMS_CHUNK_CHARS: usize = 1500;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01/Accounts";

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("Twilio credentials not configured: {0} is missing")]
    NotConfigured(&'static str),

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Twilio returned error {status}: {error_body}")]
    ApiError {
        status: reqwest::StatusCode,
        error_body: String,
    },
}

pub fn format_day_for_sms(day: Weekday, plan: &DayPlan) -> String {
    let mut message = format!("Meal Plan for {}:\n\n", display_day(day));
    for (slot, meal) in plan.meals() {
        message.push_str(&format!(
            "{slot}: {} ({}g protein, {} kcal)\n",
            meal.description, meal.protein, meal.calories
        ));
    }
    let totals = plan.totals();
    message.push_str(&format!(
        "\nTotals: {}g protein, {}g carbs, {}g fats, {} kcal\n",
        totals.protein, totals.carbs, totals.fats, totals.calories
    ));
    if plan.is_prep_day {
        message.push_str("Prep day today.\n");
    }
    message
}

pub fn format_parsed_day_for_sms(day: &ParsedDay) -> String {
    let mut message = format!("Meal Plan for {}:\n\n", display_day(day.day));
    for (meal, description) in &day.meals {
        message.push_str(&format!("{meal}: {description}\n"));
    }
    if !day.prep_instructions.is_empty() {
        message.push_str("\nPrep Steps:\n");
        for step in &day.prep_instructions {
            message.push_str(&format!("- {step}\n"));
        }
    }
    message
}

/// Splits `text` into pieces of at most `max_chars` characters, each
/// prefixed with `(i/n) `.
pub fn chunk_message(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || max_chars == 0 {
        return Vec::new();
    }
    let pieces: Vec<String> = chars
        .chunks(max_chars)
        .map(|piece| piece.iter().collect())
        .collect();
    let total = pieces.len();
    pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| format!("({}/{total}) {piece}", i + 1))
        .collect()
}

#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<(), SmsError>;
}

pub struct TwilioClient {
    client: reqwest::Client,
    account_sid: String,
    auth_token: String,
    from_number: String,
}

impl TwilioClient {
    pub fn new(
        account_sid: Option<String>,
        auth_token: Option<String>,
        from_number: Option<String>,
    ) -> Result<Self, SmsError> {
        Ok(Self {
            client: reqwest::Client::new(),
            account_sid: account_sid.ok_or(SmsError::NotConfigured("TWILIO_ACCOUNT_SID"))?,
            auth_token: auth_token.ok_or(SmsError::NotConfigured("TWILIO_AUTH_TOKEN"))?,
            from_number: from_number.ok_or(SmsError::NotConfigured("TWILIO_PHONE_NUMBER"))?,
        })
    }

    async fn send_one(&self, to: &str, body: &str) -> Result<(), SmsError> {
        let url = format!("{TWILIO_API_BASE}/{}/Messages.json", self.account_sid);
        let response = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", self.from_number.as_str()), ("Body", body)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error body: {e}"));
            return Err(SmsError::ApiError { status, error_body });
        }
        Ok(())
    }
}

#[async_trait]
impl SmsSender for TwilioClient {
    async fn send(&self, to: &str, body: &str) -> Result<(), SmsError> {
        let chunks = chunk_message(body, SMS_CHUNK_CHARS);
        for chunk in &chunks {
            self.send_one(to, chunk).await?;
        }
        info!(%to, chunks = chunks.len(), "sms sent");
        Ok(())
    }
}

/// Stands in for Twilio when no credentials are configured.
pub struct LogSender;

#[async_trait]
impl SmsSender for LogSender {
    async fn send(&self, to: &str, body: &str) -> Result<(), SmsError> {
        info!(%to, chars = body.chars().count(), "sms delivery not configured; message not sent");
        debug!(%body);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::fixtures::sample_plan;
    use crate::plan::parse_meal_plan;

    #[test]
    fn short_message_is_one_chunk() {
        assert_eq!(chunk_message("hello", SMS_CHUNK_CHARS), vec!["(1/1) hello"]);
        assert!(chunk_message("", SMS_CHUNK_CHARS).is_empty());
    }

    #[test]
    fn long_message_is_split_and_numbered() {
        let text = "a".repeat(3200);
        let chunks = chunk_message(&text, 1500);
        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].starts_with("(1/3) "));
        assert!(chunks[2].starts_with("(3/3) "));
        assert_eq!(chunks[2].len(), "(3/3) ".len() + 200);
    }

    #[test]
    fn chunks_respect_multibyte_characters() {
        let chunks = chunk_message("ééé", 2);
        assert_eq!(chunks, vec!["(1/2) éé", "(2/2) é"]);
    }

    #[test]
    fn structured_day_summary() {
        let plan = sample_plan();
        let text = format_day_for_sms(Weekday::Wed, plan.day(Weekday::Wed));
        assert!(text.starts_with("Meal Plan for Wednesday:"));
        assert!(text.contains("AM Snack: wednesday am_snack (40g protein, 400 kcal)"));
        assert!(text.contains("Totals: 200g protein, 150g carbs, 50g fats, 2000 kcal"));
        assert!(text.contains("Prep day today."));
    }

    #[test]
    fn parsed_day_summary_lists_prep_steps() {
        let parsed = parse_meal_plan("MEAL PLAN:\nSunday:\nLunch: Tacos\nPrep:\nCook beef\n");
        let text = format_parsed_day_for_sms(parsed.day(Weekday::Sun).unwrap());
        assert_eq!(
            text,
            "Meal Plan for Sunday:\n\nLunch: Tacos\n\nPrep Steps:\n- Cook beef\n"
        );
    }

    #[test]
    fn twilio_requires_credentials() {
        let result = TwilioClient::new(Some("AC123".into()), None, Some("+15550000".into()));
        assert!(matches!(
            result,
            Err(SmsError::NotConfigured("TWILIO_AUTH_TOKEN"))
        ));
    }

    #[tokio::test]
    async fn log_sender_accepts_everything() {
        assert!(LogSender.send("+15550100", "hi").await.is_ok());
    }
}
