use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate, Weekday};
use std::sync::Arc;
use tokio::fs;
use tracing::{info, warn};

use meal_planner::cli::{parse_args, Command};
use meal_planner::config::AppConfig;
use meal_planner::plan::MealPlan;
use meal_planner::server::{run_server, AppState};
use meal_planner::service::{DayView, MealPlanService};
use meal_planner::sms::{
    format_day_for_sms, format_parsed_day_for_sms, LogSender, SmsSender, TwilioClient,
};
use meal_planner::storage::{PlanBody, PlanStore};
use meal_planner::week::{WeekKey, WEEK_DAYS};

fn resolve_week(week: Option<&str>, today: NaiveDate) -> Result<WeekKey> {
    match week {
        Some(raw) => {
            let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .with_context(|| format!("'{raw}' is not a YYYY-MM-DD date"))?;
            Ok(WeekKey::for_date(date))
        }
        None => Ok(WeekKey::for_date(today)),
    }
}

fn sms_sender(config: &AppConfig) -> Arc<dyn SmsSender> {
    match TwilioClient::new(
        config.twilio_account_sid.clone(),
        config.twilio_auth_token.clone(),
        config.twilio_phone_number.clone(),
    ) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            warn!("{e}; outgoing SMS will only be logged");
            Arc::new(LogSender)
        }
    }
}

fn format_day(view: &DayView, day: Weekday) -> String {
    match view {
        DayView::Structured(plan) => format_day_for_sms(day, plan),
        DayView::Legacy(parsed) => format_parsed_day_for_sms(parsed),
    }
}

fn print_plan(plan: &MealPlan) {
    println!("{}", plan.overview.summary);
    println!(
        "Calories: {} | Protein: {}\n",
        plan.overview.calorie_goal, plan.overview.protein_goal
    );
    for day in WEEK_DAYS {
        println!("{}", format_day_for_sms(day, plan.day(day)));
    }
}

async fn send_today(
    service: &MealPlanService,
    sms: &dyn SmsSender,
    target: Option<&str>,
    today: NaiveDate,
) -> Result<()> {
    let view = service
        .day_view(today)
        .await
        .context("No meal plan found for today. Run `meal-planner generate` first")?;
    let text = format_day(&view, today.weekday());
    println!("{text}");

    if let Some(to) = target {
        sms.send(to, &text)
            .await
            .with_context(|| format!("failed to text today's plan to {to}"))?;
        info!(%to, "today's plan sent");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load();

    let cli = parse_args();
    let today = Local::now().date_naive();

    let store = PlanStore::connect(&config.database_url)
        .await
        .with_context(|| format!("Failed to open database '{}'", config.database_url))?;
    let service = MealPlanService::new(Arc::new(config.provider()), store)
        .with_backup_dir(config.backup_dir.clone());
    let sms = sms_sender(&config);

    match cli.command {
        Command::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.port = port;
            }
            let state = AppState::new(service, sms);
            run_server(state, &config.bind_address()).await?;
        }
        Command::Generate { week, force } => {
            let week = resolve_week(week.as_deref(), today)?;
            let body = if force {
                PlanBody::Structured(service.generate(week).await?)
            } else {
                service.fetch_or_generate(week).await?
            };
            println!("Meal plan for {week}:\n");
            match body {
                PlanBody::Structured(plan) => print_plan(&plan),
                PlanBody::RawText(text) => println!("{text}"),
            }
        }
        Command::Today { send } => {
            let target = if send {
                Some(
                    config
                        .target_phone_number
                        .as_deref()
                        .context("--send requires TARGET_PHONE_NUMBER")?,
                )
            } else {
                None
            };
            send_today(&service, sms.as_ref(), target, today).await?;
        }
        Command::Daily => {
            if today.weekday() == Weekday::Sun {
                let week = WeekKey::for_date(today);
                if service.store().has_plan(week).await? {
                    println!("Meal plan for {week} already exists.");
                } else {
                    service.generate(week).await?;
                    println!("Generated meal plan for {week}.");
                }
            } else {
                send_today(
                    &service,
                    sms.as_ref(),
                    config.target_phone_number.as_deref(),
                    today,
                )
                .await?;
            }
        }
        Command::Weeks => {
            let weeks = service.list_weeks().await?;
            if weeks.is_empty() {
                println!("No meal plans stored.");
            }
            for week in weeks {
                println!("{week}");
            }
        }
        Command::ImportText { file, week } => {
            let week = resolve_week(week.as_deref(), today)?;
            let text = fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read plan file '{}'", file.display()))?;
            let parsed = service.import_text(week, &text).await?;
            println!(
                "Stored free-text plan as {week}; {} day(s) recognised.\n",
                parsed.days.len()
            );
            for day in &parsed.days {
                println!("{}", format_parsed_day_for_sms(day));
            }
        }
    }

    Ok(())
}
