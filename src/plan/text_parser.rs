//! Best-effort reader for plans stored as free text (plans generated before
//! structured output was requested). Never fails; unrecognised lines are
//! skipped.

use chrono::Weekday;
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

use super::model::MealSlot;
use crate::week::parse_day;

const SECTION_MARKER: &str = "MEAL PLAN:";
const PREP_MARKER: &str = "Prep:";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedDay {
    #[serde(serialize_with = "serialize_weekday")]
    pub day: Weekday,
    pub meals: Vec<(String, String)>,
    pub prep_instructions: Vec<String>,
}

fn serialize_weekday<S: serde::Serializer>(day: &Weekday, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(crate::week::day_name(*day))
}

impl ParsedDay {
    fn new(day: Weekday) -> Self {
        Self {
            day,
            meals: Vec::new(),
            prep_instructions: Vec::new(),
        }
    }

    pub fn meal(&self, slot: MealSlot) -> Option<&str> {
        let label = slot.to_string();
        self.meals
            .iter()
            .find(|(name, _)| *name == label)
            .map(|(_, text)| text.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ParsedPlan {
    pub days: Vec<ParsedDay>,
}

impl ParsedPlan {
    pub fn day(&self, day: Weekday) -> Option<&ParsedDay> {
        self.days.iter().find(|d| d.day == day)
    }

    fn insert(&mut self, parsed: ParsedDay) {
        match self.days.iter_mut().find(|d| d.day == parsed.day) {
            Some(existing) => *existing = parsed,
            None => self.days.push(parsed),
        }
    }
}

fn day_header() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(sunday|monday|tuesday|wednesday|thursday|friday|saturday)(?:\s*\(.*?\))?:?$")
            .ok()
    })
    .as_ref()
}

fn day_prefix() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(sunday|monday|tuesday|wednesday|thursday|friday|saturday)").ok()
    })
    .as_ref()
}

fn meal_line() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(breakfast|am snack|lunch|pm snack|dinner):\s*(.*)$").ok())
        .as_ref()
}

fn slot_for(label: &str) -> Option<MealSlot> {
    MealSlot::ALL
        .into_iter()
        .find(|slot| slot.to_string().eq_ignore_ascii_case(label))
}

fn clean(line: &str) -> &str {
    line.trim().trim_matches(|c| c == '*' || c == '#').trim()
}

/// Splits a free-text plan into days.
pub fn parse_meal_plan(raw_text: &str) -> ParsedPlan {
    let lines: Vec<&str> = raw_text.lines().map(clean).collect();
    let mut plan = ParsedPlan::default();
    let mut current: Option<ParsedDay> = None;
    let mut in_section = false;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        i += 1;

        if line.starts_with(SECTION_MARKER) {
            in_section = true;
            continue;
        }
        if !in_section {
            continue;
        }

        if let Some(caps) = day_header().and_then(|re| re.captures(line)) {
            if let Some(finished) = current.take() {
                plan.insert(finished);
            }
            current = parse_day(&caps[1]).map(ParsedDay::new);
            continue;
        }

        let Some(day) = current.as_mut() else {
            continue;
        };

        if let Some(caps) = meal_line().and_then(|re| re.captures(line)) {
            if let Some(slot) = slot_for(&caps[1]) {
                day.meals.push((slot.to_string(), caps[2].trim().to_string()));
            }
            continue;
        }

        if line.starts_with(PREP_MARKER) {
            while i < lines.len() {
                let prep_line = lines[i];
                if prep_line.is_empty() || day_prefix().is_some_and(|re| re.is_match(prep_line)) {
                    break;
                }
                day.prep_instructions.push(prep_line.to_string());
                i += 1;
            }
        }
    }

    if let Some(finished) = current {
        plan.insert(finished);
    }
    plan
}
