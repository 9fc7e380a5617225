use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::{PlannerError, Result};
use crate::week::day_name;

/// The model's structured output wraps the plan in a single `meal_plan` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlanDocument {
    pub meal_plan: MealPlan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPlan {
    pub overview: Overview,
    pub daily_plans: DailyPlans,
    pub meal_prep: MealPrep,
    pub grocery_lists: GroceryLists,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub calorie_goal: String,
    pub protein_goal: String,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPlans {
    pub sunday: DayPlan,
    pub monday: DayPlan,
    pub tuesday: DayPlan,
    pub wednesday: DayPlan,
    pub thursday: DayPlan,
    pub friday: DayPlan,
    pub saturday: DayPlan,
}

impl DailyPlans {
    pub fn day(&self, day: Weekday) -> &DayPlan {
        match day {
            Weekday::Sun => &self.sunday,
            Weekday::Mon => &self.monday,
            Weekday::Tue => &self.tuesday,
            Weekday::Wed => &self.wednesday,
            Weekday::Thu => &self.thursday,
            Weekday::Fri => &self.friday,
            Weekday::Sat => &self.saturday,
        }
    }

    pub fn day_mut(&mut self, day: Weekday) -> &mut DayPlan {
        match day {
            Weekday::Sun => &mut self.sunday,
            Weekday::Mon => &mut self.monday,
            Weekday::Tue => &mut self.tuesday,
            Weekday::Wed => &mut self.wednesday,
            Weekday::Thu => &mut self.thursday,
            Weekday::Fri => &mut self.friday,
            Weekday::Sat => &mut self.saturday,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MealSlot {
    Breakfast,
    AmSnack,
    Lunch,
    PmSnack,
    Dinner,
}

impl MealSlot {
    pub const ALL: [MealSlot; 5] = [
        MealSlot::Breakfast,
        MealSlot::AmSnack,
        MealSlot::Lunch,
        MealSlot::PmSnack,
        MealSlot::Dinner,
    ];

    /// Field name in the plan document.
    pub fn key(self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::AmSnack => "am_snack",
            MealSlot::Lunch => "lunch",
            MealSlot::PmSnack => "pm_snack",
            MealSlot::Dinner => "dinner",
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::AmSnack => "AM Snack",
            MealSlot::Lunch => "Lunch",
            MealSlot::PmSnack => "PM Snack",
            MealSlot::Dinner => "Dinner",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub breakfast: Meal,
    pub am_snack: Meal,
    pub lunch: Meal,
    pub pm_snack: Meal,
    pub dinner: Meal,
    pub is_prep_day: bool,
    pub is_no_cook_dinner: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DailyTotals {
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub calories: f64,
}

impl DayPlan {
    pub fn meal(&self, slot: MealSlot) -> &Meal {
        match slot {
            MealSlot::Breakfast => &self.breakfast,
            MealSlot::AmSnack => &self.am_snack,
            MealSlot::Lunch => &self.lunch,
            MealSlot::PmSnack => &self.pm_snack,
            MealSlot::Dinner => &self.dinner,
        }
    }

    /// The five meals in eating order.
    pub fn meals(&self) -> impl Iterator<Item = (MealSlot, &Meal)> + '_ {
        MealSlot::ALL.into_iter().map(move |slot| (slot, self.meal(slot)))
    }

    pub fn totals(&self) -> DailyTotals {
        self.meals().fold(DailyTotals::default(), |acc, (_, meal)| DailyTotals {
            protein: acc.protein + meal.protein,
            carbs: acc.carbs + meal.carbs,
            fats: acc.fats + meal.fats,
            calories: acc.calories + meal.calories,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub description: String,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub calories: f64,
    pub portion_sizes: PortionSizes,
}

impl Meal {
    /// `"<description>\n  Protein: 35g, Carbs: 20g, Fats: 10g, Calories: 350"`
    pub fn summary(&self) -> String {
        format!(
            "{}\n  Protein: {}g, Carbs: {}g, Fats: {}g, Calories: {}",
            self.description, self.protein, self.carbs, self.fats, self.calories
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PortionSizes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vegetables: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealPrep {
    pub sunday: String,
    pub wednesday: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroceryLists {
    pub sunday: Vec<String>,
    pub wednesday: Vec<String>,
}

impl MealPlan {
    pub fn day(&self, day: Weekday) -> &DayPlan {
        self.daily_plans.day(day)
    }

    /// Both grocery runs merged. Duplicates are dropped case-insensitively,
    /// keeping the first spelling seen.
    pub fn combined_grocery_list(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.grocery_lists
            .sunday
            .iter()
            .chain(self.grocery_lists.wednesday.iter())
            .map(|item| item.trim())
            .filter(|item| !item.is_empty())
            .filter(|item| seen.insert(item.to_lowercase()))
            .map(str::to_string)
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        for day in crate::week::WEEK_DAYS {
            for (slot, meal) in self.day(day).meals() {
                if meal.description.trim().is_empty() {
                    return Err(PlannerError::InvalidPlan(format!(
                        "{} {} has no description",
                        day_name(day),
                        slot.key()
                    )));
                }
                let macros = [meal.protein, meal.carbs, meal.fats, meal.calories];
                if macros.iter().any(|v| !v.is_finite() || *v < 0.0) {
                    return Err(PlannerError::InvalidPlan(format!(
                        "{} {} has negative or non-numeric macros",
                        day_name(day),
                        slot.key()
                    )));
                }
            }
        }
        Ok(())
    }
}
