pub mod model;
pub mod prompts;
pub mod schema;
pub mod text_parser;

pub use model::{
    DailyPlans, DailyTotals, DayPlan, GroceryLists, Meal, MealPlan, MealPlanDocument, MealPrep,
    MealSlot, Overview, PortionSizes,
};
pub use prompts::{ChatContext, ChatTurn};
pub use schema::meal_plan_json_schema;
pub use text_parser::{parse_meal_plan, ParsedDay, ParsedPlan};

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::week::{day_name, WEEK_DAYS};

    fn meal(day: &str, slot: MealSlot) -> Meal {
        Meal {
            description: format!("{day} {}", slot.key()),
            protein: 40.0,
            carbs: 30.0,
            fats: 10.0,
            calories: 400.0,
            portion_sizes: PortionSizes {
                meat: Some("6oz chicken breast".to_string()),
                carbs: None,
                vegetables: Some("2 cups salad".to_string()),
            },
        }
    }

    fn day_plan(day: &str) -> DayPlan {
        DayPlan {
            breakfast: meal(day, MealSlot::Breakfast),
            am_snack: meal(day, MealSlot::AmSnack),
            lunch: meal(day, MealSlot::Lunch),
            pm_snack: meal(day, MealSlot::PmSnack),
            dinner: meal(day, MealSlot::Dinner),
            is_prep_day: day == "sunday" || day == "wednesday",
            is_no_cook_dinner: day == "monday" || day == "wednesday",
        }
    }

    /// Every meal is 40g protein / 400 kcal, so each day totals 200g / 2000.
    pub(crate) fn sample_plan() -> MealPlan {
        let [sun, mon, tue, wed, thu, fri, sat] = WEEK_DAYS.map(|d| day_plan(day_name(d)));
        MealPlan {
            overview: Overview {
                calorie_goal: "2000 kcal".to_string(),
                protein_goal: "200g".to_string(),
                summary: "High protein, gluten-free week".to_string(),
            },
            daily_plans: DailyPlans {
                sunday: sun,
                monday: mon,
                tuesday: tue,
                wednesday: wed,
                thursday: thu,
                friday: fri,
                saturday: sat,
            },
            meal_prep: MealPrep {
                sunday: "Grill chicken, cook rice".to_string(),
                wednesday: "Brown turkey, roast vegetables".to_string(),
            },
            grocery_lists: GroceryLists {
                sunday: vec!["Chicken breast".to_string(), "Rice".to_string()],
                wednesday: vec!["Ground turkey".to_string(), "rice".to_string()],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::sample_plan;
    use super::*;
    use chrono::Weekday;

    #[test]
    fn document_round_trips_through_json() {
        let doc = MealPlanDocument {
            meal_plan: sample_plan(),
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            json["meal_plan"]["daily_plans"]["monday"]["is_no_cook_dinner"],
            true
        );
        let back: MealPlanDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn missing_day_is_rejected() {
        let mut json = serde_json::to_value(sample_plan()).unwrap();
        json["daily_plans"]
            .as_object_mut()
            .unwrap()
            .remove("thursday");
        assert!(serde_json::from_value::<MealPlan>(json).is_err());
    }

    #[test]
    fn portion_sizes_are_optional() {
        let mut json = serde_json::to_value(sample_plan()).unwrap();
        json["daily_plans"]["friday"]["lunch"]["portion_sizes"] = serde_json::json!({});
        let plan: MealPlan = serde_json::from_value(json).unwrap();
        assert_eq!(plan.day(Weekday::Fri).lunch.portion_sizes, PortionSizes::default());
    }

    #[test]
    fn totals_sum_all_five_meals() {
        let plan = sample_plan();
        let totals = plan.day(Weekday::Wed).totals();
        assert_eq!(
            totals,
            DailyTotals {
                protein: 200.0,
                carbs: 150.0,
                fats: 50.0,
                calories: 2000.0
            }
        );
    }

    #[test]
    fn meals_come_in_eating_order() {
        let plan = sample_plan();
        let order: Vec<&str> = plan
            .day(Weekday::Sat)
            .meals()
            .map(|(slot, _)| slot.key())
            .collect();
        assert_eq!(order, ["breakfast", "am_snack", "lunch", "pm_snack", "dinner"]);
    }

    #[test]
    fn grocery_list_merges_without_duplicates() {
        let plan = sample_plan();
        assert_eq!(
            plan.combined_grocery_list(),
            vec!["Chicken breast", "Rice", "Ground turkey"]
        );
    }

    #[test]
    fn validate_rejects_blank_descriptions_and_negative_macros() {
        let plan = sample_plan();
        assert!(plan.validate().is_ok());

        let mut blank = sample_plan();
        blank.daily_plans.day_mut(Weekday::Thu).lunch.description = "  ".to_string();
        let err = blank.validate().unwrap_err();
        assert!(err.to_string().contains("thursday lunch"));

        let mut negative = sample_plan();
        negative.daily_plans.day_mut(Weekday::Mon).dinner.fats = -1.0;
        assert!(negative.validate().is_err());
    }
}
