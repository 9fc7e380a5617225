use std::collections::BTreeMap;

use crate::api_connection::endpoints::{JsonSchema, JsonSchemaDefinition};
use crate::week::{day_name, WEEK_DAYS};

pub const MEAL_PLAN_TOOL_NAME: &str = "generate_meal_plan";

fn object(properties: Vec<(&str, JsonSchema)>, required: &[&str]) -> JsonSchema {
    let properties: BTreeMap<String, JsonSchema> = properties
        .into_iter()
        .map(|(name, schema)| (name.to_string(), schema))
        .collect();
    JsonSchema {
        schema_type: "object".to_string(),
        properties: Some(properties),
        required: Some(required.iter().map(|s| s.to_string()).collect()),
        ..JsonSchema::default()
    }
}

fn string_array() -> JsonSchema {
    JsonSchema {
        schema_type: "array".to_string(),
        items: Some(Box::new(JsonSchema::of_type("string"))),
        ..JsonSchema::default()
    }
}

fn meal_schema() -> JsonSchema {
    let portion_sizes = object(
        vec![
            ("meat", JsonSchema::of_type("string")),
            ("carbs", JsonSchema::of_type("string")),
            ("vegetables", JsonSchema::of_type("string")),
        ],
        &[],
    );
    object(
        vec![
            ("description", JsonSchema::of_type("string")),
            ("protein", JsonSchema::of_type("number")),
            ("carbs", JsonSchema::of_type("number")),
            ("fats", JsonSchema::of_type("number")),
            ("calories", JsonSchema::of_type("number")),
            ("portion_sizes", portion_sizes),
        ],
        &["description", "protein", "carbs", "fats", "calories", "portion_sizes"],
    )
}

fn day_schema() -> JsonSchema {
    object(
        vec![
            ("breakfast", meal_schema()),
            ("am_snack", meal_schema()),
            ("lunch", meal_schema()),
            ("pm_snack", meal_schema()),
            ("dinner", meal_schema()),
            ("is_prep_day", JsonSchema::of_type("boolean")),
            ("is_no_cook_dinner", JsonSchema::of_type("boolean")),
        ],
        &[
            "breakfast",
            "am_snack",
            "lunch",
            "pm_snack",
            "dinner",
            "is_prep_day",
            "is_no_cook_dinner",
        ],
    )
}

/// Schema for [`MealPlanDocument`](super::MealPlanDocument).
pub fn meal_plan_json_schema() -> JsonSchemaDefinition {
    let day_names: Vec<&str> = WEEK_DAYS.iter().map(|d| day_name(*d)).collect();
    let daily_plans = object(
        day_names.iter().map(|name| (*name, day_schema())).collect(),
        &day_names,
    );

    let overview = object(
        vec![
            ("calorie_goal", JsonSchema::of_type("string")),
            ("protein_goal", JsonSchema::of_type("string")),
            ("summary", JsonSchema::of_type("string")),
        ],
        &["calorie_goal", "protein_goal", "summary"],
    );
    let meal_prep = object(
        vec![
            ("sunday", JsonSchema::of_type("string")),
            ("wednesday", JsonSchema::of_type("string")),
        ],
        &["sunday", "wednesday"],
    );
    let grocery_lists = object(
        vec![("sunday", string_array()), ("wednesday", string_array())],
        &["sunday", "wednesday"],
    );

    let meal_plan = object(
        vec![
            ("overview", overview),
            ("daily_plans", daily_plans),
            ("meal_prep", meal_prep),
            ("grocery_lists", grocery_lists),
        ],
        &["overview", "daily_plans", "meal_prep", "grocery_lists"],
    );

    JsonSchemaDefinition {
        name: MEAL_PLAN_TOOL_NAME.to_string(),
        description: Some(
            "Generate a structured 7-day meal plan with daily meals, nutritional info, and portion sizes"
                .to_string(),
        ),
        strict: Some(false),
        schema: object(vec![("meal_plan", meal_plan)], &["meal_plan"]),
    }
}
