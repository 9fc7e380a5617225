use chrono::Weekday;
use serde::{Deserialize, Serialize};

use super::model::{DayPlan, MealPlan};
use crate::week::display_day;

pub const PLAN_UPDATE_MARKER: &str = "PLAN_UPDATE:";
pub const SUBSTITUTION_MARKER: &str = "SUBSTITUTION_RECORDED";

const PREP_EXCERPT_CHARS: usize = 200;
const HISTORY_TURNS: usize = 10;

const WEEKLY_PLAN_PROMPT: &str = r#"
System:
You are a nutritionist AI.

Use the following details to create a structured 7-day meal plan:
Goal & Macros:
- Daily Calories: ~1,900–2,200
- Daily Protein: ~200g
- 5 meals per day: Breakfast (~35g protein, ~350 kcal), AM Snack (~30g protein, ~250 kcal), Lunch (~45g protein, ~450 kcal), PM Snack (~30g protein, ~250 kcal), Dinner (~60g protein, ~600–700 kcal)
- Must be gluten-free (use GF alternatives: bread, pasta, sauces, etc.)
Lifestyle Details:
- Meal prep on Sunday and Wednesday
- No-cook dinners on Monday and Wednesday (use leftovers from Sunday or Wednesday's prep)
- 2 grocery runs: Sunday and Wednesday
- Include: premade salad bags for quick veggies, premade protein shakes, leftover proteins (e.g. rotisserie chicken, ground turkey) to minimize effort.

Plan Format:
- Overview of the 7-day plan and calorie/protein goals
- Day-by-Day breakdown (Sunday to Saturday), marking prep days and the "no-cook" dinners (Monday & Wednesday)
- Meal Prep instructions:
  - On Sunday: proteins, carbs, veggies to cook in bulk for Mon/Tue/(Wed)
  - On Wednesday: proteins, carbs, veggies to cook for Thu/Fri/(Sat)
- Grocery Lists: one for Sunday, one for Wednesday
- Approximate protein, carbs, fats and calories for each meal

Portion sizes:
- Give specific portion sizes for all meat (e.g. "6oz chicken breast", "4oz ground turkey")
- Give portion sizes for carbs and vegetables where applicable
- Be precise about quantities to help with meal prep and shopping

Other Notes:
- Keep it interesting, flexible, and seasonally varied. Asian and Mediterranean food are favorites.
- Fish rarely keeps as leftovers unless it comes from meal prep.
- Every meal must use ingredients bought on a prior grocery run. Don't include meals whose items are not on a grocery list.
- Vary the cuisine and use small "hacks" to make the macros work.

Example meals:
 - Stuffed Peppers w/ Ground Turkey (6oz) & Cauliflower Rice (1 cup)
 - Asian Beef Bowl w/ Lean Ground Beef (5oz), Kimchi (1/2 cup) & Brown Rice (3/4 cup)
 - Spaghetti w/ Turkey Meat (4oz) & Lentil Pasta (2oz dry)
 - Thai Red Curry Shrimp (6oz) w/ Light Coconut Milk & Rice (3/4 cup)
 - New York Strip Steak (5oz) & Bagged Salad (2 cups)
 - Ground Chicken Lettuce Wraps (6oz chicken, 6 lettuce leaves)

Return the complete plan for all seven days using the generate_meal_plan format.
"#;

pub fn weekly_plan_prompt() -> &'static str {
    WEEKLY_PLAN_PROMPT
}

/// Which part of the plan a chat message is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatContext {
    Today,
    Weekly,
    #[default]
    #[serde(other)]
    General,
}

impl ChatContext {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatContext::Today => "today",
            ChatContext::Weekly => "weekly",
            ChatContext::General => "general",
        }
    }

    /// Whether the prompt for this context offers the model the
    /// `PLAN_UPDATE:` marker.
    pub fn allows_updates(self) -> bool {
        !matches!(self, ChatContext::General)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

const ASSISTANT_PERSONA: &str =
    "You are MAGI, an AI assistant for a meal planning application in the style of NERV terminals from Evangelion.";
const ASSISTANT_STYLE: &str =
    "Keep your responses concise and in the style of a NERV terminal from Evangelion (technical, precise, somewhat formal).";

fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{cut}...")
    }
}

fn history_block(history: &[ChatTurn]) -> String {
    if history.is_empty() {
        return String::new();
    }
    let start = history.len().saturating_sub(HISTORY_TURNS);
    let lines: Vec<String> = history[start..]
        .iter()
        .map(|turn| format!("{}: {}", turn.role.to_uppercase(), turn.content))
        .collect();
    format!("RECENT CONVERSATION:\n{}\n\n", lines.join("\n"))
}

fn today_section(day: Weekday, day_plan: &DayPlan) -> String {
    let mut out = format!("Current meal plan for {}:\n", display_day(day));
    for (slot, meal) in day_plan.meals() {
        out.push_str(&format!(
            "\n{}:\n{}\nProtein: {}g, Carbs: {}g, Fats: {}g, Calories: {}\n",
            slot.to_string().to_uppercase(),
            meal.description,
            meal.protein,
            meal.carbs,
            meal.fats,
            meal.calories
        ));
    }
    out
}

/// Prompt for a chat message in the given context.
pub fn chat_prompt(
    context: ChatContext,
    plan: &MealPlan,
    day: Weekday,
    message: &str,
    history: &[ChatTurn],
) -> String {
    let overview = &plan.overview;
    let (body, capabilities) = match context {
        ChatContext::Today => (
            today_section(day, plan.day(day)),
            "You are an assistant helping with this meal plan. You can:\n\
             1. Answer questions about the meals, recipes, ingredients, or cooking instructions\n\
             2. Suggest modifications or alternatives to meals\n\
             3. Provide nutritional information and advice\n\n\
             If the user wants to modify the plan (like changing a meal or adjusting portions), \
             preface your response with \"PLAN_UPDATE:\" (on the same line as your response).",
        ),
        ChatContext::Weekly => (
            format!(
                "WEEKLY MEAL PLAN OVERVIEW:\n- Calorie Goal: {}\n- Protein Goal: {}\n\
                 - Meal Prep (Sunday): {}\n- Meal Prep (Wednesday): {}\n",
                overview.calorie_goal,
                overview.protein_goal,
                excerpt(&plan.meal_prep.sunday, PREP_EXCERPT_CHARS),
                excerpt(&plan.meal_prep.wednesday, PREP_EXCERPT_CHARS),
            ),
            "You are an assistant helping with this weekly meal plan. You can:\n\
             1. Answer questions about the overall meal structure, meal prep, or grocery planning\n\
             2. Provide advice on meal preparation, batch cooking, or food storage\n\
             3. Suggest modifications to the meal plan structure\n\n\
             If the user wants to modify the plan (like changing meal prep instructions or grocery lists), \
             preface your response with \"PLAN_UPDATE:\" (on the same line as your response).",
        ),
        ChatContext::General => (
            format!(
                "NUTRITIONAL PROGRAM PARAMETERS:\n- Calorie Goal: {}\n- Protein Goal: {}\n",
                overview.calorie_goal, overview.protein_goal
            ),
            "You are an assistant helping with nutritional planning. You can:\n\
             1. Provide general nutrition advice\n\
             2. Answer questions about dietary concepts, meal planning, or food preparation\n\
             3. Offer general suggestions for nutritional optimization",
        ),
    };

    format!(
        "{ASSISTANT_PERSONA}\n\n{body}\n{history}USER QUERY: {message}\n\n{capabilities}\n\n{ASSISTANT_STYLE}\n",
        history = history_block(history),
    )
}

/// Prompt for an inbound text message. Replies go back over SMS, so the
/// model is asked to stay short.
pub fn sms_prompt(day: Weekday, day_plan: &DayPlan, message: &str) -> String {
    let mut prompt = format!("Current meal plan for {}:\n\n", display_day(day));
    for (slot, meal) in day_plan.meals() {
        prompt.push_str(&format!("{slot}: {}\n\n", meal.summary()));
    }
    let totals = day_plan.totals();
    prompt.push_str(&format!(
        "Daily Totals: Total Protein: {}g, Total Carbs: {}g, Total Fats: {}g, Total Calories: {}\n\n",
        totals.protein, totals.carbs, totals.fats, totals.calories
    ));
    prompt.push_str(&format!("User message: {message}\n\n"));
    prompt.push_str(
        "Please help with this meal plan request. You can:\n\
         1. Suggest alternative meals\n\
         2. Provide recipes and cooking instructions\n\
         3. Handle meal substitutions and recommend adjustments\n\
         4. Answer questions about the meal plan\n\n\
         Keep responses concise and actionable since they'll be sent via SMS.\n\
         Keep suggestions close to the calories and macros in the meal plan unless the user asks otherwise.\n\
         If the user's request is not related to the meal plan, politely explain what you can help with.\n\
         If this is a meal substitution, include \"SUBSTITUTION_RECORDED\" at the start of your response.\n",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::fixtures::sample_plan;

    #[test]
    fn today_prompt_lists_all_five_meals() {
        let plan = sample_plan();
        let prompt = chat_prompt(ChatContext::Today, &plan, Weekday::Tue, "swap lunch", &[]);
        assert!(prompt.contains("Current meal plan for Tuesday"));
        for label in ["BREAKFAST:", "AM SNACK:", "LUNCH:", "PM SNACK:", "DINNER:"] {
            assert!(prompt.contains(label), "missing {label}");
        }
        assert!(prompt.contains("tuesday dinner"));
        assert!(prompt.contains("USER QUERY: swap lunch"));
        assert!(prompt.contains(PLAN_UPDATE_MARKER));
    }

    #[test]
    fn weekly_prompt_truncates_prep_notes() {
        let mut plan = sample_plan();
        plan.meal_prep.sunday = "x".repeat(500);
        let prompt = chat_prompt(ChatContext::Weekly, &plan, Weekday::Mon, "hi", &[]);
        let expected = format!("Meal Prep (Sunday): {}...", "x".repeat(200));
        assert!(prompt.contains(&expected));
        assert!(!prompt.contains(&"x".repeat(201)));
    }

    #[test]
    fn general_prompt_has_no_update_marker() {
        let plan = sample_plan();
        let prompt = chat_prompt(ChatContext::General, &plan, Weekday::Mon, "hi", &[]);
        assert!(prompt.contains("Calorie Goal: 2000 kcal"));
        assert!(!prompt.contains(PLAN_UPDATE_MARKER));
        assert!(!ChatContext::General.allows_updates());
    }

    #[test]
    fn history_keeps_only_recent_turns() {
        let plan = sample_plan();
        let history: Vec<ChatTurn> = (0..15)
            .map(|i| ChatTurn {
                role: "user".to_string(),
                content: format!("turn {i}"),
            })
            .collect();
        let prompt = chat_prompt(ChatContext::General, &plan, Weekday::Mon, "hi", &history);
        assert!(prompt.contains("RECENT CONVERSATION"));
        assert!(prompt.contains("USER: turn 14"));
        assert!(prompt.contains("USER: turn 5"));
        assert!(!prompt.contains("turn 4\n"));
    }

    #[test]
    fn sms_prompt_includes_totals() {
        let plan = sample_plan();
        let prompt = sms_prompt(Weekday::Sun, plan.day(Weekday::Sun), "no fish please");
        assert!(prompt.starts_with("Current meal plan for Sunday"));
        assert!(prompt.contains("Total Protein: 200g"));
        assert!(prompt.contains("Total Calories: 2000"));
        assert!(prompt.contains(SUBSTITUTION_MARKER));
    }

    #[test]
    fn context_parses_lowercase() {
        let ctx: ChatContext = serde_json::from_str("\"weekly\"").unwrap();
        assert_eq!(ctx, ChatContext::Weekly);
    }

    #[test]
    fn unknown_context_falls_back_to_general() {
        let ctx: ChatContext = serde_json::from_str("\"dashboard\"").unwrap();
        assert_eq!(ctx, ChatContext::General);
    }
}
