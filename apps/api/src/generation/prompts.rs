// All LLM prompt constants for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.
//
// Builders here are pure: the same parameters always render the same strings.

use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NUMERIC_NULL_RULE};
use crate::places::PlaceListing;

/// A rendered system/user instruction pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Field name → type hint, embedded in the recipe system prompt.
const RECIPE_SCHEMA: &str = r#"{
  "title": "string",
  "description": "string",
  "category": "string (e.g. Breakfast, Lunch, Dinner, Dessert)",
  "prep_time": "integer minutes or null",
  "cook_time": "integer minutes or null",
  "servings": "integer or null",
  "difficulty": "integer 1-10 or null",
  "tags": ["string"],
  "ingredients": [{"name": "string", "quantity": "string"}],
  "directions": ["string"]
}"#;

const RECIPE_RULES: &str = "\
- Number the directions (\"1. ...\") and keep each one short, in cooking order, one action per step.\n\
- Prefer achievable home-kitchen techniques and common equipment.\n\
- Only add pantry staples (salt, pepper, oil, water) beyond the listed ingredients.";

/// Field name → type hint, embedded in the restaurant system prompt.
const RESTAURANT_SCHEMA: &str = r#"{
  "name": "string",
  "description": "string (2-3 sentences)",
  "food_type": "string",
  "category": "string",
  "price": "integer 1-4 or null",
  "rating": "number 1-5 or null",
  "address": "string or null",
  "city": "string",
  "opening_hours": "string or null",
  "delivery_option": "boolean",
  "vegan_friendly": "boolean",
  "kid_friendly": "boolean",
  "parking": "string or null"
}"#;

const RESTAURANT_RULES: &str = "\
- Describe the atmosphere and signature dishes in plain language.\n\
- When a real listing is provided, keep its name, address and rating exactly.\n\
- Never invent phone numbers, websites or email addresses.";

/// Parameters for a recipe prompt.
#[derive(Debug, Clone, Default)]
pub struct RecipePromptParams<'a> {
    pub ingredients: &'a [String],
    pub diet: Option<&'a str>,
    pub servings: Option<i32>,
    pub category: Option<&'a str>,
    /// Advisory category list; empty renders no clause.
    pub allowed_categories: &'a [String],
}

pub fn build_recipe_prompt(params: &RecipePromptParams<'_>) -> Prompt {
    let mut system = format!(
        "You are a helpful chef who writes practical recipes.\n\
         Return a JSON object with exactly this schema:\n{RECIPE_SCHEMA}\n\n\
         Rules:\n{RECIPE_RULES}\n- {NUMERIC_NULL_RULE}\n"
    );
    if !params.allowed_categories.is_empty() {
        system.push_str(&format!(
            "- category should be one of: {}.\n",
            params.allowed_categories.join(", ")
        ));
    }
    system.push('\n');
    system.push_str(JSON_ONLY_SYSTEM);

    let mut user = format!(
        "Create one recipe using these ingredients: {}.",
        params
            .ingredients
            .iter()
            .map(|i| i.trim())
            .filter(|i| !i.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    );
    if let Some(diet) = non_blank(params.diet) {
        user.push_str(&format!(" The recipe must be suitable for a {diet} diet."));
    }
    if let Some(servings) = params.servings.filter(|s| *s > 0) {
        user.push_str(&format!(" It should serve {servings}."));
    }
    if let Some(category) = non_blank(params.category) {
        user.push_str(&format!(" It should fit the {category} category."));
    }

    Prompt { system, user }
}

/// Parameters for a restaurant prompt.
#[derive(Debug, Clone, Default)]
pub struct RestaurantPromptParams<'a> {
    pub city: &'a str,
    pub category: Option<&'a str>,
    pub price: Option<i32>,
    /// A real listing the model should describe rather than invent.
    pub listing: Option<&'a PlaceListing>,
}

pub fn build_restaurant_prompt(params: &RestaurantPromptParams<'_>) -> Prompt {
    let system = format!(
        "You are a local food critic who writes short, accurate restaurant profiles.\n\
         Return a JSON object with exactly this schema:\n{RESTAURANT_SCHEMA}\n\n\
         Rules:\n{RESTAURANT_RULES}\n- {NUMERIC_NULL_RULE}\n\n{JSON_ONLY_SYSTEM}"
    );

    let mut user = format!("Find a restaurant in {}.", params.city.trim());
    if let Some(category) = non_blank(params.category) {
        user.push_str(&format!(" It should serve {category} food."));
    }
    if let Some(price) = params.price.filter(|p| (1..=4).contains(p)) {
        user.push_str(&format!(
            " Its price level should be at most {} ({price} of 4).",
            "$".repeat(price as usize)
        ));
    }
    if let Some(listing) = params.listing {
        user.push_str(&format!(" Write the profile for this real listing: {}", listing.name));
        if let Some(address) = listing.address.as_deref() {
            user.push_str(&format!(", {address}"));
        }
        if let Some(rating) = listing.rating {
            user.push_str(&format!(", rated {rating}"));
        }
        user.push('.');
    }

    Prompt { system, user }
}

/// Prompt for the illustrative image of a saved recipe.
pub fn recipe_image_prompt(title: &str, ingredients: &str) -> String {
    format!(
        "A realistic, appetizing overhead food photograph of {title}, made with {ingredients}. \
         Natural light, plated on a simple table, no text."
    )
}

/// Prompt for the illustrative image of a saved restaurant.
pub fn restaurant_image_prompt(name: &str, food_type: Option<&str>) -> String {
    match non_blank(food_type) {
        Some(food) => format!(
            "A warm, inviting photograph of the dining room of {name}, a {food} restaurant. No text."
        ),
        None => format!("A warm, inviting photograph of the dining room of {name}. No text."),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ingredients(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_recipe_prompt_lists_ingredients_only_when_nothing_else_given() {
        let items = ingredients(&["egg", "rice"]);
        let prompt = build_recipe_prompt(&RecipePromptParams {
            ingredients: &items,
            ..Default::default()
        });
        assert_eq!(prompt.user, "Create one recipe using these ingredients: egg, rice.");
    }

    #[test]
    fn test_recipe_prompt_appends_optional_clauses_in_order() {
        let items = ingredients(&["tofu"]);
        let prompt = build_recipe_prompt(&RecipePromptParams {
            ingredients: &items,
            diet: Some("vegan"),
            servings: Some(4),
            category: Some("Dinner"),
            allowed_categories: &[],
        });
        let diet = prompt.user.find("vegan diet").unwrap();
        let serves = prompt.user.find("serve 4").unwrap();
        let category = prompt.user.find("Dinner category").unwrap();
        assert!(diet < serves && serves < category);
    }

    #[test]
    fn test_recipe_prompt_skips_blank_clauses() {
        let items = ingredients(&["tofu"]);
        let prompt = build_recipe_prompt(&RecipePromptParams {
            ingredients: &items,
            diet: Some("   "),
            servings: Some(0),
            category: Some(""),
            allowed_categories: &[],
        });
        assert!(!prompt.user.contains("diet"));
        assert!(!prompt.user.contains("serve"));
        assert!(!prompt.user.contains("category"));
    }

    #[test]
    fn test_recipe_system_prompt_embeds_schema_and_rules() {
        let items = ingredients(&["egg"]);
        let prompt = build_recipe_prompt(&RecipePromptParams {
            ingredients: &items,
            ..Default::default()
        });
        assert!(prompt.system.contains(r#""prep_time": "integer minutes or null""#));
        assert!(prompt.system.contains("Use null for any numeric value"));
        assert!(prompt.system.contains("Number the directions"));
        assert!(prompt.system.contains(JSON_ONLY_SYSTEM));
    }

    #[test]
    fn test_recipe_prompt_lists_allowed_categories() {
        let items = ingredients(&["egg"]);
        let allowed = ingredients(&["Breakfast", "Dinner"]);
        let prompt = build_recipe_prompt(&RecipePromptParams {
            ingredients: &items,
            allowed_categories: &allowed,
            ..Default::default()
        });
        assert!(prompt.system.contains("category should be one of: Breakfast, Dinner."));
    }

    #[test]
    fn test_prompts_are_deterministic() {
        let items = ingredients(&["egg", "rice"]);
        let params = RecipePromptParams {
            ingredients: &items,
            diet: Some("keto"),
            servings: Some(2),
            category: None,
            allowed_categories: &[],
        };
        assert_eq!(build_recipe_prompt(&params), build_recipe_prompt(&params));

        let restaurant = RestaurantPromptParams {
            city: "Chicago",
            category: Some("Thai"),
            price: Some(2),
            listing: None,
        };
        assert_eq!(
            build_restaurant_prompt(&restaurant),
            build_restaurant_prompt(&restaurant)
        );
    }

    #[test]
    fn test_restaurant_prompt_clauses() {
        let prompt = build_restaurant_prompt(&RestaurantPromptParams {
            city: " Austin ",
            category: Some("bbq"),
            price: Some(2),
            listing: None,
        });
        assert_eq!(
            prompt.user,
            "Find a restaurant in Austin. It should serve bbq food. \
             Its price level should be at most $$ (2 of 4)."
        );
    }

    #[test]
    fn test_restaurant_prompt_ignores_out_of_range_price() {
        let prompt = build_restaurant_prompt(&RestaurantPromptParams {
            city: "Austin",
            price: Some(9),
            ..Default::default()
        });
        assert_eq!(prompt.user, "Find a restaurant in Austin.");
    }

    #[test]
    fn test_restaurant_prompt_mentions_listing() {
        let listing = PlaceListing {
            name: "Franklin Barbecue".to_string(),
            address: Some("900 E 11th St, Austin, TX".to_string()),
            rating: Some(4.7),
            ..PlaceListing::default()
        };
        let prompt = build_restaurant_prompt(&RestaurantPromptParams {
            city: "Austin",
            listing: Some(&listing),
            ..Default::default()
        });
        assert!(prompt.user.ends_with(
            "Write the profile for this real listing: Franklin Barbecue, 900 E 11th St, Austin, TX, rated 4.7."
        ));
    }
}
