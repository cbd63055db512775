//! Response Normalizer: maps heterogeneous recipe payloads (model output or raw
//! form input) onto the canonical recipe shape.
//!
//! Every canonical field is read through an ordered list of candidate keys
//! (`FIELD_KEYS`). The first key holding a non-null value wins. Normalization
//! never fails: each field has a fallback, and persistence validation is the
//! real gate.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::generation::settings::RecipeDefaults;

pub const INGREDIENT_SEPARATOR: &str = ", ";
pub const DIRECTION_SEPARATOR: &str = ". ";
pub const TAG_SEPARATOR: &str = ", ";

/// A recipe attribute the normalizer knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeField {
    Title,
    Description,
    Notes,
    Ingredients,
    Directions,
    Tags,
    Category,
    PrepTime,
    CookTime,
    Servings,
    Difficulty,
    Rating,
}

/// Candidate keys per field, in priority order.
const FIELD_KEYS: &[(RecipeField, &[&str])] = &[
    (RecipeField::Title, &["title", "Title", "name", "Name", "recipe_name"]),
    (RecipeField::Description, &["description", "Description", "summary", "Summary"]),
    (RecipeField::Notes, &["notes", "Notes", "note", "Note"]),
    (RecipeField::Ingredients, &["ingredients", "Ingredients", "ingredient_list"]),
    (
        RecipeField::Directions,
        &["directions", "Directions", "steps", "Steps", "instructions", "Instructions", "method"],
    ),
    (RecipeField::Tags, &["tags", "Tags", "keywords"]),
    (RecipeField::Category, &["category", "Category", "course"]),
    (RecipeField::PrepTime, &["prep_time", "prepTime", "PrepTime", "prep_time_minutes"]),
    (RecipeField::CookTime, &["cook_time", "cookTime", "CookTime", "cook_time_minutes"]),
    (RecipeField::Servings, &["servings", "Servings", "serves", "yield"]),
    (RecipeField::Difficulty, &["difficulty", "Difficulty"]),
    (RecipeField::Rating, &["rating", "Rating"]),
];

const INGREDIENT_NAME_KEYS: &[&str] = &["name", "Name", "item", "ingredient"];
const INGREDIENT_QUANTITY_KEYS: &[&str] = &["quantity", "Quantity", "amount", "qty"];
const STEP_TEXT_KEYS: &[&str] = &["text", "step", "instruction", "description"];

/// The fully-defaulted attribute set ready for persistence or display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecipe {
    pub user_id: Option<Uuid>,
    pub title: String,
    pub prep_time: i32,
    pub cook_time: i32,
    pub servings: i32,
    pub difficulty: i32,
    /// Legacy per-recipe rating; superseded by the ratings average.
    pub rating: Option<i32>,
    pub tags: String,
    pub category: String,
    pub description: String,
    pub ingredients: String,
    pub directions: String,
}

/// Caller-supplied values that are not part of the payload itself.
#[derive(Debug, Clone, Default)]
pub struct NormalizeContext<'a> {
    pub user_id: Option<Uuid>,
    /// Wins over any category found in the payload when non-blank.
    pub category: Option<&'a str>,
}

pub fn normalize_recipe(
    source: &Map<String, Value>,
    context: &NormalizeContext<'_>,
    defaults: &RecipeDefaults,
) -> CanonicalRecipe {
    let description = [RecipeField::Description, RecipeField::Notes]
        .into_iter()
        .filter_map(|field| lookup(source, field).and_then(scalar_text))
        .find(|text| !text.is_empty())
        .unwrap_or_else(|| defaults.description.clone());

    let category = context
        .category
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(String::from)
        .or_else(|| {
            lookup(source, RecipeField::Category)
                .and_then(scalar_text)
                .filter(|c| !c.is_empty())
        })
        .unwrap_or_else(|| defaults.category.clone());

    CanonicalRecipe {
        user_id: context.user_id,
        title: lookup(source, RecipeField::Title)
            .and_then(scalar_text)
            .unwrap_or_default(),
        prep_time: read_int(source, RecipeField::PrepTime).unwrap_or(defaults.prep_time),
        cook_time: read_int(source, RecipeField::CookTime).unwrap_or(defaults.cook_time),
        servings: read_int(source, RecipeField::Servings).unwrap_or(defaults.servings),
        difficulty: read_int(source, RecipeField::Difficulty).unwrap_or(defaults.difficulty),
        rating: read_int(source, RecipeField::Rating),
        tags: lookup(source, RecipeField::Tags)
            .map(normalize_tags)
            .unwrap_or_default(),
        category: capitalize(&category),
        description,
        ingredients: lookup(source, RecipeField::Ingredients)
            .map(normalize_ingredients)
            .unwrap_or_default(),
        directions: lookup(source, RecipeField::Directions)
            .map(normalize_directions)
            .unwrap_or_default(),
    }
}

/// Partial update read from the same heterogeneous payloads. Only fields that
/// are present in the source are `Some`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub prep_time: Option<i32>,
    pub cook_time: Option<i32>,
    pub servings: Option<i32>,
    pub difficulty: Option<i32>,
    pub rating: Option<i32>,
    pub tags: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub ingredients: Option<String>,
    pub directions: Option<String>,
    /// Messages for present fields that could not be coerced.
    pub invalid: Vec<String>,
}

impl RecipePatch {
    pub fn from_source(source: &Map<String, Value>) -> Self {
        let mut patch = RecipePatch {
            title: lookup(source, RecipeField::Title).and_then(scalar_text),
            tags: lookup(source, RecipeField::Tags).map(normalize_tags),
            category: lookup(source, RecipeField::Category)
                .and_then(scalar_text)
                .map(|c| capitalize(&c)),
            description: lookup(source, RecipeField::Description).and_then(scalar_text),
            ingredients: lookup(source, RecipeField::Ingredients).map(normalize_ingredients),
            directions: lookup(source, RecipeField::Directions).map(normalize_directions),
            ..RecipePatch::default()
        };

        let numeric = [
            (RecipeField::PrepTime, "Prep time", &mut patch.prep_time),
            (RecipeField::CookTime, "Cook time", &mut patch.cook_time),
            (RecipeField::Servings, "Servings", &mut patch.servings),
            (RecipeField::Difficulty, "Difficulty", &mut patch.difficulty),
            (RecipeField::Rating, "Rating", &mut patch.rating),
        ];
        for (field, label, slot) in numeric {
            if let Some(value) = lookup(source, field) {
                match coerce_int(value) {
                    Some(n) => *slot = Some(n),
                    None => patch.invalid.push(format!("{label} is not a number")),
                }
            }
        }
        patch
    }

    pub fn apply(self, mut recipe: CanonicalRecipe) -> CanonicalRecipe {
        if let Some(v) = self.title {
            recipe.title = v;
        }
        if let Some(v) = self.prep_time {
            recipe.prep_time = v;
        }
        if let Some(v) = self.cook_time {
            recipe.cook_time = v;
        }
        if let Some(v) = self.servings {
            recipe.servings = v;
        }
        if let Some(v) = self.difficulty {
            recipe.difficulty = v;
        }
        if let Some(v) = self.rating {
            recipe.rating = Some(v);
        }
        if let Some(v) = self.tags {
            recipe.tags = v;
        }
        if let Some(v) = self.category {
            recipe.category = v;
        }
        if let Some(v) = self.description {
            recipe.description = v;
        }
        if let Some(v) = self.ingredients {
            recipe.ingredients = v;
        }
        if let Some(v) = self.directions {
            recipe.directions = v;
        }
        recipe
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field lookup
// ────────────────────────────────────────────────────────────────────────────

fn keys_for(field: RecipeField) -> &'static [&'static str] {
    FIELD_KEYS
        .iter()
        .find(|(f, _)| *f == field)
        .map(|(_, keys)| *keys)
        .unwrap_or(&[])
}

/// First non-null value among the field's candidate keys.
pub fn lookup(source: &Map<String, Value>, field: RecipeField) -> Option<&Value> {
    first_present(source, keys_for(field))
}

pub fn first_present<'a>(source: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| source.get(*key))
        .find(|value| !value.is_null())
}

fn read_int(source: &Map<String, Value>, field: RecipeField) -> Option<i32> {
    lookup(source, field).and_then(coerce_int)
}

// ────────────────────────────────────────────────────────────────────────────
// Value coercion
// ────────────────────────────────────────────────────────────────────────────

/// Trimmed text for strings, numbers and booleans; `None` for containers and null.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Integer coercion: numbers truncate, strings use their leading integer
/// ("15 minutes" → 15). Anything else is `None`.
pub fn coerce_int(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => leading_int(s.trim()),
        _ => None,
    }
}

fn leading_int(text: &str) -> Option<i32> {
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(text)),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    digits[..end].parse::<i32>().ok().map(|n| n * sign)
}

/// Upper-cases the leading character only; the rest keeps its case.
pub fn capitalize(text: &str) -> String {
    let text = text.trim();
    let mut chars = text.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Collection fields
// ────────────────────────────────────────────────────────────────────────────

/// Accepts a string, a list of strings, or a list of `{name, quantity}` objects.
pub fn normalize_ingredients(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(ingredient_entry)
            .filter(|entry| !entry.is_empty())
            .collect::<Vec<_>>()
            .join(INGREDIENT_SEPARATOR),
        other => scalar_text(other).unwrap_or_default(),
    }
}

fn ingredient_entry(item: &Value) -> Option<String> {
    match item {
        Value::Object(map) => {
            let quantity = first_present(map, INGREDIENT_QUANTITY_KEYS)
                .and_then(scalar_text)
                .unwrap_or_default();
            let name = first_present(map, INGREDIENT_NAME_KEYS)
                .and_then(scalar_text)
                .unwrap_or_default();
            Some(format!("{quantity} {name}").trim().to_string())
        }
        other => scalar_text(other),
    }
}

/// Accepts a list of steps or a single string. A string is split on line
/// breaks when it has several lines, otherwise on sentence-ending punctuation.
pub fn normalize_directions(value: &Value) -> String {
    let steps: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(step_entry).collect(),
        Value::String(text) => split_steps(text),
        other => scalar_text(other).into_iter().collect(),
    };

    steps
        .iter()
        .map(|step| clean_step(step))
        .filter(|step| !step.is_empty())
        .collect::<Vec<_>>()
        .join(DIRECTION_SEPARATOR)
}

fn step_entry(item: &Value) -> Option<String> {
    match item {
        Value::Object(map) => first_present(map, STEP_TEXT_KEYS).and_then(scalar_text),
        other => scalar_text(other),
    }
}

fn split_steps(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() > 1 {
        return lines.into_iter().map(String::from).collect();
    }
    split_sentences(text)
}

/// Splits after `.`, `!` or `?` when followed by whitespace or the end of text,
/// so decimals like "1.5 cups" stay intact.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        let ends_sentence = matches!(c, '.' | '!' | '?')
            && chars.peek().map_or(true, |next| next.is_whitespace());
        if ends_sentence {
            sentences.push(std::mem::take(&mut current));
        }
    }
    sentences.push(current);
    sentences
}

/// Drops leading step numbering ("1.", "2)", "Step 3:") and trailing punctuation.
/// Fragments that are only a number disappear entirely.
fn clean_step(step: &str) -> String {
    let mut text = step.trim();

    if let Some(rest) = text
        .strip_prefix("Step ")
        .or_else(|| text.strip_prefix("step "))
    {
        text = rest.trim_start();
    }

    let digits = text.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &text[digits..];
        if rest.is_empty() || rest.starts_with(['.', ')', ':']) {
            text = rest.trim_start_matches(['.', ')', ':']).trim_start();
        }
    }

    text.trim_end_matches(['.', '!', '?', ';'])
        .trim_end()
        .to_string()
}

/// Accepts a list or a comma-separated string.
pub fn normalize_tags(value: &Value) -> String {
    let tags: Vec<String> = match value {
        Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
        other => scalar_text(other)
            .map(|text| text.split(',').map(|t| t.trim().to_string()).collect())
            .unwrap_or_default(),
    };
    tags.into_iter()
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(TAG_SEPARATOR)
}
