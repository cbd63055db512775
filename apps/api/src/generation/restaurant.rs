//! Restaurant Generation: one real listing (when a places key is configured)
//! plus a model-written profile, normalized onto the restaurant columns.
//!
//! Uses the same extract → strict retry → normalize pipeline as recipes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::generator::{attach_generated_image, complete_json};
use crate::generation::normalize::{capitalize, coerce_int, first_present, scalar_text};
use crate::generation::prompts::{
    build_restaurant_prompt, restaurant_image_prompt, RestaurantPromptParams,
};
use crate::generation::settings::GenerationSettings;
use crate::llm_client::ChatModel;
use crate::models::restaurant::{RestaurantAttrs, RestaurantRow};
use crate::places::{PlaceListing, PlacesClient, PlacesQuery};
use crate::restaurants::queries::insert_restaurant;
use crate::restaurants::validation::validate_restaurant;
use crate::storage::{ImageStore, OwnerKind};

const NAME_KEYS: &[&str] = &["name", "Name", "restaurant_name", "title"];
const DESCRIPTION_KEYS: &[&str] = &["description", "Description", "summary"];
const FOOD_TYPE_KEYS: &[&str] = &["food_type", "foodType", "cuisine", "Cuisine"];
const CATEGORY_KEYS: &[&str] = &["category", "Category"];
const PRICE_KEYS: &[&str] = &["price", "Price", "price_level", "priceLevel"];
const RATING_KEYS: &[&str] = &["rating", "Rating"];
const ADDRESS_KEYS: &[&str] = &["address", "Address", "formatted_address"];
const CITY_KEYS: &[&str] = &["city", "City"];
const STATE_KEYS: &[&str] = &["state", "State"];
const ZIP_KEYS: &[&str] = &["zip_code", "zip", "postal_code"];
const HOURS_KEYS: &[&str] = &["opening_hours", "openingHours", "hours"];
const PARKING_KEYS: &[&str] = &["parking", "Parking"];
const DELIVERY_KEYS: &[&str] = &["delivery_option", "delivery"];
const VEGAN_KEYS: &[&str] = &["vegan_friendly", "vegan"];
const KID_KEYS: &[&str] = &["kid_friendly", "kids"];

/// Request body for `POST /restaurants/generate_restaurant`.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRestaurantRequest {
    pub city: Option<String>,
    pub category: Option<String>,
    /// Price ceiling, 1 to 4.
    pub price: Option<i32>,
    #[serde(default = "default_save")]
    pub save: bool,
}

fn default_save() -> bool {
    true
}

#[derive(Debug, Clone, Serialize)]
pub struct RestaurantDraft {
    pub generated: Map<String, Value>,
    pub normalized: RestaurantAttrs,
    pub listing: Option<PlaceListing>,
}

#[derive(Debug, Clone)]
pub struct SavedRestaurant {
    pub restaurant: RestaurantRow,
    pub image_attached: bool,
}

/// Caller-supplied values that are not part of the model output.
#[derive(Debug, Clone, Default)]
pub struct RestaurantContext<'a> {
    pub city: &'a str,
    pub category: Option<&'a str>,
    /// Facts from a real listing; they win over anything the model wrote.
    pub listing: Option<&'a PlaceListing>,
}

pub fn normalize_restaurant(
    source: &Map<String, Value>,
    context: &RestaurantContext<'_>,
) -> RestaurantAttrs {
    let listing = context.listing;

    let category = non_blank(context.category)
        .map(String::from)
        .or_else(|| text(source, CATEGORY_KEYS))
        .or_else(|| listing.map(|l| l.category.clone()))
        .map(|c| capitalize(&c));

    RestaurantAttrs {
        name: listing
            .map(|l| l.name.trim().to_string())
            .filter(|n| !n.is_empty())
            .or_else(|| text(source, NAME_KEYS)),
        price: listing
            .and_then(|l| l.price_level)
            .filter(|p| (1..=4).contains(p))
            .or_else(|| first_present(source, PRICE_KEYS).and_then(coerce_price)),
        rating: listing
            .and_then(|l| l.rating)
            .or_else(|| first_present(source, RATING_KEYS).and_then(coerce_rating)),
        food_type: text(source, FOOD_TYPE_KEYS).or_else(|| listing.map(|l| l.food_type.clone())),
        category,
        description: text(source, DESCRIPTION_KEYS),
        address: listing
            .and_then(|l| l.address.clone())
            .or_else(|| text(source, ADDRESS_KEYS)),
        city: text(source, CITY_KEYS).or_else(|| non_blank(Some(context.city)).map(String::from)),
        state: text(source, STATE_KEYS),
        zip_code: text(source, ZIP_KEYS),
        latitude: listing.and_then(|l| l.latitude),
        longitude: listing.and_then(|l| l.longitude),
        opening_hours: text(source, HOURS_KEYS),
        delivery_option: Some(flag(source, DELIVERY_KEYS)),
        vegan_friendly: Some(flag(source, VEGAN_KEYS)),
        kid_friendly: Some(flag(source, KID_KEYS)),
        parking: text(source, PARKING_KEYS),
        // Contact details are never taken from the model.
        phone_number: None,
        website: None,
        email: None,
    }
}

/// Fetches a listing when places lookup is enabled, then runs the model.
pub async fn draft_restaurant(
    llm: &dyn ChatModel,
    places: Option<&PlacesClient>,
    settings: &GenerationSettings,
    request: &GenerateRestaurantRequest,
) -> Result<RestaurantDraft, AppError> {
    let city = non_blank(request.city.as_deref())
        .ok_or_else(|| AppError::BadRequest("city is required".to_string()))?;
    let category = non_blank(request.category.as_deref());
    let price = request.price.filter(|p| (1..=4).contains(p));

    let listing = match places {
        Some(client) => client
            .fetch_restaurants(&PlacesQuery {
                city,
                category,
                price_level: price,
                limit: 1,
            })
            .await?
            .into_iter()
            .next(),
        None => None,
    };
    if places.is_some() && listing.is_none() {
        info!("No places listing found for {city}, letting the model propose one");
    }

    let prompt = build_restaurant_prompt(&RestaurantPromptParams {
        city,
        category,
        price,
        listing: listing.as_ref(),
    });

    let generated =
        complete_json(llm, settings, &prompt, settings.restaurant_temperature).await?;

    let normalized = normalize_restaurant(
        &generated,
        &RestaurantContext {
            city,
            category,
            listing: listing.as_ref(),
        },
    );

    Ok(RestaurantDraft {
        generated,
        normalized,
        listing,
    })
}

/// Validates and stores a generated restaurant, then tries to illustrate it.
pub async fn save_restaurant_draft(
    pool: &PgPool,
    store: &ImageStore,
    llm: &dyn ChatModel,
    settings: &GenerationSettings,
    owner: Option<Uuid>,
    attrs: &RestaurantAttrs,
) -> Result<SavedRestaurant, AppError> {
    validate_restaurant(attrs)?;
    let restaurant = insert_restaurant(pool, owner, attrs).await?;
    info!("Saved generated restaurant {} ({})", restaurant.id, restaurant.name);

    let prompt = restaurant_image_prompt(&restaurant.name, restaurant.food_type.as_deref());
    let image_attached = attach_generated_image(
        pool,
        store,
        llm,
        &settings.image_size,
        OwnerKind::Restaurant,
        restaurant.id,
        &prompt,
    )
    .await;

    Ok(SavedRestaurant {
        restaurant,
        image_attached,
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn text(source: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    first_present(source, keys)
        .and_then(scalar_text)
        .filter(|t| !t.is_empty())
}

/// "$$" → 2, "3" → 3. Anything outside 1..=4 is dropped.
fn coerce_price(value: &Value) -> Option<i32> {
    let price = match value {
        Value::String(s) if !s.trim().is_empty() && s.trim().chars().all(|c| c == '$') => {
            i32::try_from(s.trim().len()).ok()
        }
        other => coerce_int(other),
    };
    price.filter(|p| (1..=4).contains(p))
}

/// Numbers or numeric strings ("4.5/5" → 4.5) within 0..=5.
fn coerce_rating(value: &Value) -> Option<f64> {
    let rating = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            let end = s
                .char_indices()
                .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
                .map(|(i, _)| i)
                .unwrap_or(s.len());
            s[..end].parse::<f64>().ok()
        }
        _ => None,
    };
    rating.filter(|r| (0.0..=5.0).contains(r))
}

/// Booleans, "yes"/"no" style strings and 0/1. Unknown shapes are `false`.
fn flag(source: &Map<String, Value>, keys: &[&str]) -> bool {
    match first_present(source, keys) {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|n| n != 0),
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "y" | "1" | "available"
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::fake::FakeChatModel;
    use serde_json::json;
    use std::time::Duration;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn listing() -> PlaceListing {
        PlaceListing {
            name: "Franklin Barbecue".to_string(),
            address: Some("900 E 11th St, Austin, TX".to_string()),
            rating: Some(4.7),
            price_level: Some(2),
            place_id: Some("abc".to_string()),
            latitude: Some(30.27),
            longitude: Some(-97.73),
            category: "bbq".to_string(),
            food_type: "bbq".to_string(),
        }
    }

    #[test]
    fn test_normalize_model_only_record() {
        let source = object(json!({
            "name": "Taqueria Azul",
            "description": "Small taco shop.",
            "cuisine": "Mexican",
            "price": "$$",
            "rating": "4.5/5",
            "vegan": "yes",
            "kid_friendly": true,
            "delivery_option": 0
        }));

        let attrs = normalize_restaurant(
            &source,
            &RestaurantContext {
                city: "Austin",
                ..Default::default()
            },
        );

        assert_eq!(attrs.name.as_deref(), Some("Taqueria Azul"));
        assert_eq!(attrs.food_type.as_deref(), Some("Mexican"));
        assert_eq!(attrs.price, Some(2));
        assert_eq!(attrs.rating, Some(4.5));
        assert_eq!(attrs.city.as_deref(), Some("Austin"));
        assert_eq!(attrs.vegan_friendly, Some(true));
        assert_eq!(attrs.kid_friendly, Some(true));
        assert_eq!(attrs.delivery_option, Some(false));
        assert_eq!(attrs.category, None);
    }

    #[test]
    fn test_listing_facts_win_over_model_output() {
        let source = object(json!({
            "name": "Made Up Smokehouse",
            "address": "1 Fake St",
            "rating": 2.0,
            "price": 4,
            "description": "Legendary brisket.",
            "phone_number": "555-0100"
        }));
        let listing = listing();

        let attrs = normalize_restaurant(
            &source,
            &RestaurantContext {
                city: "Austin",
                category: None,
                listing: Some(&listing),
            },
        );

        assert_eq!(attrs.name.as_deref(), Some("Franklin Barbecue"));
        assert_eq!(attrs.address.as_deref(), Some("900 E 11th St, Austin, TX"));
        assert_eq!(attrs.rating, Some(4.7));
        assert_eq!(attrs.price, Some(2));
        assert_eq!(attrs.latitude, Some(30.27));
        assert_eq!(attrs.food_type.as_deref(), Some("bbq"));
        assert_eq!(attrs.category.as_deref(), Some("Bbq"));
        assert_eq!(attrs.description.as_deref(), Some("Legendary brisket."));
        assert_eq!(attrs.phone_number, None);
    }

    #[test]
    fn test_out_of_range_numbers_are_dropped() {
        assert_eq!(coerce_price(&json!(9)), None);
        assert_eq!(coerce_price(&json!("$$$$$")), None);
        assert_eq!(coerce_price(&json!("3")), Some(3));
        assert_eq!(coerce_rating(&json!(7.5)), None);
        assert_eq!(coerce_rating(&json!("great")), None);
    }

    #[test]
    fn test_request_saves_by_default() {
        let req: GenerateRestaurantRequest =
            serde_json::from_value(json!({"city": "Chicago"})).unwrap();
        assert!(req.save);
    }

    #[tokio::test]
    async fn test_missing_city_is_bad_request() {
        let llm = FakeChatModel::new();
        let req = GenerateRestaurantRequest {
            city: Some("  ".to_string()),
            category: None,
            price: None,
            save: false,
        };

        let err = draft_restaurant(&llm, None, &GenerationSettings::default(), &req)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_draft_without_places_uses_restaurant_temperature() {
        let llm = FakeChatModel::new()
            .respond(r#"{"name": "Green Bowl", "food_type": "Vegan", "vegan_friendly": true}"#);
        let req = GenerateRestaurantRequest {
            city: Some("Portland".to_string()),
            category: Some("vegan".to_string()),
            price: None,
            save: false,
        };

        let draft = draft_restaurant(&llm, None, &GenerationSettings::default(), &req)
            .await
            .unwrap();

        assert!(draft.listing.is_none());
        assert_eq!(draft.normalized.name.as_deref(), Some("Green Bowl"));
        assert_eq!(draft.normalized.category.as_deref(), Some("Vegan"));
        assert_eq!(llm.requests()[0].temperature, 0.7);
    }

    #[tokio::test]
    async fn test_draft_merges_places_listing() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/maps/api/place/textsearch/json")
            .match_query(mockito::Matcher::Any)
            .with_body(
                r#"{"status": "OK", "results": [{
                    "name": "Pequod's Pizza",
                    "formatted_address": "2207 N Clybourn Ave, Chicago, IL",
                    "rating": 4.6,
                    "geometry": {"location": {"lat": 41.92, "lng": -87.66}}
                }]}"#,
            )
            .create_async()
            .await;
        let places = PlacesClient::new(
            "places-key".to_string(),
            &server.url(),
            Duration::from_secs(5),
            Duration::ZERO,
        )
        .unwrap();
        let llm = FakeChatModel::new()
            .respond(r#"{"name": "Pequod's", "description": "Caramelized-crust deep dish."}"#);
        let req = GenerateRestaurantRequest {
            city: Some("Chicago".to_string()),
            category: Some("pizza".to_string()),
            price: None,
            save: false,
        };

        let draft = draft_restaurant(&llm, Some(&places), &GenerationSettings::default(), &req)
            .await
            .unwrap();

        assert_eq!(draft.normalized.name.as_deref(), Some("Pequod's Pizza"));
        assert_eq!(draft.normalized.latitude, Some(41.92));
        assert_eq!(
            draft.normalized.description.as_deref(),
            Some("Caramelized-crust deep dish.")
        );
        assert!(llm.requests()[0].messages[1]
            .content
            .contains("real listing: Pequod's Pizza"));
        assert_eq!(draft.listing.map(|l| l.name).as_deref(), Some("Pequod's Pizza"));
    }

    #[tokio::test]
    async fn test_out_of_range_price_is_not_sent_to_places() {
        let mut server = mockito::Server::new_async().await;
        let search = server
            .mock("GET", "/maps/api/place/textsearch/json")
            .match_query(mockito::Matcher::Any)
            .with_body(r#"{"status": "ZERO_RESULTS", "results": []}"#)
            .expect(1)
            .create_async()
            .await;
        let with_price = server
            .mock("GET", "/maps/api/place/textsearch/json")
            .match_query(mockito::Matcher::Regex("maxprice=".to_string()))
            .expect(0)
            .create_async()
            .await;
        let places = PlacesClient::new(
            "places-key".to_string(),
            &server.url(),
            Duration::from_secs(5),
            Duration::ZERO,
        )
        .unwrap();
        let llm = FakeChatModel::new().respond(r#"{"name": "Lou Malnati's"}"#);
        let req = GenerateRestaurantRequest {
            city: Some("Chicago".to_string()),
            category: None,
            price: Some(9),
            save: false,
        };

        let draft = draft_restaurant(&llm, Some(&places), &GenerationSettings::default(), &req)
            .await
            .unwrap();

        assert_eq!(draft.normalized.name.as_deref(), Some("Lou Malnati's"));
        assert!(!llm.requests()[0].messages[1].content.contains("price level"));
        with_price.assert_async().await;
        search.assert_async().await;
    }
}
