use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::image::ImageView;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RestaurantRow {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub price: Option<i32>,
    pub rating: Option<f64>,
    pub food_type: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub phone_number: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub opening_hours: Option<String>,
    pub delivery_option: bool,
    pub vegan_friendly: bool,
    pub kid_friendly: bool,
    pub parking: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The writable restaurant fields. Unknown keys in a request body are dropped;
/// on update, `None` leaves the stored value unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RestaurantAttrs {
    pub name: Option<String>,
    pub price: Option<i32>,
    pub rating: Option<f64>,
    pub food_type: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub phone_number: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub opening_hours: Option<String>,
    pub delivery_option: Option<bool>,
    pub vegan_friendly: Option<bool>,
    pub kid_friendly: Option<bool>,
    pub parking: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RestaurantView {
    #[serde(flatten)]
    pub restaurant: RestaurantRow,
    pub images: Vec<ImageView>,
}

impl RestaurantRow {
    pub fn to_attrs(&self) -> RestaurantAttrs {
        RestaurantAttrs {
            name: Some(self.name.clone()),
            price: self.price,
            rating: self.rating,
            food_type: self.food_type.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            phone_number: self.phone_number.clone(),
            website: self.website.clone(),
            email: self.email.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip_code.clone(),
            latitude: self.latitude,
            longitude: self.longitude,
            opening_hours: self.opening_hours.clone(),
            delivery_option: Some(self.delivery_option),
            vegan_friendly: Some(self.vegan_friendly),
            kid_friendly: Some(self.kid_friendly),
            parking: self.parking.clone(),
        }
    }
}

impl RestaurantAttrs {
    /// Fields set in `patch` replace the ones in `self`.
    pub fn overlay(self, patch: RestaurantAttrs) -> RestaurantAttrs {
        RestaurantAttrs {
            name: patch.name.or(self.name),
            price: patch.price.or(self.price),
            rating: patch.rating.or(self.rating),
            food_type: patch.food_type.or(self.food_type),
            category: patch.category.or(self.category),
            description: patch.description.or(self.description),
            phone_number: patch.phone_number.or(self.phone_number),
            website: patch.website.or(self.website),
            email: patch.email.or(self.email),
            address: patch.address.or(self.address),
            city: patch.city.or(self.city),
            state: patch.state.or(self.state),
            zip_code: patch.zip_code.or(self.zip_code),
            latitude: patch.latitude.or(self.latitude),
            longitude: patch.longitude.or(self.longitude),
            opening_hours: patch.opening_hours.or(self.opening_hours),
            delivery_option: patch.delivery_option.or(self.delivery_option),
            vegan_friendly: patch.vegan_friendly.or(self.vegan_friendly),
            kid_friendly: patch.kid_friendly.or(self.kid_friendly),
            parking: patch.parking.or(self.parking),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlay_keeps_unset_fields() {
        let base = RestaurantAttrs {
            name: Some("Green Bowl".to_string()),
            price: Some(2),
            vegan_friendly: Some(true),
            ..Default::default()
        };
        let patch = RestaurantAttrs {
            price: Some(3),
            city: Some("Portland".to_string()),
            ..Default::default()
        };

        let merged = base.overlay(patch);
        assert_eq!(merged.name.as_deref(), Some("Green Bowl"));
        assert_eq!(merged.price, Some(3));
        assert_eq!(merged.city.as_deref(), Some("Portland"));
        assert_eq!(merged.vegan_friendly, Some(true));
    }

    #[test]
    fn test_attrs_ignore_unknown_keys() {
        let attrs: RestaurantAttrs = serde_json::from_value(serde_json::json!({
            "name": "Pequod's",
            "user_id": "00000000-0000-0000-0000-000000000000",
            "admin": true
        }))
        .unwrap();
        assert_eq!(attrs.name.as_deref(), Some("Pequod's"));
    }
}
