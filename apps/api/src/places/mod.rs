//! Places search client: fetches real restaurant listings for generation.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

const TEXT_SEARCH_PATH: &str = "/maps/api/place/textsearch/json";
/// The API rejects a continuation token that is used too soon after it was issued.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum PlacesError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Places API returned status {status}: {message}")]
    Api { status: String, message: String },
}

/// One restaurant from a places search, already mapped to our field names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaceListing {
    pub name: String,
    pub address: Option<String>,
    pub rating: Option<f64>,
    /// 0 (free) to 4 (very expensive).
    pub price_level: Option<i32>,
    pub place_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub category: String,
    pub food_type: String,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<PlaceResult>,
    next_page_token: Option<String>,
    status: String,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    name: String,
    formatted_address: Option<String>,
    rating: Option<f64>,
    price_level: Option<i32>,
    place_id: Option<String>,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

/// Search parameters for `PlacesClient::fetch_restaurants`.
#[derive(Debug, Clone)]
pub struct PlacesQuery<'a> {
    pub city: &'a str,
    pub category: Option<&'a str>,
    pub price_level: Option<i32>,
    pub limit: usize,
}

#[derive(Clone)]
pub struct PlacesClient {
    client: Client,
    api_key: String,
    base_url: String,
    page_delay: Duration,
}

impl PlacesClient {
    pub fn new(
        api_key: String,
        base_url: &str,
        timeout: Duration,
        page_delay: Duration,
    ) -> Result<Self, PlacesError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            page_delay,
        })
    }

    /// Text-searches restaurants, following continuation tokens until `limit`
    /// listings are collected or the API has no more pages.
    pub async fn fetch_restaurants(
        &self,
        query: &PlacesQuery<'_>,
    ) -> Result<Vec<PlaceListing>, PlacesError> {
        let category = query
            .category
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let mut text = format!("restaurants in {}", query.city.trim());
        if let Some(category) = category {
            text.push(' ');
            text.push_str(category);
        }

        let url = format!("{}{}", self.base_url, TEXT_SEARCH_PATH);
        let mut params: Vec<(&str, String)> = vec![
            ("query", text),
            ("key", self.api_key.clone()),
            ("type", "restaurant".to_string()),
        ];
        if let Some(price) = query.price_level {
            params.push(("maxprice", price.to_string()));
        }

        let mut listings = Vec::new();
        loop {
            let page: SearchPage = self
                .client
                .get(&url)
                .query(&params)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            if page.status != "OK" && page.status != "ZERO_RESULTS" {
                return Err(PlacesError::Api {
                    status: page.status,
                    message: page.error_message.unwrap_or_default(),
                });
            }

            debug!("Places page returned {} results", page.results.len());
            listings.extend(page.results.into_iter().map(|r| to_listing(r, category)));

            let token = match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) if listings.len() < query.limit => token,
                _ => break,
            };

            tokio::time::sleep(self.page_delay).await;
            params = vec![("key", self.api_key.clone()), ("pagetoken", token)];
        }

        listings.truncate(query.limit);
        info!(
            "Fetched {} restaurant listings for {}",
            listings.len(),
            query.city
        );
        Ok(listings)
    }
}

fn to_listing(result: PlaceResult, category: Option<&str>) -> PlaceListing {
    let (latitude, longitude) = result
        .geometry
        .map(|g| (Some(g.location.lat), Some(g.location.lng)))
        .unwrap_or((None, None));

    PlaceListing {
        name: result.name,
        address: result.formatted_address,
        rating: result.rating,
        price_level: result.price_level,
        place_id: result.place_id,
        latitude,
        longitude,
        category: category.unwrap_or("Restaurant").to_string(),
        food_type: category.unwrap_or("Various").to_string(),
    }
}
