//! Ratings: one value per (user, recipe), averaged on every read.

pub mod handlers;
pub mod queries;

/// Accepted rating values, inclusive.
pub const RATING_RANGE: std::ops::RangeInclusive<i32> = 1..=10;

/// Mean of `values` rounded to two decimals; `None` when there are no ratings.
pub fn average_rating(values: &[i32]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: i64 = values.iter().map(|v| i64::from(*v)).sum();
    let mean = sum as f64 / values.len() as f64;
    Some((mean * 100.0).round() / 100.0)
}
