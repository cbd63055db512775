// Restaurant CRUD and listing filters. Generation lives in generation::restaurant.

pub mod handlers;
pub mod queries;
pub mod validation;
