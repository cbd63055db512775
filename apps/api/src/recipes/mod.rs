// Recipe CRUD. Writes run form input through generation::normalize and
// recipes::validation before touching the database.

pub mod form;
pub mod handlers;
pub mod queries;
pub mod validation;
