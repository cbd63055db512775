// Opaque bearer sessions: random token to the client, SHA-256 of it in
// `sessions` with a 24 hour expiry. Passwords are argon2 hashed.

pub mod crypto;
pub mod extractor;
pub mod handlers;
pub mod queries;
