// AI content pipeline: prompt → model → JSON extraction → normalization.
// All model calls go through llm_client::ChatModel; nothing here reads env.

pub mod extract;
pub mod generator;
pub mod handlers;
pub mod normalize;
pub mod prompts;
pub mod restaurant;
pub mod settings;
