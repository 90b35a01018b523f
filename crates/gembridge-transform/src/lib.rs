//! OpenAI ⇄ Gemini translation.
//!
//! Modules are named `<downstream>2<upstream>`: `request.rs` turns the downstream request
//! into the upstream one and `response.rs` turns the upstream response back.

pub mod embeddings;
pub mod generate_content;
pub mod ids;
pub mod list_models;
pub mod model;

#[cfg(test)]
pub(crate) mod test_support;
