pub mod batch_embed_contents;
pub mod generate_content;
pub mod list_models;
pub mod types;
