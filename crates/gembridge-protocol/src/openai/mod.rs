pub mod create_chat_completions;
pub mod embeddings;
pub mod list_models;
pub mod types;
