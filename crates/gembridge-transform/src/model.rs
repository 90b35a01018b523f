pub const DEFAULT_CHAT_MODEL: &str = "gemini-1.5-flash-latest";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

/// Picks the requested model (or `default`) and drops a leading `models/`.
pub fn resolve_model_id(requested: Option<&str>, default: &str) -> String {
    let model = requested
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(default);
    model.strip_prefix("models/").unwrap_or(model).to_string()
}
