use serde::{Deserialize, Serialize};

use crate::gemini::types::Content;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchEmbedContentsPath {
    /// Bare model id, without the `models/` prefix.
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmbedContentRequest {
    /// Format: models/{model}. Must match the model in the path.
    pub model: String,
    pub content: Content,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEmbedContentsRequestBody {
    pub requests: Vec<EmbedContentRequest>,
}

#[derive(Debug, Clone)]
pub struct BatchEmbedContentsRequest {
    pub path: BatchEmbedContentsPath,
    pub body: BatchEmbedContentsRequestBody,
}
