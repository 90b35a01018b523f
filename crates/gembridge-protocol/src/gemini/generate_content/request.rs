use serde::{Deserialize, Serialize};

use crate::gemini::generate_content::types::{GenerationConfig, SafetySetting, Tool};
use crate::gemini::types::Content;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateContentPath {
    /// Bare model id, without the `models/` prefix.
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequestBody {
    /// Required. The content of the current conversation with the model.
    pub contents: Vec<Content>,
    /// System instruction; the last system message of the conversation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safety_settings: Option<Vec<SafetySetting>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Tool>>,
}

#[derive(Debug, Clone)]
pub struct GenerateContentRequest {
    pub path: GenerateContentPath,
    pub body: GenerateContentRequestBody,
}
