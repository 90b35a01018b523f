use serde::{Deserialize, Serialize};

use crate::openai::types::ListObjectType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelObjectType {
    #[serde(rename = "model")]
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Model {
    /// The model identifier, which can be referenced in the API endpoints.
    pub id: String,
    /// The object type, which is always "model".
    pub object: ModelObjectType,
    /// The Unix timestamp (in seconds) when the model was created.
    pub created: i64,
    /// The organization that owns the model.
    pub owned_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ListModelsResponse {
    /// The object type, which is always "list".
    pub object: ListObjectType,
    /// The list of model objects.
    pub data: Vec<Model>,
}
