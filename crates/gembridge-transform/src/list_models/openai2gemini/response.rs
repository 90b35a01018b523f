use gembridge_protocol::gemini::list_models::response::ListModelsResponse as GeminiListModelsResponse;
use gembridge_protocol::openai::list_models::response::{
    ListModelsResponse as OpenAIListModelsResponse, Model as OpenAIModel, ModelObjectType,
};
use gembridge_protocol::openai::types::ListObjectType;

pub const MODEL_OWNER: &str = "google";

/// Convert Gemini's model listing into OpenAI's list-models shape.
///
/// Only the first `models/` occurrence is stripped from each name.
pub fn transform_response(response: GeminiListModelsResponse) -> OpenAIListModelsResponse {
    let data = response
        .models
        .into_iter()
        .map(|model| OpenAIModel {
            id: model.name.replacen("models/", "", 1),
            object: ModelObjectType::Model,
            created: 0,
            owned_by: MODEL_OWNER.to_string(),
        })
        .collect();

    OpenAIListModelsResponse {
        object: ListObjectType::List,
        data,
    }
}
