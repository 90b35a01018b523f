use gembridge_protocol::gemini::batch_embed_contents::request::{
    BatchEmbedContentsPath, BatchEmbedContentsRequest, BatchEmbedContentsRequestBody,
    EmbedContentRequest,
};
use gembridge_protocol::gemini::types::{Content as GeminiContent, Part as GeminiPart};
use gembridge_protocol::openai::embeddings::request::CreateEmbeddingRequestBody;

use crate::model::{DEFAULT_EMBEDDING_MODEL, resolve_model_id};

/// Convert an OpenAI embeddings body into one batch call, one entry per input string.
pub fn transform_request(body: &CreateEmbeddingRequestBody) -> BatchEmbedContentsRequest {
    let model = resolve_model_id(body.model.as_deref(), DEFAULT_EMBEDDING_MODEL);
    let qualified = format!("models/{model}");

    let requests = body
        .input
        .clone()
        .into_vec()
        .into_iter()
        .map(|text| EmbedContentRequest {
            model: qualified.clone(),
            content: GeminiContent {
                parts: vec![GeminiPart::text(text)],
                role: None,
            },
        })
        .collect();

    BatchEmbedContentsRequest {
        path: BatchEmbedContentsPath { model },
        body: BatchEmbedContentsRequestBody { requests },
    }
}
