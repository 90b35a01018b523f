use gembridge_protocol::gemini::batch_embed_contents::response::BatchEmbedContentsResponse;
use gembridge_protocol::openai::embeddings::response::{
    CreateEmbeddingResponse, Embedding, EmbeddingObjectType, EmbeddingUsage,
};
use gembridge_protocol::openai::types::ListObjectType;

/// Convert a batch-embed response into OpenAI's embeddings list.
///
/// Gemini reports no token counts here, so usage is always zero.
pub fn transform_response(response: BatchEmbedContentsResponse, model: &str) -> CreateEmbeddingResponse {
    let data = response
        .embeddings
        .into_iter()
        .zip(0u32..)
        .map(|(embedding, index)| Embedding {
            object: EmbeddingObjectType::Embedding,
            index,
            embedding: embedding.values,
        })
        .collect();

    CreateEmbeddingResponse {
        object: ListObjectType::List,
        data,
        model: model.to_string(),
        usage: EmbeddingUsage {
            prompt_tokens: 0,
            total_tokens: 0,
        },
    }
}
