use gembridge_common::{GatewayError, GatewayResult, RelayClient};
use gembridge_protocol::gemini::generate_content::request::{
    GenerateContentPath as GeminiGenerateContentPath,
    GenerateContentRequest as GeminiGenerateContentRequest,
    GenerateContentRequestBody as GeminiGenerateContentRequestBody,
};
use gembridge_protocol::gemini::generate_content::types::{
    GenerationConfig, HarmBlockThreshold, HarmCategory, SafetySetting,
};
use gembridge_protocol::gemini::types::{Content as GeminiContent, ContentRole as GeminiContentRole};
use gembridge_protocol::openai::create_chat_completions::request::CreateChatCompletionRequestBody;
use gembridge_protocol::openai::create_chat_completions::types::ChatCompletionRequestMessage;

use super::content::transform_content;
use super::tools::transform_tools;
use crate::model::{DEFAULT_CHAT_MODEL, resolve_model_id};

/// Fixed per-deployment settings applied to every generate-content call.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatorConfig {
    /// Sent verbatim; an empty list omits `safetySettings`.
    pub safety_settings: Vec<SafetySetting>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        let block_none = |category: HarmCategory| SafetySetting {
            category,
            threshold: HarmBlockThreshold::BlockNone,
        };
        Self {
            safety_settings: vec![
                block_none(HarmCategory::HarmCategoryHateSpeech),
                block_none(HarmCategory::HarmCategorySexuallyExplicit),
                block_none(HarmCategory::HarmCategoryDangerousContent),
                block_none(HarmCategory::HarmCategoryHarassment),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransformedMessages {
    pub contents: Vec<GeminiContent>,
    pub system_instruction: Option<GeminiContent>,
}

/// Split the conversation into Gemini contents and a system instruction.
///
/// Only the last system message survives. Any role other than system, user or assistant
/// fails the whole request.
pub async fn transform_messages(
    messages: &[ChatCompletionRequestMessage],
    relay: &dyn RelayClient,
) -> GatewayResult<TransformedMessages> {
    let mut contents = Vec::with_capacity(messages.len());
    let mut system_instruction = None;

    for message in messages {
        let role = match message.role.as_str() {
            "system" => {
                let parts = transform_content(message.content.as_ref(), relay).await?;
                system_instruction = Some(GeminiContent { parts, role: None });
                continue;
            }
            "assistant" => GeminiContentRole::Model,
            "user" => GeminiContentRole::User,
            other => {
                return Err(GatewayError::invalid_input(format!("Unknown role: {other}")));
            }
        };
        let parts = transform_content(message.content.as_ref(), relay).await?;
        contents.push(GeminiContent {
            parts,
            role: Some(role),
        });
    }

    Ok(TransformedMessages {
        contents,
        system_instruction,
    })
}

/// Copy the sampling parameters Gemini understands; everything else is dropped.
pub fn transform_config(body: &CreateChatCompletionRequestBody) -> GenerationConfig {
    GenerationConfig {
        stop_sequences: body.stop.as_ref().map(|stop| stop.to_vec()),
        response_mime_type: body
            .response_format
            .as_ref()
            .filter(|format| format.kind == "json_object")
            .map(|_| "application/json".to_string()),
        candidate_count: body.n,
        max_output_tokens: body.max_tokens,
        temperature: body.temperature,
        top_p: body.top_p,
        top_k: body.top_k,
        seed: body.seed,
        presence_penalty: body.presence_penalty,
        frequency_penalty: body.frequency_penalty,
    }
}

/// Convert an OpenAI chat-completions body into a Gemini generate-content request.
///
/// Remote images are fetched through `relay` while the messages are converted.
pub async fn transform_request(
    body: &CreateChatCompletionRequestBody,
    config: &TranslatorConfig,
    relay: &dyn RelayClient,
) -> GatewayResult<GeminiGenerateContentRequest> {
    let model = resolve_model_id(body.model.as_deref(), DEFAULT_CHAT_MODEL);
    let TransformedMessages {
        contents,
        system_instruction,
    } = transform_messages(&body.messages, relay).await?;

    let safety_settings = if config.safety_settings.is_empty() {
        None
    } else {
        Some(config.safety_settings.clone())
    };

    Ok(GeminiGenerateContentRequest {
        path: GeminiGenerateContentPath { model },
        body: GeminiGenerateContentRequestBody {
            contents,
            system_instruction,
            safety_settings,
            generation_config: Some(transform_config(body)),
            tools: transform_tools(body),
        },
    })
}
