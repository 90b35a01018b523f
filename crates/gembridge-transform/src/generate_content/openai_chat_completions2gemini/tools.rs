use gembridge_protocol::gemini::generate_content::types::{
    FunctionDeclaration, GoogleSearch, Tool as GeminiTool,
};
use gembridge_protocol::gemini::types::JsonValue;
use gembridge_protocol::openai::create_chat_completions::request::CreateChatCompletionRequestBody;

/// Schema keywords Gemini rejects in function parameters.
pub const UNSUPPORTED_SCHEMA_KEYS: [&str; 3] = ["$schema", "additionalProperties", "strict"];

/// Remove [`UNSUPPORTED_SCHEMA_KEYS`] at every depth, including inside arrays.
pub fn sanitize_schema(value: &mut JsonValue) {
    match value {
        JsonValue::Object(map) => {
            for key in UNSUPPORTED_SCHEMA_KEYS {
                map.remove(key);
            }
            for child in map.values_mut() {
                sanitize_schema(child);
            }
        }
        JsonValue::Array(items) => {
            for item in items {
                sanitize_schema(item);
            }
        }
        _ => {}
    }
}

/// Build the Gemini tool list: one block with every function declaration, then a search
/// block when grounding was asked for.
pub fn transform_tools(body: &CreateChatCompletionRequestBody) -> Option<Vec<GeminiTool>> {
    let declarations: Vec<FunctionDeclaration> = body
        .tools
        .iter()
        .flatten()
        .filter(|tool| tool.kind == "function")
        .filter_map(|tool| tool.function.as_ref())
        .map(|function| FunctionDeclaration {
            name: function.name.clone(),
            description: function.description.clone(),
            parameters: function.parameters.clone().map(|mut schema| {
                sanitize_schema(&mut schema);
                schema
            }),
        })
        .collect();

    let mut tools = Vec::new();
    if !declarations.is_empty() {
        tools.push(GeminiTool {
            function_declarations: Some(declarations),
            ..GeminiTool::default()
        });
    }
    if body.use_grounding == Some(true) {
        tools.push(GeminiTool {
            google_search: Some(GoogleSearch::default()),
            ..GeminiTool::default()
        });
    }

    if tools.is_empty() { None } else { Some(tools) }
}
