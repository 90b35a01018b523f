use gembridge_common::{GatewayError, GatewayResult};
use http::Method;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ChatCompletions,
    ListModels,
    Embeddings,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::ChatCompletions => "openai.chat",
            Operation::ListModels => "openai.models_list",
            Operation::Embeddings => "openai.embeddings",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Route {
    pub suffix: &'static str,
    pub method: Method,
    pub op: Operation,
}

/// Checked in order; the first suffix that matches decides the route.
pub static ROUTES: [Route; 3] = [
    Route {
        suffix: "/chat/completions",
        method: Method::POST,
        op: Operation::ChatCompletions,
    },
    Route {
        suffix: "/models",
        method: Method::GET,
        op: Operation::ListModels,
    },
    Route {
        suffix: "/embeddings",
        method: Method::POST,
        op: Operation::Embeddings,
    },
];

/// Match a request path against [`ROUTES`] by suffix, so any prefix such as `/v1` works.
pub fn classify_request(method: &Method, path: &str) -> GatewayResult<Operation> {
    let route = ROUTES
        .iter()
        .find(|route| path.ends_with(route.suffix))
        .ok_or(GatewayError::NotFound)?;
    ensure_method(method, &route.method)?;
    Ok(route.op)
}

pub fn parse_json<T>(body: &[u8]) -> GatewayResult<T>
where
    T: DeserializeOwned,
{
    serde_json::from_slice(body)
        .map_err(|err| GatewayError::invalid_input(format!("invalid json: {err}")))
}

fn ensure_method(method: &Method, expected: &Method) -> GatewayResult<()> {
    if method == expected {
        Ok(())
    } else {
        Err(GatewayError::MethodNotAllowed)
    }
}
