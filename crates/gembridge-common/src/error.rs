use http::StatusCode;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Every failure the gateway can report to a caller. Each variant carries its HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("Unauthorized: Missing or invalid X-Master-Key for proxy.")]
    Unauthorized,
    #[error("The specified HTTP method is not allowed for the requested resource")]
    MethodNotAllowed,
    #[error("{0}")]
    InvalidInput(String),
    #[error("Not Found: The requested endpoint does not exist.")]
    NotFound,
    /// `status` mirrors the upstream, or is 502 when the relay could not be reached.
    #[error("{message}")]
    UpstreamFetch { status: StatusCode, message: String },
    #[error("{0}")]
    Configuration(String),
}

impl GatewayError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn upstream_unreachable(message: impl Into<String>) -> Self {
        Self::UpstreamFetch {
            status: StatusCode::BAD_GATEWAY,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::MethodNotAllowed | GatewayError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::UpstreamFetch { status, .. } => *status,
            GatewayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
