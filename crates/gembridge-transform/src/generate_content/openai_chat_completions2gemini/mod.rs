pub mod content;
pub mod request;
pub mod response;
pub mod tools;

pub use request::{TranslatorConfig, transform_config, transform_messages, transform_request};
pub use response::transform_response;
