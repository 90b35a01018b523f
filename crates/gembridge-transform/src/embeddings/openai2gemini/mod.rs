pub mod request;
pub mod response;

pub use request::transform_request;
pub use response::transform_response;
