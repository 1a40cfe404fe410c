pub mod body;
pub mod redirect;
pub mod requestbody;
pub mod response;
pub mod responsebody;
pub mod retry;

// Re-exports for convenience
pub use requestbody::RequestBody;
pub use response::{RequestInfo, Response};
pub use responsebody::ResponseBody;
