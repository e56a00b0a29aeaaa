pub mod api;
pub mod error;
pub mod http;
pub mod memory;

pub use api::{Operation, ResourceApi};
pub use error::{ApiError, NETWORK_FAILURE_MESSAGE};
pub use http::{HttpClientConfig, HttpResourceClient};
pub use memory::InMemoryResourceApi;
