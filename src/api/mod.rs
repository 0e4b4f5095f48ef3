pub mod http;
pub mod traits;
pub mod types;

pub use http::HttpBackend;
pub use traits::ChatBackend;
pub use types::{ApiError, Profile, QueryRequest, QueryResponse};
