/*
[INPUT]:  HTTP client configuration and API endpoints
[OUTPUT]: HTTP responses, unwrapped payloads and typed errors
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;
pub mod public;
pub mod query;
pub mod rate_limit;
pub mod response;

pub use error::{FinanceFeastError, Result};

pub use client::{ClientConfig, FinanceFeastClient};
pub use query::Query;
pub use response::unwrap_data;
