/*
[INPUT]:  None
[OUTPUT]: API health payload
[POS]:    HTTP layer - public endpoints (no auth required)
[UPDATE]: When adding new public endpoints or changing response format
*/

use reqwest::Method;
use serde_json::Value;

use crate::http::query::Query;
use crate::http::{FinanceFeastClient, Result};

pub const ALIVE_PATH: &str = "health/alive";

impl FinanceFeastClient {
    /// Health of the API
    ///
    /// GET /health/alive
    pub async fn alive(&self) -> Result<Option<Value>> {
        self.request(Method::GET, ALIVE_PATH, &Query::new(), false)
            .await
    }
}
