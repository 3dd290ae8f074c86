/*
[INPUT]:  Typed endpoint parameters
[OUTPUT]: Ordered query-string pairs
[POS]:    HTTP layer - query building shared by endpoint callers
[UPDATE]: When parameter encoding rules change
*/

use crate::http::{FinanceFeastError, Result};

/// Ordered query parameters. Repeated keys are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a query for an endpoint that requires `ticker`
    pub fn for_ticker(ticker: &str) -> Result<Self> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(FinanceFeastError::MissingTicker);
        }
        Ok(Self::new().param("ticker", ticker))
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    /// Add `key` only when a value is present
    pub fn opt_param<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    /// Add `key` once per value, e.g. `window=10&window=30`
    pub fn list_param<V: ToString>(mut self, key: &str, values: &[V]) -> Self {
        for value in values {
            self.pairs.push((key.to_string(), value.to_string()));
        }
        self
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_ticker_requires_value() {
        assert!(matches!(
            Query::for_ticker("  "),
            Err(FinanceFeastError::MissingTicker)
        ));
        let query = Query::for_ticker("air.nz").unwrap();
        assert_eq!(query.get("ticker"), Some("air.nz"));
    }

    #[test]
    fn test_optional_params_skipped() {
        let query = Query::for_ticker("air.nz")
            .unwrap()
            .opt_param("date_from", Some("2020-11-01"))
            .opt_param::<&str>("date_to", None)
            .param("exchange", "nzx");

        assert_eq!(
            query.pairs(),
            &[
                ("ticker".to_string(), "air.nz".to_string()),
                ("date_from".to_string(), "2020-11-01".to_string()),
                ("exchange".to_string(), "nzx".to_string()),
            ]
        );
        assert_eq!(query.get("date_to"), None);
    }

    #[test]
    fn test_list_param_repeats_key() {
        let query = Query::new().list_param("window", &[10, 30]);
        assert_eq!(query.pairs().len(), 2);
        assert!(query.pairs().iter().all(|(k, _)| k == "window"));
    }
}
