/*
[INPUT]:  Response headers
[OUTPUT]: RateLimit triple (limit, remaining, reset)
[POS]:    HTTP layer - quota introspection captured on every response
[UPDATE]: When rate-limit header names or formats change
*/

use reqwest::header::HeaderMap;
use tracing::debug;

use crate::types::RateLimit;

pub const RATE_LIMIT_LIMIT_HEADER: &str = "x-ratelimit-limit";
pub const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// Read the rate-limit headers. Missing or malformed values become `None`.
pub fn parse_rate_limit(headers: &HeaderMap) -> RateLimit {
    let limit = header_str(headers, RATE_LIMIT_LIMIT_HEADER)
        .and_then(|value| parse_count(RATE_LIMIT_LIMIT_HEADER, value));
    if let Some(limit) = limit {
        debug!(limit, "rate limit");
    }

    let remaining = header_str(headers, RATE_LIMIT_REMAINING_HEADER)
        .and_then(|value| parse_count(RATE_LIMIT_REMAINING_HEADER, value));
    if let Some(remaining) = remaining {
        debug!(remaining, "rate limit remaining");
    }

    let reset = header_str(headers, RATE_LIMIT_RESET_HEADER).map(str::to_string);
    if let Some(reset) = &reset {
        debug!(reset = %reset, "rate limit reset");
    }

    RateLimit {
        limit,
        remaining,
        reset,
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let value = headers.get(name).and_then(|value| value.to_str().ok());
    if value.is_none() {
        debug!(header = name, "no rate limit header found");
    }
    value.map(str::trim)
}

fn parse_count(name: &str, value: &str) -> Option<u64> {
    match value.parse::<u64>() {
        Ok(count) => Some(count),
        Err(err) => {
            debug!(header = name, value, error = %err, "unparsable rate limit header");
            None
        }
    }
}
