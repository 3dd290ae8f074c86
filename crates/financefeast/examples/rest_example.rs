/*
[INPUT]:  FF-CLIENT-ID / FF-CLIENT-SECRET environment variables, ticker symbol
[OUTPUT]: End-of-day data and rate-limit state
[POS]:    Examples - authenticated REST queries
[UPDATE]: When the request surface changes
*/

use financefeast::*;

/// Example: authenticated REST queries
///
/// Credentials come from `FF-CLIENT-ID` / `FF-CLIENT-SECRET`; the first
/// protected call logs in and later calls reuse the token.
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ClientConfig {
        label: Some("rest-example".to_string()),
        ..ClientConfig::for_environment(Environment::Test)
    };
    let client = match FinanceFeastClient::with_config(Credentials::from_env(), config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };

    match client.alive().await {
        Ok(status) => println!("✓ API alive: {:?}", status),
        Err(e) => println!("✗ Health check failed: {}", e),
    }

    let query = match Query::for_ticker("air.nz") {
        Ok(q) => q.opt_param("date_from", Some("2020-11-01")),
        Err(e) => {
            eprintln!("Invalid query: {}", e);
            return;
        }
    };

    match client.get_data("data/eod", &query, true).await {
        Ok(data) => println!("✓ EOD data: {}", data),
        Err(e) => println!("✗ Error: {}", e),
    }

    match client.check_authorization().await {
        Ok(valid) => println!("Token valid: {}", valid),
        Err(e) => println!("✗ Validation failed: {}", e),
    }

    println!("Rate limit: {:?}", client.rate_limit());
}
