/*
[INPUT]:  Client credentials, stream environment
[OUTPUT]: Real-time trade messages printed to stdout
[POS]:    Examples - streaming client with a message handler
[UPDATE]: When the stream lifecycle or handler contract changes
*/

use financefeast::*;
use serde_json::Value;
use tokio::time::{Duration, sleep};

fn print_trade(_client: &StreamingClient, payload: Value) -> std::result::Result<(), HandlerError> {
    println!("trade: {}", payload);
    Ok(())
}

/// Example: stream trades for a minute, then shut down
#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let rest = match FinanceFeastClient::with_config(
        Credentials::from_env(),
        ClientConfig::for_environment(Environment::Test),
    ) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create client: {}", e);
            return;
        }
    };
    let token = match rest.authorize().await {
        Ok(token) => token,
        Err(e) => {
            eprintln!("Authorization failed: {}", e);
            return;
        }
    };

    let stream = StreamingClient::new(
        token,
        print_trade,
        StreamConfig::for_environment(Environment::Test),
    );
    let handle = stream.connect();

    sleep(Duration::from_secs(60)).await;

    stream.shutdown();
    let _ = handle.await;
    println!("✓ Stream stopped after {} reconnects", stream.reconnect_count());
}
