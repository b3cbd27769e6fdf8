use mock_server::{MockConfig, MockState, DEFAULT_CONSUMER_KEY};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let consumer_key =
        std::env::var("POCKET_CONSUMER_KEY").unwrap_or_else(|_| DEFAULT_CONSUMER_KEY.to_string());
    let addr = format!("127.0.0.1:{port}");

    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "mock pocket api listening");
    let state = MockState::new(MockConfig {
        consumer_key,
        ..MockConfig::default()
    });
    mock_server::run(listener, state).await
}
