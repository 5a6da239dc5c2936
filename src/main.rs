use friendgraph::{api::Server, config::Config, graph::GraphStore};
use tracing::info;

/// The main entry point for the friendgraph server.
///
/// Initializes logging, loads the application configuration, seeds the
/// in-memory relationship graph with the demo fixture, and starts the API
/// server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging using tracing_subscriber.
    tracing_subscriber::fmt::init();

    // Load the application configuration from the specified TOML file.
    let config = Config::load("config/default.toml")?;
    info!("Server starting with config: {:?}", config);

    // The shared data source: an explicit object handed to the server,
    // never global state.
    let store = GraphStore::seeded();

    // Start the API server; this binds to the configured address and
    // serves requests until shutdown.
    let server = Server::new(config, store);
    server.start().await?;

    Ok(())
}
