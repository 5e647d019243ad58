//! Line server entry point.

use catline::config::ServerConfig;
use catline::server::Server;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig::load()?;
    catline::init_logging(&config.log_level);

    info!(
        file = %config.file.display(),
        host = %config.host,
        port = config.port,
        "Starting catserver"
    );

    let server = Server::bind(&config).await?;
    server.run().await?;
    Ok(())
}
