//! Checking client entry point.

use catline::client::Client;
use catline::config::ClientConfig;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ClientConfig::load()?;
    catline::init_logging(&config.log_level);

    info!(
        file = %config.file.display(),
        server = %config.address(),
        checks = config.iterations(),
        interval_secs = config.interval.as_secs(),
        "Starting catclient"
    );

    let client = Client::connect(&config).await?;
    client.run(&mut std::io::stderr()).await?;
    Ok(())
}
