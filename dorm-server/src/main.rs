use dorm_server::{Config, Server, ServerState, setup_environment};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment (dotenv, logging)
    setup_environment().map_err(|e| anyhow::anyhow!("{e}"))?;

    tracing::info!("Dorm server starting...");

    // 2. Configuration
    let config = Config::from_env();

    // 3. State (work dir, database, services)
    let state = ServerState::initialize(&config).await;

    // 4. HTTP server
    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {e}");
        return Err(anyhow::anyhow!("{e}"));
    }

    Ok(())
}
