use std::sync::Arc;

use ledgerly_backend::ai::{OllamaClient, OllamaClientConfig};
use ledgerly_backend::{run_server, server::init_tracing, AppState, Config, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::load();

    let pool = ledgerly_backend::store::connect(&config.db_path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to open database {}: {e}", config.db_path))?;
    let store = Store::new(pool);
    store
        .init()
        .await
        .map_err(|e| anyhow::anyhow!("failed to initialize schema: {e}"))?;

    let ai = if config.ai_enabled {
        match OllamaClient::new(OllamaClientConfig::from_env()) {
            Ok(client) => {
                tracing::info!("AI assistance enabled");
                Some(client)
            }
            Err(err) => {
                tracing::warn!("AI assistance disabled: {err:#}");
                None
            }
        }
    } else {
        tracing::info!("AI assistance disabled; deterministic extraction only");
        None
    };

    let host = config.host.clone();
    let port = config.port;
    let state = Arc::new(AppState { store, config, ai });

    run_server(state, &host, port).await
}
