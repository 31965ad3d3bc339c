use std::net::SocketAddr;

use crate::{create_router, SharedState};

/// Initialize tracing before anything else logs.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ledgerly_backend=debug,tower_http=debug,axum=trace".into()),
        )
        .init();
}

/// Run the API server.
pub async fn run_server(state: SharedState, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("{}:{}", host, port).parse::<SocketAddr>()?;
    tracing::info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
