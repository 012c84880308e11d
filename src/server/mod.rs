use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::data::data_registry::DataRegistry;

pub mod api;
pub mod routes;

/// Bind `bind_addr` and serve until the process is stopped.
pub fn run_server(bind_addr: &str, registry: Arc<DataRegistry>) -> std::io::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(bind_and_serve(bind_addr, registry))
}

async fn bind_and_serve(bind_addr: &str, registry: Arc<DataRegistry>) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    serve(listener, registry).await
}

pub async fn serve(listener: TcpListener, registry: Arc<DataRegistry>) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(
        "pincode-lookup listening on http://{addr}{}",
        routes::api_endpoint()
    );
    axum::serve(listener, routes::build_router(registry)).await
}
