//! Axum-based HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::post;
use axum::Router;
use custody_wallet_core::Ledger;
use tracing::info;

use crate::handlers::{self, AppState};

pub struct RpcServer<L> {
    pub listen: SocketAddr,
    pub state: Arc<AppState<L>>,
}

impl<L: Ledger + 'static> RpcServer<L> {
    pub fn new(listen: SocketAddr, state: AppState<L>) -> Self {
        Self {
            listen,
            state: Arc::new(state),
        }
    }

    /// The API routes, bound to this server's state.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/login", post(handlers::login::<L>))
            .route("/api/withdraw", post(handlers::withdraw::<L>))
            .with_state(self.state.clone())
    }

    /// Serve until the process is stopped.
    pub async fn start(&self) -> std::io::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen).await?;
        info!(addr = %listener.local_addr()?, "HTTP API listening");
        axum::serve(listener, self.router()).await
    }
}
