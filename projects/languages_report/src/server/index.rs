use std::net::SocketAddr;

use axum::{serve, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Debug, Error)]
pub enum ServeError {
	#[error("TcpListenerBind {addr}: {source}")]
	TcpListenerBind {
		addr: SocketAddr,
		#[source]
		source: std::io::Error,
	},

	#[error("Serve: {source}")]
	Serve {
		#[source]
		source: std::io::Error,
	},
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener, ServeError> {
	let listener = TcpListener::bind(addr)
		.await
		.map_err(|source| ServeError::TcpListenerBind { addr, source })?;

	info!(
		addr = %listener.local_addr().unwrap_or(addr),
		"Listening"
	);

	Ok(listener)
}

/// Serves a router with no routes: every request gets a 404. Runs until the
/// process is stopped.
pub async fn serve_idle(listener: TcpListener) -> Result<(), ServeError> {
	serve(listener, Router::new())
		.await
		.map_err(|source| ServeError::Serve { source })
}
