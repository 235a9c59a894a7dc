//! In-process HTTP server for transport and end-to-end tests.

use axum::Router;
use std::net::SocketAddr;
use tokio::sync::oneshot;

/// Serve `app` on an ephemeral local port until the returned sender is dropped.
pub async fn spawn(app: Router) -> (SocketAddr, oneshot::Sender<()>) {
  let addr = SocketAddr::from(([127, 0, 0, 1], 0));
  let listener = tokio::net::TcpListener::bind(addr)
    .await
    .unwrap_or_else(|e| panic!("Failed to bind to {addr}: {e}"));
  let real_addr = listener.local_addr().unwrap();

  let (send, recv) = oneshot::channel::<()>();
  let shutdown = async move {
    let _ = recv.await;
  };

  tokio::spawn(async move {
    let _ = axum::serve(listener, app)
      .with_graceful_shutdown(shutdown)
      .await;
  });

  (real_addr, send)
}
