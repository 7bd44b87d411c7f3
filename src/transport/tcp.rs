//! TCP listener boundary.
//!
//! The accept loop is deliberately thin: one task per accepted connection,
//! unbounded, each handed straight to [`Session::open`]. Everything
//! protocol-shaped lives below the session layer.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::ProtocolConfig;
use crate::error::Result;
use crate::protocol::diagnostics::OpcodeTable;
use crate::protocol::session::{Session, SessionDelegate};

/// Bind `addr` and serve until CTRL+C.
pub async fn serve(
    addr: &str,
    config: Arc<ProtocolConfig>,
    delegate: Arc<dyn SessionDelegate>,
    diagnostics: Arc<OpcodeTable>,
) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);

    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            info!("Received CTRL+C signal, shutting down");
            let _ = shutdown_tx.send(()).await;
        }
    });

    let listener = TcpListener::bind(addr).await?;
    serve_with_shutdown(listener, config, delegate, diagnostics, shutdown_rx).await
}

/// Accept loop over a pre-bound listener with an external shutdown channel.
pub async fn serve_with_shutdown(
    listener: TcpListener,
    config: Arc<ProtocolConfig>,
    delegate: Arc<dyn SessionDelegate>,
    diagnostics: Arc<OpcodeTable>,
    mut shutdown_rx: mpsc::Receiver<()>,
) -> Result<()> {
    config.validate()?;
    info!(addr = %listener.local_addr()?, "listener started");

    let mut next_id: u32 = 0;
    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("listener shutting down");
                return Ok(());
            }

            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        info!(peer = %peer, "client connected");
                        let id = next_id;
                        next_id = next_id.wrapping_add(1);
                        let open = Session::open(
                            stream,
                            id,
                            config.clone(),
                            delegate.clone(),
                            diagnostics.clone(),
                        )
                        .await;
                        if let Err(e) = open {
                            warn!(id, error = %e, "failed to open session");
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "failed to accept connection");
                    }
                }
            }
        }
    }
}
