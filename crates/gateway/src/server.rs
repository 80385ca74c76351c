use std::{net::SocketAddr, sync::Arc, time::Instant};

use {
    futures::{SinkExt, StreamExt},
    tokio::{
        net::{TcpListener, TcpStream},
        sync::mpsc,
    },
    tokio_util::codec::{Framed, LinesCodec},
    tracing::{debug, info, warn},
    tradepost_protocol::{Event, RequestFrame},
};

use crate::{
    ConnId, broadcast,
    routes::{self, Outcome},
    state::{ConnectedClient, GatewayState},
};

// ── Server startup ───────────────────────────────────────────────────────────

/// Load config, bind, and run the gateway until the process exits.
/// CLI flags take precedence over the config file.
pub async fn start_gateway(bind: Option<String>, port: Option<u16>) -> anyhow::Result<()> {
    let config = tradepost_config::discover_and_load();
    let bind = bind.unwrap_or(config.gateway.bind);
    let port = port.unwrap_or(config.gateway.port);

    let state = GatewayState::new(config.gateway.admin_email);

    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    let listener = TcpListener::bind(addr).await?;

    info!(version = %state.version, %addr, "tradepost gateway listening");
    if let Some(origin) = &config.gateway.allowed_origin {
        // Consumed by the external HTTP layer, surfaced here for operators.
        info!(%origin, "allowed origin configured");
    }

    serve(listener, state).await
}

/// Accept loop (shared between production startup and tests): one task per
/// connection.
pub async fn serve(listener: TcpListener, state: Arc<GatewayState>) -> anyhow::Result<()> {
    loop {
        let (stream, addr) = listener.accept().await?;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            handle_connection(stream, addr, state).await;
        });
    }
}

// ── Per-connection loops ─────────────────────────────────────────────────────

/// Serve one connection: register it, pump inbound frames through the
/// dispatcher, and tear it down on EOF or error. Teardown releases the
/// connection from the registry and every viewer set before the resulting
/// broadcasts are computed, and is idempotent.
async fn handle_connection(stream: TcpStream, addr: SocketAddr, state: Arc<GatewayState>) {
    let framed = Framed::new(stream, LinesCodec::new());
    let (mut sink, mut lines) = framed.split();

    let conn_id = ConnId::new_v4();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // Write loop: everything for this client (replies and broadcasts) goes
    // through one queue, so per-client ordering holds.
    let writer = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if sink.send(line).await.is_err() {
                break;
            }
        }
    });

    info!(%conn_id, %addr, "client connected");
    let (count, recipients) = state
        .register_client(ConnectedClient {
            conn_id,
            sender: tx,
            connected_at: Instant::now(),
        })
        .await;
    broadcast::deliver(&recipients, &Event::UserCount { count });

    // Read loop. A malformed line is answered 400 and the connection keeps
    // serving; only transport errors or EOF end it.
    while let Some(result) = lines.next().await {
        let line = match result {
            Ok(line) => line,
            Err(e) => {
                debug!(%conn_id, error = %e, "read error");
                break;
            },
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let outcome = match RequestFrame::decode(line) {
            Ok(frame) => routes::dispatch(&state, conn_id, frame).await,
            Err(err) => {
                warn!(%conn_id, "undecodable frame");
                Outcome::Reply(err.into())
            },
        };

        if let Outcome::Reply(resp) = outcome
            && !state.send_to(conn_id, &resp.to_line()).await
        {
            break;
        }
    }

    if let Some(teardown) = state.remove_client(conn_id).await {
        info!(%conn_id, count = teardown.count, "client disconnected");
        broadcast::deliver(&teardown.recipients, &Event::UserCount {
            count: teardown.count,
        });
        for update in teardown.viewer_updates {
            broadcast::deliver(&update.recipients, &Event::ProductViewCount {
                product_id: update.product_id,
                count: update.count,
            });
        }
    }

    // The registry held the last sender clone; the write loop drains what
    // is already queued and exits.
    let _ = writer.await;
}
