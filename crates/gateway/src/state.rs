use std::{sync::Arc, time::Instant};

use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard, mpsc};

use crate::{ConnId, broadcast::Recipient, store::Store};

// ── Connected client ─────────────────────────────────────────────────────────

/// A client currently connected to the gateway.
#[derive(Debug)]
pub struct ConnectedClient {
    pub conn_id: ConnId,
    /// Channel for sending serialized frames to this client's write loop.
    pub sender: mpsc::UnboundedSender<String>,
    pub connected_at: Instant,
}

impl ConnectedClient {
    /// Send one serialized line to this client. Best-effort: returns false
    /// if the write loop has gone away.
    pub fn send(&self, line: &str) -> bool {
        self.sender.send(line.to_string()).is_ok()
    }
}

// ── Shared state ─────────────────────────────────────────────────────────────

/// Everything behind the lock. Registry and store live together so the
/// connection-count and viewer-set invariants hold atomically: a closed
/// connection leaves the registry and every viewer set in one critical
/// section, before any broadcast is computed.
pub(crate) struct Inner {
    pub(crate) clients: std::collections::HashMap<ConnId, ConnectedClient>,
    pub(crate) store: Store,
}

impl Inner {
    /// Snapshot every connected client for fan-out outside the lock.
    pub(crate) fn recipients_all(&self) -> Vec<Recipient> {
        self.clients
            .values()
            .map(|c| (c.conn_id, c.sender.clone()))
            .collect()
    }

    /// Snapshot the clients currently viewing one product. Connections not
    /// present in the registry are never included.
    pub(crate) fn recipients_viewing(&self, product_id: u64) -> Vec<Recipient> {
        self.store
            .viewers(product_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.clients.get(id))
            .map(|c| (c.conn_id, c.sender.clone()))
            .collect()
    }
}

/// What a disconnect observed under the lock: the post-removal connection
/// count, the remaining clients, and one update per product the connection
/// was viewing (with that product's remaining viewers).
pub struct Teardown {
    pub count: usize,
    pub recipients: Vec<Recipient>,
    pub viewer_updates: Vec<ViewerUpdate>,
}

pub struct ViewerUpdate {
    pub product_id: u64,
    pub count: usize,
    pub recipients: Vec<Recipient>,
}

/// Shared gateway runtime state, wrapped in Arc for use across tasks.
pub struct GatewayState {
    inner: RwLock<Inner>,
    /// The one email that registers with the admin role.
    pub admin_email: String,
    pub version: String,
}

impl GatewayState {
    pub fn new(admin_email: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(Inner {
                clients: std::collections::HashMap::new(),
                store: Store::new(),
            }),
            admin_email: admin_email.into(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    pub(crate) async fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().await
    }

    pub(crate) async fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().await
    }

    /// Register a new connection. Returns the post-insert count and the
    /// recipient snapshot (including the new client) for the count
    /// broadcast.
    pub async fn register_client(&self, client: ConnectedClient) -> (usize, Vec<Recipient>) {
        let mut inner = self.inner.write().await;
        inner.clients.insert(client.conn_id, client);
        (inner.clients.len(), inner.recipients_all())
    }

    /// Remove a connection and drop it from every viewer set. Idempotent:
    /// returns None (and triggers nothing) if the id is already gone.
    pub async fn remove_client(&self, conn_id: ConnId) -> Option<Teardown> {
        let mut inner = self.inner.write().await;
        inner.clients.remove(&conn_id)?;

        let affected = inner.store.remove_conn_from_all(conn_id);
        let viewer_updates = affected
            .into_iter()
            .map(|(product_id, count)| ViewerUpdate {
                product_id,
                count,
                recipients: inner.recipients_viewing(product_id),
            })
            .collect();

        Some(Teardown {
            count: inner.clients.len(),
            recipients: inner.recipients_all(),
            viewer_updates,
        })
    }

    /// Number of open connections.
    pub async fn client_count(&self) -> usize {
        self.inner.read().await.clients.len()
    }

    /// Queue one line to a single client. Returns false if the client is
    /// gone or its write loop has stopped.
    pub async fn send_to(&self, conn_id: ConnId, line: &str) -> bool {
        let inner = self.inner.read().await;
        inner.clients.get(&conn_id).is_some_and(|c| c.send(line))
    }
}
