//! Gateway: line-framed TCP server, request dispatch, session registry,
//! broadcast fan-out.
//!
//! Lifecycle:
//! 1. Load config, resolve bind address
//! 2. Bind the TCP listener
//! 3. Accept loop: one read task + one write task per connection
//! 4. Frames are decoded and dispatched against shared in-memory state
//! 5. Mutations fan broadcasts out to all clients or a product's viewers
//!
//! All shared state (users, products, chat history, viewer sets, connection
//! registry) lives behind a single lock in [`state::GatewayState`]; every
//! mutation is one critical section, and broadcast recipients are
//! snapshotted inside it so no event ever lists a closed connection.

pub mod auth;
pub mod broadcast;
pub mod routes;
pub mod server;
pub mod state;
pub mod store;

/// Identifier assigned to a connection at accept time.
pub type ConnId = uuid::Uuid;
