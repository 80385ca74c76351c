//! Wire protocol for the tradepost gateway.
//!
//! Every frame is one line of UTF-8 JSON, delimited by `\n`. Clients send
//! [`RequestFrame`]s and receive either a direct [`ResponseFrame`] or a
//! tagged [`Event`] pushed by the server (connection count, per-product
//! viewer count, chat). Field names here are part of the contract.

pub mod error;
pub mod frame;
pub mod route;

pub use error::RouteError;
pub use frame::{Event, Identity, Product, RequestFrame, ResponseFrame, Role};
pub use route::{AuthPolicy, Route};

/// Response status codes used on the wire.
pub mod status {
    pub const OK: u16 = 200;
    pub const BAD_REQUEST: u16 = 400;
    pub const UNAUTHORIZED: u16 = 401;
    pub const FORBIDDEN: u16 = 403;
    pub const NOT_FOUND: u16 = 404;
}
