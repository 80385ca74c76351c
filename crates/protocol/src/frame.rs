use {
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

use crate::error::RouteError;

// ── Identity ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

/// Caller identity, self-declared on each request. The gateway issues no
/// session token at login; each privileged request carries this again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub email: String,
    pub role: Role,
}

// ── Request / response frames ────────────────────────────────────────────────

/// One inbound request line: `{route, method, body?, user?}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestFrame {
    pub route: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Identity>,
}

impl RequestFrame {
    /// Decode one frame from a line. Any malformed line is a recoverable
    /// protocol error answered with 400; the connection stays open.
    pub fn decode(line: &str) -> Result<Self, RouteError> {
        serde_json::from_str(line).map_err(|_| RouteError::invalid_frame())
    }
}

/// One outbound reply line: `{status, data?, error?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFrame {
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResponseFrame {
    pub fn ok(data: Value) -> Self {
        Self {
            status: crate::status::OK,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Serialize to a single wire line (without the trailing delimiter).
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl From<RouteError> for ResponseFrame {
    fn from(err: RouteError) -> Self {
        Self::err(err.status(), err.to_string())
    }
}

// ── Domain payloads ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: u64,
    pub name: String,
    pub price: f64,
}

// ── Broadcast events ─────────────────────────────────────────────────────────

/// Server-push frames fanned out to connected clients, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Event {
    /// New open-connection count, sent to everyone on connect/disconnect.
    UserCount { count: usize },
    /// New viewer count for one product, sent on view and on disconnect.
    #[serde(rename_all = "camelCase")]
    ProductViewCount { product_id: u64, count: usize },
    /// A chat message, sent to everyone.
    Chat {
        user: String,
        message: String,
        ts: DateTime<Utc>,
    },
}

impl Event {
    /// Serialize to a single wire line (without the trailing delimiter).
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn decodes_minimal_request() {
        let req = RequestFrame::decode(r#"{"route":"/products","method":"GET"}"#).unwrap();
        assert_eq!(req.route, "/products");
        assert_eq!(req.method, "GET");
        assert!(req.body.is_none());
        assert!(req.user.is_none());
    }

    #[test]
    fn decodes_identity() {
        let req = RequestFrame::decode(
            r#"{"route":"/chat","method":"POST","body":{"message":"hi"},"user":{"email":"a@b.c","role":"admin"}}"#,
        )
        .unwrap();
        let user = req.user.unwrap();
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.email, "a@b.c");
    }

    #[test]
    fn rejects_malformed_line() {
        let err = RequestFrame::decode("not json").unwrap_err();
        assert_eq!(err.status(), crate::status::BAD_REQUEST);
        assert_eq!(err.to_string(), "Invalid JSON");
    }

    #[test]
    fn response_omits_empty_fields() {
        let line = ResponseFrame::ok(serde_json::json!({"connections": 2})).to_line();
        assert_eq!(line, r#"{"status":200,"data":{"connections":2}}"#);

        let line = ResponseFrame::err(404, "Not Found").to_line();
        assert_eq!(line, r#"{"status":404,"error":"Not Found"}"#);
    }

    #[test]
    fn events_are_tagged() {
        let line = Event::UserCount { count: 3 }.to_line();
        assert_eq!(line, r#"{"type":"userCount","count":3}"#);

        let line = Event::ProductViewCount {
            product_id: 1,
            count: 2,
        }
        .to_line();
        assert_eq!(line, r#"{"type":"productViewCount","productId":1,"count":2}"#);
    }
}
