use thiserror::Error;

use crate::status;

/// Errors a request can produce, each mapping to a wire status.
///
/// None of these are fatal to the connection, let alone the process: the
/// frame is answered and the stream keeps serving subsequent requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// Malformed frame or body (400).
    #[error("{0}")]
    Protocol(String),
    /// Missing or invalid credentials (401).
    #[error("{0}")]
    Auth(String),
    /// Authenticated but wrong role (403).
    #[error("{0}")]
    Forbidden(String),
    /// Duplicate registration (400).
    #[error("{0}")]
    Conflict(String),
    /// Unknown (route, method) pair (404).
    #[error("Not Found")]
    NotFound,
}

impl RouteError {
    /// The canonical undecodable-frame error.
    pub fn invalid_frame() -> Self {
        Self::Protocol("Invalid JSON".into())
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::Protocol(_) | Self::Conflict(_) => status::BAD_REQUEST,
            Self::Auth(_) => status::UNAUTHORIZED,
            Self::Forbidden(_) => status::FORBIDDEN,
            Self::NotFound => status::NOT_FOUND,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_taxonomy() {
        assert_eq!(RouteError::invalid_frame().status(), 400);
        assert_eq!(RouteError::Conflict("User exists".into()).status(), 400);
        assert_eq!(RouteError::Auth("Unauthorized".into()).status(), 401);
        assert_eq!(RouteError::Forbidden("Forbidden".into()).status(), 403);
        assert_eq!(RouteError::NotFound.status(), 404);
    }
}
