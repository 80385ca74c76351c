/// Authorization a route demands before its handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPolicy {
    /// No identity required.
    Open,
    /// Any declared identity.
    Authenticated,
    /// Declared identity with the admin role.
    AdminOnly,
}

/// The closed set of known routes. Anything else resolves to `None` and is
/// answered 404.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Register,
    Login,
    ListProducts,
    AddProduct,
    PostChat,
    ConnectionCount,
    ViewProduct,
}

impl Route {
    /// Resolve an exact (route, method) pair. `/viewProduct` is
    /// message-style: the method string is not part of the match.
    pub fn resolve(route: &str, method: &str) -> Option<Self> {
        match (route, method) {
            ("/register", "POST") => Some(Self::Register),
            ("/login", "POST") => Some(Self::Login),
            ("/products", "GET") => Some(Self::ListProducts),
            ("/products", "POST") => Some(Self::AddProduct),
            ("/chat", "POST") => Some(Self::PostChat),
            ("/connections", "GET") => Some(Self::ConnectionCount),
            ("/viewProduct", _) => Some(Self::ViewProduct),
            _ => None,
        }
    }

    pub fn policy(self) -> AuthPolicy {
        match self {
            Self::Register | Self::Login | Self::ListProducts | Self::ConnectionCount
            | Self::ViewProduct => AuthPolicy::Open,
            Self::PostChat => AuthPolicy::Authenticated,
            Self::AddProduct => AuthPolicy::AdminOnly,
        }
    }

    /// Fire-and-forget routes push broadcasts instead of replying to the
    /// caller on success. Their failure paths still reply directly.
    pub fn is_fire_and_forget(self) -> bool {
        matches!(self, Self::PostChat | Self::ViewProduct)
    }
}
