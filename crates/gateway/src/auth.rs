use tradepost_protocol::{AuthPolicy, Identity, Role, RouteError};

/// Role assignment at registration: one reserved email maps to admin, every
/// other email maps to user. Client-supplied roles are never consulted here.
pub fn derive_role(email: &str, admin_email: &str) -> Role {
    if email == admin_email {
        Role::Admin
    } else {
        Role::User
    }
}

/// Check a route's policy against the declared identity.
///
/// Runs before any state mutation; a denied request has no side effect.
/// Identity is client-declared per request — the gateway issues no session
/// token and trusts the caller's `user` field.
pub fn authorize(policy: AuthPolicy, identity: Option<&Identity>) -> Result<(), RouteError> {
    match policy {
        AuthPolicy::Open => Ok(()),
        AuthPolicy::Authenticated => {
            if identity.is_some() {
                Ok(())
            } else {
                Err(RouteError::Auth("Unauthorized".into()))
            }
        },
        AuthPolicy::AdminOnly => match identity {
            None => Err(RouteError::Auth("Unauthorized".into())),
            Some(id) if id.role.is_admin() => Ok(()),
            Some(_) => Err(RouteError::Forbidden("Unauthorized".into())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            email: "someone@shop.test".into(),
            role,
        }
    }

    #[test]
    fn reserved_email_is_admin() {
        assert_eq!(
            derive_role("admin@example.com", "admin@example.com"),
            Role::Admin
        );
        assert_eq!(derive_role("user@example.com", "admin@example.com"), Role::User);
        // Case sensitive, like the email key itself.
        assert_eq!(derive_role("Admin@example.com", "admin@example.com"), Role::User);
    }

    #[test]
    fn open_routes_need_no_identity() {
        assert!(authorize(AuthPolicy::Open, None).is_ok());
        assert!(authorize(AuthPolicy::Open, Some(&identity(Role::User))).is_ok());
    }

    #[test]
    fn authenticated_requires_any_identity() {
        let err = authorize(AuthPolicy::Authenticated, None).unwrap_err();
        assert_eq!(err.status(), 401);
        assert!(authorize(AuthPolicy::Authenticated, Some(&identity(Role::User))).is_ok());
    }

    #[test]
    fn admin_only_distinguishes_401_from_403() {
        let err = authorize(AuthPolicy::AdminOnly, None).unwrap_err();
        assert_eq!(err.status(), 401);

        let err = authorize(AuthPolicy::AdminOnly, Some(&identity(Role::User))).unwrap_err();
        assert_eq!(err.status(), 403);

        assert!(authorize(AuthPolicy::AdminOnly, Some(&identity(Role::Admin))).is_ok());
    }
}
