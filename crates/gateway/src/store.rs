use std::collections::{HashMap, HashSet};

use {
    chrono::{DateTime, Utc},
    serde::Serialize,
    thiserror::Error,
    tradepost_protocol::{Identity, Product, Role},
};

use crate::ConnId;

/// Visible prefix applied to chat messages authored by admins.
pub const ADMIN_CHAT_PREFIX: &str = "🔔 ADMIN: ";

// ── Records ──────────────────────────────────────────────────────────────────

/// A registered user. Immutable once created; passwords are stored and
/// compared verbatim (no hashing, matching the protocol's trust model).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// One entry of the ordered chat history, with the author prefix already
/// rendered into `message`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub user: String,
    pub message: String,
    pub ts: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("User exists")]
    DuplicateUser,
}

// ── Store ────────────────────────────────────────────────────────────────────

/// In-memory tables: users, products, chat history, and per-product viewer
/// sets. Purely synchronous; callers serialize access through the gateway
/// state lock.
#[derive(Debug)]
pub struct Store {
    users: HashMap<String, User>,
    products: Vec<Product>,
    chat: Vec<ChatMessage>,
    viewers: HashMap<u64, HashSet<ConnId>>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
            products: vec![Product {
                id: 1,
                name: "Laptop".into(),
                price: 1000.0,
            }],
            chat: Vec::new(),
            viewers: HashMap::new(),
        }
    }

    // ── Users ────────────────────────────────────────────────────────────

    pub fn find_user(&self, email: &str) -> Option<&User> {
        self.users.get(email)
    }

    /// Create a user. Fails if the email is already taken; the caller
    /// derives the role, never the client.
    pub fn create_user(
        &mut self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<&User, StoreError> {
        if self.users.contains_key(email) {
            return Err(StoreError::DuplicateUser);
        }
        Ok(self.users.entry(email.to_string()).or_insert(User {
            email: email.to_string(),
            password: password.to_string(),
            role,
        }))
    }

    /// Verbatim email + password comparison.
    pub fn verify_credentials(&self, email: &str, password: &str) -> Option<&User> {
        self.users.get(email).filter(|u| u.password == password)
    }

    // ── Products ─────────────────────────────────────────────────────────

    pub fn list_products(&self) -> &[Product] {
        &self.products
    }

    pub fn add_product(&mut self, product: Product) {
        self.products.push(product);
    }

    // ── Chat ─────────────────────────────────────────────────────────────

    /// Append one message, rendering the admin prefix into the stored text.
    pub fn append_chat(&mut self, author: &Identity, text: &str) -> ChatMessage {
        let message = if author.role.is_admin() {
            format!("{ADMIN_CHAT_PREFIX}{text}")
        } else {
            text.to_string()
        };
        let msg = ChatMessage {
            user: author.email.clone(),
            message,
            ts: Utc::now(),
        };
        self.chat.push(msg.clone());
        msg
    }

    pub fn chat_history(&self) -> &[ChatMessage] {
        &self.chat
    }

    // ── Viewer sets ──────────────────────────────────────────────────────

    /// Add a connection to a product's viewer set; returns the new count.
    pub fn add_viewer(&mut self, product_id: u64, conn: ConnId) -> usize {
        let set = self.viewers.entry(product_id).or_default();
        set.insert(conn);
        set.len()
    }

    /// Remove a connection from one product's viewer set; returns the new
    /// count. Removing an absent viewer is a no-op.
    pub fn remove_viewer(&mut self, product_id: u64, conn: ConnId) -> usize {
        match self.viewers.get_mut(&product_id) {
            Some(set) => {
                set.remove(&conn);
                set.len()
            },
            None => 0,
        }
    }

    pub fn viewer_count(&self, product_id: u64) -> usize {
        self.viewers.get(&product_id).map_or(0, HashSet::len)
    }

    pub fn viewers(&self, product_id: u64) -> Option<&HashSet<ConnId>> {
        self.viewers.get(&product_id)
    }

    /// Drop a closing connection from every viewer set it belonged to.
    /// Returns `(product_id, new_count)` for each affected product.
    pub fn remove_conn_from_all(&mut self, conn: ConnId) -> Vec<(u64, usize)> {
        let mut affected = Vec::new();
        for (product_id, set) in &mut self.viewers {
            if set.remove(&conn) {
                affected.push((*product_id, set.len()));
            }
        }
        affected
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn admin() -> Identity {
        Identity {
            email: "admin@example.com".into(),
            role: Role::Admin,
        }
    }

    fn user(email: &str) -> Identity {
        Identity {
            email: email.into(),
            role: Role::User,
        }
    }

    #[test]
    fn seeds_one_product() {
        let store = Store::new();
        assert_eq!(store.list_products().len(), 1);
        assert_eq!(store.list_products()[0].name, "Laptop");
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let mut store = Store::new();
        store.create_user("a@b.c", "pw", Role::User).unwrap();
        assert_eq!(
            store.create_user("a@b.c", "other", Role::Admin),
            Err(StoreError::DuplicateUser)
        );
        // The original record is untouched.
        assert_eq!(store.find_user("a@b.c").unwrap().password, "pw");
    }

    #[test]
    fn credentials_are_compared_verbatim() {
        let mut store = Store::new();
        store.create_user("a@b.c", "pw", Role::User).unwrap();
        assert!(store.verify_credentials("a@b.c", "pw").is_some());
        assert!(store.verify_credentials("a@b.c", "PW").is_none());
        assert!(store.verify_credentials("a@b.c", "").is_none());
        assert!(store.verify_credentials("nobody@b.c", "pw").is_none());
    }

    #[test]
    fn chat_appends_in_order_with_admin_prefix() {
        let mut store = Store::new();
        store.append_chat(&user("u1@b.c"), "one");
        store.append_chat(&admin(), "two");
        store.append_chat(&user("u2@b.c"), "three");

        let history = store.chat_history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].message, "one");
        assert_eq!(history[1].message, format!("{ADMIN_CHAT_PREFIX}two"));
        assert_eq!(history[1].user, "admin@example.com");
        assert_eq!(history[2].message, "three");
    }

    #[test]
    fn viewer_sets_track_membership() {
        let mut store = Store::new();
        let a = ConnId::new_v4();
        let b = ConnId::new_v4();

        assert_eq!(store.add_viewer(1, a), 1);
        assert_eq!(store.add_viewer(1, b), 2);
        // Re-adding is idempotent.
        assert_eq!(store.add_viewer(1, a), 2);
        assert_eq!(store.add_viewer(7, a), 1);

        assert_eq!(store.remove_viewer(1, a), 1);
        assert_eq!(store.remove_viewer(99, a), 0);
        assert_eq!(store.viewer_count(1), 1);
    }

    #[test]
    fn closing_conn_leaves_every_set() {
        let mut store = Store::new();
        let a = ConnId::new_v4();
        let b = ConnId::new_v4();
        store.add_viewer(1, a);
        store.add_viewer(1, b);
        store.add_viewer(2, a);

        let mut affected = store.remove_conn_from_all(a);
        affected.sort_unstable();
        assert_eq!(affected, vec![(1, 1), (2, 0)]);
        assert!(store.remove_conn_from_all(a).is_empty());
    }
}
