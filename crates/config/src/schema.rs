use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TradepostConfig {
    pub gateway: GatewayConfig,
}

/// Gateway listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address to bind the TCP listener on.
    pub bind: String,

    /// Port to listen on.
    pub port: u16,

    /// The one reserved email that registers with the admin role.
    pub admin_email: String,

    /// Allowed origin handed to the external HTTP layer. Unused by the
    /// gateway core itself.
    pub allowed_origin: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 9090,
            admin_email: "admin@example.com".into(),
            allowed_origin: None,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn defaults_are_stable() {
        let cfg = TradepostConfig::default();
        assert_eq!(cfg.gateway.bind, "127.0.0.1");
        assert_eq!(cfg.gateway.port, 9090);
        assert_eq!(cfg.gateway.admin_email, "admin@example.com");
        assert!(cfg.gateway.allowed_origin.is_none());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: TradepostConfig = toml::from_str("[gateway]\nport = 4000\n").unwrap();
        assert_eq!(cfg.gateway.port, 4000);
        assert_eq!(cfg.gateway.admin_email, "admin@example.com");
    }
}
