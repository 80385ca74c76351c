//! Configuration for the tradepost gateway.
//!
//! Config is discovered from `tradepost.{toml,yaml,yml,json}` in the working
//! directory, then `~/.config/tradepost/`. `${ENV_VAR}` placeholders in the
//! raw file are substituted before parsing.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{clear_config_dir, discover_and_load, load_config, set_config_dir},
    schema::{GatewayConfig, TradepostConfig},
};
