//! ecobee thermostat API client
//!
//! An async client for the ecobee REST API whose core is the credential lifecycle:
//! a one-time PIN authorization seeds a token store, and from then on every request
//! carries a bearer token that is refreshed transparently before it expires.
//!
//! # Features
//!
//! - **PIN authorization**: [`auth::PinAuthenticator`] bootstraps the first token pair
//! - **Transparent refresh**: [`auth::AuthorizingMiddleware`] plugs into `reqwest-middleware`
//! - **Pluggable storage**: in-memory or durable JSON file, both safe for concurrent use
//! - **Typed data calls**: thermostat summary and thermostat details
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ecobee_client::{Config, EcobeeClient, PersistentStore, models::Selection};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let store = PersistentStore::open(config.require_store_path()?)?;
//!     let client = EcobeeClient::new(&config, Arc::new(store))?;
//!
//!     for thermostat in client.thermostats(&Selection::registered().with_runtime()).await? {
//!         println!("{}: {}", thermostat.identifier, thermostat.name);
//!     }
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use auth::{AuthorizingMiddleware, MemoryStore, PersistentStore, PinAuthenticator, TokenStore};
pub use client::EcobeeClient;
pub use config::Config;
pub use error::{AuthError, ClientError, StoreError};
