//! Credential lifecycle.
//!
//! - [`PinAuthenticator`] bootstraps a [`TokenStore`] with its first token pair.
//! - [`AuthorizingMiddleware`] keeps that pair fresh and attaches it to every request.
//! - [`MemoryStore`] and [`PersistentStore`] hold the pair between requests.

pub mod clock;
pub mod duration;
pub mod exchange;
pub mod pin;
pub mod store;
pub mod transport;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use duration::{InvalidDuration, TokenDuration, format_duration, parse_duration};
pub use exchange::TokenExchange;
pub use pin::{PinAuthenticator, PinState};
pub use store::{DEFAULT_EXPIRY_MARGIN, MemoryStore, PersistentStore, TokenRecord, TokenStore};
pub use transport::{AuthorizingMiddleware, needs_reauthentication};
pub use types::{
    AuthorizationErrorCode, AuthorizationErrorResponse, PinAuthenticationChallenge, Scope,
    TokenRefreshResponse,
};
