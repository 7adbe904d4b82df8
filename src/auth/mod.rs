//! Stateless token authentication.
//!
//! Tokens are minted by [`TokenIssuer`] and checked on every protected
//! request by [`AuthGate`]. Both share a [`SigningSecret`] and the [`Claims`]
//! shape; nothing is stored server-side.

pub mod credentials;
pub mod gate;
pub mod handlers;
mod token;

pub use credentials::{CredentialVerifier, StaticCredentials};
pub use gate::{authorize, AuthGate, AuthenticatedSubject, TOKEN_HEADER};
pub use token::{
    Claims, Clock, FixedClock, SigningSecret, SystemClock, TokenIssuer, TokenVerifier,
    TOKEN_LIFETIME_SECS,
};
