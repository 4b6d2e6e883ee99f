//! Opaque access-token and credential-bundle types.
//!
//! Exchange authentication flows — TOTP, HMAC request signing, OAuth
//! redirects — are venue-specific and live outside the core; this crate
//! only carries the token and credential shapes those flows produce.

#![deny(warnings)]
#![deny(clippy::all)]
#![deny(dead_code)]
#![deny(unused)]
#![deny(missing_docs)]
#![forbid(unsafe_code)]

mod token;

pub use token::{AccessToken, AuthError, CredentialBundle};
