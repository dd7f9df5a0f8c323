//! Identity provider contracts and the bundled HTTPS client.
//!
//! `client` exposes the object-safe [`IdentityClient`] and [`ClientFactory`] hooks driven
//! by the acquisition chain, `claims` recovers tenant and principal hints from issued
//! tokens, and `http` (behind the `reqwest` feature) is the production implementation.

pub mod claims;
pub mod client;
#[cfg(feature = "reqwest")] pub mod http;

pub use claims::*;
pub use client::*;
#[cfg(feature = "reqwest")] pub use http::*;
