//! Gateway-facing descriptors (data) and strategies (behavior).
//!
//! `descriptor` exposes validated configuration ([`GatewayDescriptor`]) covering HTTPS-only
//! endpoints, the application id, gateway call defaults, and the fixed authInfo profile.
//! `strategy` defines [`GatewayStrategy`], an HTTP-client-agnostic hook used by flows to
//! decorate gateway requests and map business errors into the crate error taxonomy.

pub mod descriptor;
pub mod strategy;

pub use descriptor::*;
pub use strategy::*;
