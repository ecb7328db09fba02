//! HTTP surface of the bridge.
//!
//! - **[`handlers`]**: axum route handlers and the credential extractor
//! - **[`models`]**: response bodies
//!
//! The alias route mirrors SimpleLogin's `POST /api/alias/random/new`, so password managers that
//! speak SimpleLogin can be pointed at the bridge unchanged. OpenAPI documentation is served at
//! `/docs`.

pub mod handlers;
pub mod models;
