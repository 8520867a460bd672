//! Gmail API module
//!
//! Credentials, per-call session client, MIME codec, and wire types for the
//! Gmail REST API.

pub mod auth;
pub mod client;
pub mod mime;
pub mod types;
