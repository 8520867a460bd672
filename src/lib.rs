//! Gmail MCP server library
//!
//! A Model Context Protocol (MCP) server for Gmail. Exposes tools for
//! sending mail, fetching the latest message, managing labels, and
//! refreshing the stored OAuth token, with credentials resolved per call
//! from an override map or the process environment.

pub mod backend;
pub mod config;
pub mod error;
pub mod gmail;
pub mod mcp;

pub use error::{GmailMcpError, Result};
