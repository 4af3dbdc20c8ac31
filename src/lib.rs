//! staticd - concurrent static file server
//!
//! Core library: request reading and parsing, response framing, the static
//! file handler and the listener/worker pool that drives them.

pub mod config;
pub mod error;
pub mod files;
pub mod handler;
pub mod http;
pub mod server;
