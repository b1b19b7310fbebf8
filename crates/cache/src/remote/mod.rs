//! HTTP protocol for sharing a cache between machines
//!
//! ```text
//! GET  /{base64url(action)}  200 octet-stream | 400 | 404 | 500
//! POST /{base64url(action)}  201 | 400 | 412 (empty body) | 500
//! ```
//!
//! Any other method on an action path is answered with 405.

mod client;
mod server;

pub use client::RemoteClient;
pub use server::{router, serve, serve_with_shutdown, ProtocolError};
