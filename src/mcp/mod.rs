//! Model Context Protocol server over stdio or HTTP.

pub mod handlers;
pub mod http;
pub mod protocol;
pub mod server;
pub mod tools;

pub use server::McpServer;
