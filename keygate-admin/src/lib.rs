pub mod error;
pub mod handlers;
pub mod middleware;
pub mod sanitize;
pub mod server;
