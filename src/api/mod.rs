//! API Module
//!
//! HTTP handlers and routing for the admission demo server.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
