//! API Module
//!
//! HTTP harness over the cache's public operations.
//!
//! # Endpoints
//! - `PUT /data` - Insert a value
//! - `GET /data/:key` - Retrieve a value by key
//! - `DELETE /data/:key` - Remove exactly one key
//! - `DELETE /data?prefix=` - Remove by prefix, or everything without a prefix
//! - `GET /entries` - List live entries
//! - `GET /stats` - Cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
