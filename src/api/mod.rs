//! API Module
//!
//! HTTP handlers and routing for the demo server.
//!
//! # Endpoints
//! - `GET /get/:key` - Coalesced lookup through the origin
//! - `PUT /set` - Store a key-value pair
//! - `DELETE /del/:key` - Expire a key
//! - `GET /stats` - Get lookup statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
