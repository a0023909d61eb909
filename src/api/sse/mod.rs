//! SSE (Server-Sent Events) subscription endpoint
//!
//! Streams account change notifications to browsers and other long-lived
//! HTTP clients.
//!
//! ## Endpoint
//! - `GET /events/` - one `data: <json>` event per changed account, `data: {}`
//!   as keep-alive when the stream has been idle
//!
//! Each connection is one broker subscriber. The subscription is owned by
//! the response body stream, so a client disconnect (hyper drops the body)
//! deregisters it, and a broker shutdown ends the stream.

pub mod handler;

pub use handler::events_handler;
