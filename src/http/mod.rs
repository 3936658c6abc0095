//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, tower-http layers)
//!     → request.rs (request ID, body validation)
//!     → middleware/auth.rs (bearer token → caller)
//!     → transactions.rs / health.rs (handlers)
//!     → response.rs (JSON envelopes, error mapping)
//!     → Send to client
//! ```

pub mod health;
pub mod middleware;
pub mod request;
pub mod response;
pub mod server;
pub mod transactions;

pub use request::X_REQUEST_ID;
pub use response::ApiError;
pub use server::{AppState, HttpServer};
