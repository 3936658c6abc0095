//! BioCoin payment API library.
//!
//! Multi-chain payment dispatch and balance aggregation for the BioCoin
//! data marketplace, served over HTTP.

pub mod blockchain;
pub mod catalog;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod payments;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
