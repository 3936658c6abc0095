//! Request middleware applied to the `/api` routes.

pub mod auth;

pub use auth::{auth_middleware, AuthenticatedUser, UserDirectory};
