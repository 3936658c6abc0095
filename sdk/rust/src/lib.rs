//! Client SDK for the BioCoin payment API.

pub mod client;

pub use client::{ApiResponse, BiocoinClient, PaymentRequest, SdkError};
