//! Outbound HTTP with provider-aware retries

pub mod client;

pub use client::{HttpClient, HttpClientBuilder, RetryPolicy};
