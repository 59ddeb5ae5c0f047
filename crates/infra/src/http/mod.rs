//! HTTP transport shared by the SUNAT adapters

pub mod client;

pub use client::{HttpClient, HttpClientBuilder, HttpResponse};
