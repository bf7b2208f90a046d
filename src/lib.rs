pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod server;
pub mod types;

// Ingestion pipeline: decoding, header normalization, coercion, record storage
pub mod pipeline;

// Layered boundaries for application and infrastructure
pub mod app;
pub mod gateway;
pub mod infra;
