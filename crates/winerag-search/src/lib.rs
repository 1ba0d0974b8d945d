//! Wine RAG Search - Search service gateway
//!
//! Wraps a single text query against a hosted search index and hands the
//! hits back in the order the service ranked them.

pub mod azure;

pub use azure::AzureSearchClient;
