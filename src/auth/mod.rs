//! Credential handling for outgoing requests
//!
//! The HTTP client only needs a source for the bearer token; how it was
//! obtained (login flow, JWT issuance) is outside this crate.

mod token_store;

pub use token_store::{normalize_token, FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreError};
