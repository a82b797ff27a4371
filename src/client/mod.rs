// File: ./src/client/mod.rs
pub mod core;
pub mod middleware;

pub use crate::client::core::{DEFAULT_API_URL, ProviderApi, ProviderClient};
