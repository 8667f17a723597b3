//! Model backend implementations.

pub mod azure;

pub use azure::AzureOpenAi;
