pub mod cached_client;
pub mod client;
pub mod error;
pub mod keys;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_server;

pub use cached_client::CachedBackend;
pub use client::BackendClient;
pub use error::TransportError;
pub use transport::{Params, Transport};
