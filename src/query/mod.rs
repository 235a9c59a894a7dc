//! Client-side query cache.
//!
//! Inspired by TanStack Query: values are cached by a structural [`QueryKey`],
//! concurrent requests for one key are deduplicated, and [`QueryCache::invalidate`]
//! keeps the old value visible while a refetch runs.
//!
//! # Example
//!
//! ```ignore
//! let backend = backend.clone();
//! let entry = cache
//!     .fetch(&keys::companies(), move || {
//!         let backend = backend.clone();
//!         async move { backend.list_companies().await }
//!     })
//!     .await;
//!
//! match entry.status {
//!     QueryStatus::Loading => render_spinner(),
//!     QueryStatus::Success => render_rows(entry.data()),
//!     QueryStatus::Error => render_error(entry.error.as_ref()),
//!     QueryStatus::Idle => {}
//! }
//! ```

mod cache;
mod entry;
mod key;

pub use cache::QueryCache;
pub use entry::{QueryEntry, QueryStatus};
pub use key::QueryKey;
