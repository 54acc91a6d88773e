//! Fjall-based persistence for the media catalog and integration records
//!
//! The catalog is what the rest of the product reads imported media from.
//! This worker only ever adds sync-sourced entries and stamps an
//! integration's last-sync time; nothing here updates or deletes an entry.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mediasync::catalog::{FjallCatalog, MediaCatalog};
//!
//! let catalog = FjallCatalog::open("data/catalog")?;
//! if !catalog.contains("chan-1", "file-1").await? {
//!     catalog.insert(entry).await?;
//! }
//! ```

pub mod error;
pub mod models;
pub mod partitions;
pub mod store;
pub mod traits;

pub use error::{CatalogError, Result};
pub use models::{IntegrationRecord, MediaEntry, MediaSource};
pub use store::{CatalogStats, FjallCatalog};
pub use traits::{IntegrationStore, MediaCatalog};
