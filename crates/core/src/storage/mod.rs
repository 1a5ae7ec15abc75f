//! Storage module for moving objects between buckets and local workspaces.
//!
//! The `ObjectStorage` trait covers the two transfers an event needs:
//! downloading the source document into a workspace and uploading the
//! rendered image. There is no retry policy; the first failed transfer
//! aborts the event.
//!
//! # Backends
//!
//! - `GcsStorage`: Google Cloud Storage JSON API
//! - `LocalStorage`: one directory per bucket, for development and tests

mod error;
mod gcs;
mod local;
mod traits;

pub use error::TransferError;
pub use gcs::GcsStorage;
pub use local::LocalStorage;
pub use traits::ObjectStorage;
