//! # codehaven-blob
//!
//! Blob store implementations for Codehaven. The [`BlobStore`] trait
//! lives in `codehaven-core`; this crate provides the local-filesystem
//! provider (default) and an S3-compatible provider behind the `s3`
//! feature, plus the process-wide shared store accessor.
//!
//! [`BlobStore`]: codehaven_core::traits::blob::BlobStore

pub mod provider;
pub mod providers;

pub use providers::local::LocalBlobStore;
#[cfg(feature = "s3")]
pub use providers::s3::S3BlobStore;
