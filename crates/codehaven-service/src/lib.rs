//! # codehaven-service
//!
//! Business logic for Codehaven. The services in this crate orchestrate
//! every multi-step operation across the metadata store and the blob
//! store with a fixed write order: content lands in the blob store
//! before metadata refers to it, and metadata disappears before content
//! does. A failure between the two steps can therefore only produce an
//! orphaned blob (invisible, reclaimable), never a live record pointing
//! at missing content.

pub mod context;
pub mod file;
pub mod folder;
pub mod workspace;

mod access;

pub use context::RequestContext;
