//! # codehaven-core
//!
//! Core crate for Codehaven. Contains the unified error system,
//! configuration schemas, the blob store trait, pagination types, and
//! the pure hierarchy primitives: path resolution, blob key derivation,
//! and content checksums.
//!
//! This crate has **no** internal dependencies on other Codehaven crates.

pub mod checksum;
pub mod config;
pub mod error;
pub mod key;
pub mod path;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
