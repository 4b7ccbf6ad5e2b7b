//! # codehaven
//!
//! Facade crate for the Codehaven workspace: a hierarchy and
//! consistency layer that keeps file content in a blob store and file
//! metadata in PostgreSQL, consistent under partial failure and
//! concurrent mutation.
//!
//! The member crates are re-exported here for collaborators that want a
//! single dependency.

pub use codehaven_blob as blob;
pub use codehaven_core as core;
pub use codehaven_database as database;
pub use codehaven_entity as entity;
pub use codehaven_service as service;
