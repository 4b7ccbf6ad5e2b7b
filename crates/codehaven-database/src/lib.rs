//! # codehaven-database
//!
//! PostgreSQL connection management and concrete repository
//! implementations for the Codehaven metadata store.

pub mod connection;
pub mod migration;
pub mod repositories;

pub use connection::DatabasePool;
