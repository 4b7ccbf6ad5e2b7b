//! Store-backed integration tests.
//!
//! These exercise the services against a real PostgreSQL instance and a
//! local blob store. They are ignored by default; point `DATABASE_URL`
//! at a disposable database and run with `cargo test -- --ignored`.

mod helpers;

mod file_flow;
mod folder_flow;
mod workspace_flow;
