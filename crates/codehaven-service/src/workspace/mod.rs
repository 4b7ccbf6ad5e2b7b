pub mod service;

pub use service::{CreateWorkspaceRequest, UpdateWorkspaceRequest, WorkspaceService};
