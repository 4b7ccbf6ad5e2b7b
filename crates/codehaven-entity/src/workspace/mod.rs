pub mod model;

pub use model::{CreateWorkspace, Workspace, WorkspaceSettings};
