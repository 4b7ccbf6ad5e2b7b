pub mod service;

pub use service::{FileService, UploadFileRequest};
