pub mod client;
pub mod types;

pub use client::{ApiError, MAX_UPLOAD_BYTES, ProjectsClient};
pub use types::{
    ContactOutcome, ContactSubmission, ProjectDraft, ProjectRecord, ProjectStatus, UploadedImage,
};
