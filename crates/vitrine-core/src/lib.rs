pub mod api;
pub mod config;
pub mod contact;
pub mod listing;
pub mod storage;
pub mod telemetry;

pub use api::{ApiError, ProjectsClient};
pub use config::Config;
pub use contact::{ContactForm, ValidationError};
pub use listing::{ListingPhase, ProjectFilter, ProjectListing};
pub use storage::{StaticToken, Storage, TokenStore};
pub use telemetry::{TelemetryError, init_logging, init_telemetry};
