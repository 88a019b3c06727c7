//! IdGuard HTTP front end
//!
//! Serves the upload page, accepts document uploads for the identity
//! workflow, and exposes health and record-listing endpoints.

pub mod health_api;
pub mod records_api;
pub mod server;
pub mod upload;
pub mod upload_page;

pub use server::{build_router, start_server, GatewayState, UploadSettings};
