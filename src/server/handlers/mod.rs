//! HTTP request handlers for the web server.

mod api;
mod camera;
mod error;
mod origin;
mod pages;
mod static_files;

// Re-export handlers for use by the router
pub use api::{api_clear, api_copy, api_extract, api_preview, api_state};
pub use camera::{api_camera_capture, api_camera_close, api_camera_frame, api_camera_open};
pub use origin::same_origin;
pub use pages::index;
pub use static_files::{serve_css, serve_js};
