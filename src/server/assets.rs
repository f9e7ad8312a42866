//! Static asset constants (CSS and JavaScript).

/// Stylesheet for the web interface.
pub const CSS: &str = include_str!("styles.css");

/// JavaScript driving uploads, the camera preview and copy.
pub const JS: &str = include_str!("scripts.js");
