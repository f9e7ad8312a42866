//! Askama template structs for the web interface.
//!
//! Each struct corresponds to an HTML template in the templates/ directory.

use askama::Template;

use crate::controller::{ControllerSnapshot, UiState};

/// The single-page extraction UI.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub title: &'a str,
    /// `idle`, `camera_open` or `extracting`.
    pub state: &'static str,
    pub text: String,
    pub extracting: bool,
    pub camera_open: bool,
    pub has_preview: bool,
    pub source_name: String,
}

impl<'a> IndexTemplate<'a> {
    pub fn from_snapshot(title: &'a str, snapshot: &ControllerSnapshot) -> Self {
        Self {
            title,
            state: snapshot.state.as_str(),
            text: snapshot.result.text.clone(),
            extracting: snapshot.state == UiState::Extracting,
            camera_open: snapshot.camera_active,
            has_preview: snapshot.has_preview,
            source_name: snapshot.source_name.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(extracting: bool) -> String {
        IndexTemplate {
            title: "textgrab",
            state: if extracting { "extracting" } else { "idle" },
            text: "Extracting text...".to_string(),
            extracting,
            camera_open: false,
            has_preview: false,
            source_name: String::new(),
        }
        .render()
        .unwrap()
    }

    #[test]
    fn test_controls_disabled_while_extracting() {
        let html = page(true);
        assert!(html.contains(r#"id="copy" disabled"#));
        assert!(html.contains(r#"id="clear" disabled"#));

        let html = page(false);
        assert!(!html.contains(r#"id="copy" disabled"#));
        assert!(!html.contains(" disabled"));
    }
}
