//! HTML pages.

use askama::Template;
use axum::{extract::State, response::Html};

use super::super::template_structs::IndexTemplate;
use super::super::AppState;

/// The extraction page, rendered with the current state.
pub async fn index(State(state): State<AppState>) -> Html<String> {
    let snapshot = state.controller.snapshot().await;
    let template = IndexTemplate::from_snapshot("textgrab", &snapshot);

    Html(
        template
            .render()
            .unwrap_or_else(|e| format!("Template error: {}", e)),
    )
}
