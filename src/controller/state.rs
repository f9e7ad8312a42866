//! Interaction state machine.
//!
//! Transitions are a pure function of (state, event). The controller owns
//! the current state and applies events; anything not listed in
//! [`UiState::apply`] is rejected.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Phase the controller is in. The display layer renders from this.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UiState {
    #[default]
    Idle,
    CameraOpen,
    Extracting,
}

impl UiState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UiState::Idle => "idle",
            UiState::CameraOpen => "camera_open",
            UiState::Extracting => "extracting",
        }
    }

    /// Apply an event, returning the next state.
    pub fn apply(self, event: Event) -> Result<UiState, TransitionError> {
        use Event::*;
        use UiState::*;

        match (self, event) {
            // Opening over an open session replaces it.
            (Idle | CameraOpen, CameraOpened) => Ok(CameraOpen),
            (Idle | CameraOpen, CameraClosed) => Ok(Idle),
            // Capturing starts extraction straight from CameraOpen.
            (Idle | CameraOpen, ExtractionStarted) => Ok(Extracting),
            (Extracting, ExtractionFinished) => Ok(Idle),
            (Idle, Cleared) => Ok(Idle),
            (CameraOpen, Cleared) => Ok(CameraOpen),
            (from, event) => Err(TransitionError { from, event }),
        }
    }
}

impl fmt::Display for UiState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that happened to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    CameraOpened,
    CameraClosed,
    ExtractionStarted,
    ExtractionFinished,
    Cleared,
}

/// An event that is not valid in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot apply {event:?} while {from}")]
pub struct TransitionError {
    pub from: UiState,
    pub event: Event,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_capture_path() {
        let state = UiState::Idle;
        let state = state.apply(Event::CameraOpened).unwrap();
        assert_eq!(state, UiState::CameraOpen);
        let state = state.apply(Event::ExtractionStarted).unwrap();
        assert_eq!(state, UiState::Extracting);
        let state = state.apply(Event::ExtractionFinished).unwrap();
        assert_eq!(state, UiState::Idle);
    }

    #[test]
    fn test_extracting_rejects_everything_but_finish() {
        for event in [
            Event::CameraOpened,
            Event::CameraClosed,
            Event::ExtractionStarted,
            Event::Cleared,
        ] {
            let err = UiState::Extracting.apply(event).unwrap_err();
            assert_eq!(err.from, UiState::Extracting);
            assert_eq!(err.event, event);
        }
    }

    #[test]
    fn test_finish_requires_extracting() {
        assert!(UiState::Idle.apply(Event::ExtractionFinished).is_err());
        assert!(UiState::CameraOpen.apply(Event::ExtractionFinished).is_err());
    }

    #[test]
    fn test_close_is_idempotent() {
        let state = UiState::Idle.apply(Event::CameraClosed).unwrap();
        assert_eq!(state.apply(Event::CameraClosed).unwrap(), UiState::Idle);
    }

    #[test]
    fn test_clear_keeps_open_camera() {
        assert_eq!(
            UiState::CameraOpen.apply(Event::Cleared).unwrap(),
            UiState::CameraOpen
        );
    }

    #[test]
    fn test_serializes_snake_case() {
        let json = serde_json::to_string(&UiState::CameraOpen).unwrap();
        assert_eq!(json, "\"camera_open\"");
    }
}
