//! Camera boundary.
//!
//! A camera hands out live streams. A stream is an exclusive hardware
//! resource: whoever opens one must `stop()` it (dropping it also releases
//! the device).

mod ffmpeg;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use ffmpeg::{CameraConfig, FfmpegCamera, JpegSplitter};

/// Errors from camera acquisition.
#[derive(Debug, Error)]
pub enum CameraError {
    #[error("permission denied for {0}")]
    PermissionDenied(String),

    #[error("no camera found at {0}")]
    NotFound(String),

    #[error("camera capture not supported: {0}")]
    Unsupported(String),

    #[error("camera did not become ready: {0}")]
    NotReady(String),

    #[error("camera failed: {0}")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    /// Rear camera, pointing away from the user.
    #[default]
    Environment,
    /// Front camera, pointing at the user.
    User,
}

/// Constraints for opening a camera stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraConstraints {
    /// Preferred facing. A camera without the preferred facing may still be used.
    pub facing: Facing,
}

/// A single encoded video frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub data: Vec<u8>,
    pub mime_type: &'static str,
    pub captured_at: DateTime<Utc>,
}

impl Frame {
    pub fn jpeg(data: Vec<u8>) -> Self {
        Self {
            data,
            mime_type: "image/jpeg",
            captured_at: Utc::now(),
        }
    }
}

/// Source of camera streams.
#[async_trait]
pub trait Camera: Send + Sync {
    /// Request a stream matching the constraints.
    async fn open(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError>;
}

/// A live camera stream.
#[async_trait]
pub trait CameraStream: Send + Sync {
    /// Resolve once the first frame is available.
    async fn ready(&mut self) -> Result<(), CameraError>;

    /// Most recent decoded frame, if any.
    fn latest_frame(&self) -> Option<Frame>;

    /// Stop every track of the stream and release the device.
    async fn stop(&mut self);
}
