//! Camera capture through ffmpeg.
//!
//! ffmpeg reads the capture device and writes an MJPEG stream to stdout.
//! A reader task splits the stream into JPEG frames and publishes the most
//! recent one on a watch channel; the first frame is the readiness signal.

use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::{Camera, CameraConstraints, CameraError, CameraStream, Facing, Frame};
use crate::tools::FFMPEG_NOT_FOUND;

/// Frames larger than this are dropped as garbage.
const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Lines of ffmpeg stderr kept for error reporting.
const STDERR_TAIL_LINES: usize = 20;

/// Capture device configuration.
#[derive(Debug, Clone)]
pub struct CameraConfig {
    /// Device used for environment-facing requests (e.g. `/dev/video0`).
    pub environment_device: String,
    /// Device used for user-facing requests. Falls back to `environment_device`.
    pub user_device: Option<String>,
    /// ffmpeg input format (`v4l2`, `avfoundation`, `dshow`).
    pub input_format: String,
    /// Requested frame size, e.g. `1280x720`.
    pub video_size: Option<String>,
    /// Requested frame rate.
    pub framerate: u64,
    /// How long to wait for the first frame.
    pub ready_timeout: Duration,
}

impl Default for CameraConfig {
    fn default() -> Self {
        let (input_format, device) = if cfg!(target_os = "macos") {
            ("avfoundation", "0")
        } else if cfg!(target_os = "windows") {
            ("dshow", "video=Integrated Camera")
        } else {
            ("v4l2", "/dev/video0")
        };

        Self {
            environment_device: device.to_string(),
            user_device: None,
            input_format: input_format.to_string(),
            video_size: None,
            framerate: 15,
            ready_timeout: Duration::from_secs(5),
        }
    }
}

impl CameraConfig {
    /// Device for the requested facing.
    pub fn device_for(&self, facing: Facing) -> &str {
        match facing {
            Facing::Environment => &self.environment_device,
            Facing::User => self
                .user_device
                .as_deref()
                .unwrap_or(&self.environment_device),
        }
    }
}

/// Camera backed by an ffmpeg subprocess.
#[derive(Debug, Clone, Default)]
pub struct FfmpegCamera {
    config: CameraConfig,
}

impl FfmpegCamera {
    pub fn new(config: CameraConfig) -> Self {
        Self { config }
    }

    fn command(&self, device: &str) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-hide_banner", "-loglevel", "error", "-nostdin"])
            .args(["-f", &self.config.input_format])
            .args(["-framerate", &self.config.framerate.to_string()]);
        if let Some(ref size) = self.config.video_size {
            cmd.args(["-video_size", size]);
        }
        cmd.args(["-i", device])
            .args(["-f", "image2pipe", "-c:v", "mjpeg", "-q:v", "3", "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl Camera for FfmpegCamera {
    async fn open(
        &self,
        constraints: &CameraConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError> {
        let device = self.config.device_for(constraints.facing).to_string();
        check_device_access(&device).await?;

        let mut child = self.command(&device).spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CameraError::Unsupported(FFMPEG_NOT_FOUND.to_string())
            } else {
                CameraError::Io(e)
            }
        })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CameraError::Failed("ffmpeg stdout not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| CameraError::Failed("ffmpeg stderr not captured".to_string()))?;

        let (tx, rx) = watch::channel(None);
        let stderr_tail = Arc::new(Mutex::new(VecDeque::new()));

        tracing::info!(
            "Opened camera {} ({:?} facing, pid {:?})",
            device,
            constraints.facing,
            child.id()
        );

        Ok(Box::new(FfmpegStream {
            device,
            child: Some(child),
            frames: rx,
            reader: tokio::spawn(pump_frames(stdout, tx)),
            stderr_reader: tokio::spawn(collect_stderr(stderr, stderr_tail.clone())),
            stderr_tail,
            ready_timeout: self.config.ready_timeout,
        }))
    }
}

/// Fail early with a precise error when a device node is missing or unreadable.
async fn check_device_access(device: &str) -> Result<(), CameraError> {
    if !device.starts_with("/dev/") {
        return Ok(());
    }

    match tokio::fs::File::open(Path::new(device)).await {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(CameraError::NotFound(device.to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            Err(CameraError::PermissionDenied(device.to_string()))
        }
        Err(e) => Err(CameraError::Io(e)),
    }
}

struct FfmpegStream {
    device: String,
    child: Option<Child>,
    frames: watch::Receiver<Option<Frame>>,
    reader: JoinHandle<()>,
    stderr_reader: JoinHandle<()>,
    stderr_tail: Arc<Mutex<VecDeque<String>>>,
    ready_timeout: Duration,
}

impl FfmpegStream {
    /// Build an error from what ffmpeg printed before exiting.
    async fn exit_error(&mut self) -> CameraError {
        if let Some(child) = self.child.as_mut() {
            let _ = tokio::time::timeout(Duration::from_millis(500), child.wait()).await;
        }
        let _ = tokio::time::timeout(Duration::from_millis(500), &mut self.stderr_reader).await;

        let tail = self
            .stderr_tail
            .lock()
            .map(|lines| lines.iter().cloned().collect::<Vec<_>>().join("; "))
            .unwrap_or_default();

        if tail.contains("Permission denied") {
            CameraError::PermissionDenied(self.device.clone())
        } else if tail.contains("No such file or directory") {
            CameraError::NotFound(self.device.clone())
        } else if tail.is_empty() {
            CameraError::Failed(format!("ffmpeg exited while opening {}", self.device))
        } else {
            CameraError::Failed(tail)
        }
    }
}

#[async_trait]
impl CameraStream for FfmpegStream {
    async fn ready(&mut self) -> Result<(), CameraError> {
        let mut rx = self.frames.clone();
        let first_frame = async move { rx.wait_for(|frame| frame.is_some()).await.map(|_| ()) };

        match tokio::time::timeout(self.ready_timeout, first_frame).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(self.exit_error().await),
            Err(_) => Err(CameraError::NotReady(format!(
                "no frame from {} within {}ms",
                self.device,
                self.ready_timeout.as_millis()
            ))),
        }
    }

    fn latest_frame(&self) -> Option<Frame> {
        self.frames.borrow().clone()
    }

    async fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                tracing::debug!("ffmpeg already exited: {}", e);
            }
            let _ = child.wait().await;
            tracing::info!("Stopped camera {}", self.device);
        }
        self.reader.abort();
        self.stderr_reader.abort();
    }
}

impl Drop for FfmpegStream {
    fn drop(&mut self) {
        // The child itself is killed on drop.
        self.reader.abort();
        self.stderr_reader.abort();
    }
}

async fn pump_frames(mut stdout: ChildStdout, tx: watch::Sender<Option<Frame>>) {
    let mut splitter = JpegSplitter::default();
    let mut chunk = vec![0u8; 64 * 1024];

    loop {
        match stdout.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                for frame in splitter.push(&chunk[..n]) {
                    tx.send_replace(Some(Frame::jpeg(frame)));
                }
            }
            Err(e) => {
                tracing::debug!("Camera stream read failed: {}", e);
                break;
            }
        }
    }
}

async fn collect_stderr(stderr: ChildStderr, tail: Arc<Mutex<VecDeque<String>>>) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        tracing::debug!("ffmpeg: {}", line);
        if let Ok(mut tail) = tail.lock() {
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
    }
}

/// Splits a concatenated MJPEG byte stream into complete JPEG images.
#[derive(Debug, Default)]
pub struct JpegSplitter {
    buf: Vec<u8>,
}

impl JpegSplitter {
    /// Feed bytes, returning every frame completed by them.
    pub fn push(&mut self, data: &[u8]) -> Vec<Vec<u8>> {
        self.buf.extend_from_slice(data);
        let mut frames = Vec::new();

        loop {
            let Some(start) = find_marker(&self.buf, 0, 0xD8) else {
                // Keep a trailing 0xFF: it may begin the next SOI marker.
                let keep_last = self.buf.last() == Some(&0xFF);
                self.buf.clear();
                if keep_last {
                    self.buf.push(0xFF);
                }
                break;
            };
            if start > 0 {
                self.buf.drain(..start);
            }

            match find_marker(&self.buf, 2, 0xD9) {
                Some(end) => {
                    let frame: Vec<u8> = self.buf.drain(..end + 2).collect();
                    frames.push(frame);
                }
                None => {
                    if self.buf.len() > MAX_FRAME_BYTES {
                        tracing::warn!("Dropping oversized camera frame");
                        self.buf.clear();
                    }
                    break;
                }
            }
        }

        frames
    }
}

/// Position of the two-byte marker `0xFF <code>` at or after `from`.
fn find_marker(buf: &[u8], from: usize, code: u8) -> Option<usize> {
    if buf.len() < from + 2 {
        return None;
    }
    buf[from..]
        .windows(2)
        .position(|w| w[0] == 0xFF && w[1] == code)
        .map(|pos| pos + from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jpeg(body: &[u8]) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(body);
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    #[test]
    fn test_splits_back_to_back_frames() {
        let mut stream = jpeg(b"one");
        stream.extend(jpeg(b"two"));

        let mut splitter = JpegSplitter::default();
        let frames = splitter.push(&stream);
        assert_eq!(frames, vec![jpeg(b"one"), jpeg(b"two")]);
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let frame = jpeg(b"partial frame body");
        let (a, b) = frame.split_at(7);

        let mut splitter = JpegSplitter::default();
        assert!(splitter.push(a).is_empty());
        assert_eq!(splitter.push(b), vec![frame.clone()]);
    }

    #[test]
    fn test_marker_split_across_chunks() {
        let frame = jpeg(b"x");
        let mut splitter = JpegSplitter::default();
        assert!(splitter.push(&[0x00, 0x00, 0xFF]).is_empty());
        assert_eq!(splitter.push(&frame[1..]), vec![frame.clone()]);
    }

    #[test]
    fn test_garbage_before_frame_is_skipped() {
        let mut stream = b"garbage".to_vec();
        stream.extend(jpeg(b"img"));

        let mut splitter = JpegSplitter::default();
        assert_eq!(splitter.push(&stream), vec![jpeg(b"img")]);
    }

    #[test]
    fn test_device_for_falls_back_to_environment() {
        let config = CameraConfig {
            environment_device: "/dev/video2".to_string(),
            ..Default::default()
        };
        assert_eq!(config.device_for(Facing::User), "/dev/video2");

        let config = CameraConfig {
            user_device: Some("/dev/video3".to_string()),
            ..config
        };
        assert_eq!(config.device_for(Facing::User), "/dev/video3");
        assert_eq!(config.device_for(Facing::Environment), "/dev/video2");
    }

    #[tokio::test]
    async fn test_missing_device_is_not_found() {
        let camera = FfmpegCamera::new(CameraConfig {
            environment_device: "/dev/textgrab-missing-video".to_string(),
            ..Default::default()
        });
        let err = camera.open(&CameraConstraints::default()).await.err().unwrap();
        assert!(matches!(err, CameraError::NotFound(_)));
    }
}
