//! In-memory engines for tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::camera::{Camera, CameraConstraints, CameraError, CameraStream, Frame};
use crate::clipboard::{Clipboard, ClipboardError};
use crate::ocr::{OcrConfig, OcrEngine, OcrError, OcrResult, OcrSession};
use crate::pdf::{PageText, PdfDocument, PdfEngine, PdfError};

use super::{ControllerOptions, Engines, ExtractionController};

/// OCR engine returning canned text or a canned failure.
#[derive(Default)]
pub struct FakeOcr {
    pub outcome: Option<Result<String, String>>,
    /// When set, recognition waits for a permit before returning.
    pub gate: Option<Arc<Semaphore>>,
    pub created: AtomicUsize,
    pub disposed: Arc<AtomicUsize>,
    pub last_languages: Arc<Mutex<Option<String>>>,
}

impl FakeOcr {
    pub fn text(text: &str) -> Self {
        Self {
            outcome: Some(Ok(text.to_string())),
            ..Default::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Some(Err(message.to_string())),
            ..Default::default()
        }
    }

    pub fn gated(text: &str, gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::text(text)
        }
    }
}

#[async_trait]
impl OcrEngine for FakeOcr {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn availability_hint(&self) -> String {
        String::new()
    }

    async fn create(&self) -> Result<Box<dyn OcrSession>, OcrError> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeOcrSession {
            outcome: self.outcome.clone().unwrap_or_else(|| Ok(String::new())),
            gate: self.gate.clone(),
            config: None,
            disposed: self.disposed.clone(),
            last_languages: self.last_languages.clone(),
        }))
    }
}

struct FakeOcrSession {
    outcome: Result<String, String>,
    gate: Option<Arc<Semaphore>>,
    config: Option<OcrConfig>,
    disposed: Arc<AtomicUsize>,
    last_languages: Arc<Mutex<Option<String>>>,
}

#[async_trait]
impl OcrSession for FakeOcrSession {
    async fn configure(&mut self, config: &OcrConfig) -> Result<(), OcrError> {
        *self.last_languages.lock().unwrap() = Some(config.languages.to_string());
        self.config = Some(config.clone());
        Ok(())
    }

    async fn recognize(&mut self, _image: &[u8]) -> Result<OcrResult, OcrError> {
        let config = self.config.clone().ok_or(OcrError::NotConfigured)?;
        if let Some(ref gate) = self.gate {
            gate.acquire().await.unwrap().forget();
        }
        match &self.outcome {
            Ok(text) => Ok(OcrResult {
                text: text.clone(),
                languages: config.languages,
                processing_time_ms: 1,
            }),
            Err(message) => Err(OcrError::OcrFailed(message.clone())),
        }
    }

    async fn dispose(self: Box<Self>) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
    }
}

/// PDF engine serving fixed page contents.
#[derive(Default)]
pub struct FakePdf {
    pub pages: Vec<Vec<String>>,
    pub open_error: Option<String>,
}

impl FakePdf {
    pub fn pages(pages: &[&[&str]]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|items| items.iter().map(|s| s.to_string()).collect())
                .collect(),
            open_error: None,
        }
    }

    pub fn broken(message: &str) -> Self {
        Self {
            pages: Vec::new(),
            open_error: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl PdfEngine for FakePdf {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn open(&self, _data: &[u8]) -> Result<Box<dyn PdfDocument>, PdfError> {
        if let Some(ref message) = self.open_error {
            return Err(PdfError::InvalidDocument(message.clone()));
        }
        Ok(Box::new(FakeDocument {
            pages: self.pages.clone(),
        }))
    }
}

struct FakeDocument {
    pages: Vec<Vec<String>>,
}

#[async_trait]
impl PdfDocument for FakeDocument {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    async fn page_text(&self, page: u32) -> Result<PageText, PdfError> {
        let items = self
            .pages
            .get(page as usize - 1)
            .cloned()
            .ok_or(PdfError::PageOutOfRange {
                page,
                count: self.page_count(),
            })?;
        Ok(PageText { page, items })
    }
}

/// Camera whose streams count how often they are stopped.
#[derive(Default)]
pub struct FakeCamera {
    /// Refuse every open, as if permission was denied.
    pub deny: bool,
    /// Streams never become ready.
    pub never_ready: bool,
    /// Frame every stream serves; `None` means no frame yet.
    pub frame: Option<Vec<u8>>,
    pub opened: AtomicUsize,
    pub stopped: Arc<AtomicUsize>,
}

impl FakeCamera {
    pub fn with_frame(frame: &[u8]) -> Self {
        Self {
            frame: Some(frame.to_vec()),
            ..Default::default()
        }
    }

    pub fn denied() -> Self {
        Self {
            deny: true,
            ..Default::default()
        }
    }

    /// Streams opened and not yet stopped.
    pub fn live_streams(&self) -> usize {
        self.opened.load(Ordering::SeqCst) - self.stopped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Camera for FakeCamera {
    async fn open(
        &self,
        _constraints: &CameraConstraints,
    ) -> Result<Box<dyn CameraStream>, CameraError> {
        if self.deny {
            return Err(CameraError::PermissionDenied("/dev/video0".to_string()));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeStream {
            frame: self.frame.clone().map(Frame::jpeg),
            never_ready: self.never_ready,
            stopped: self.stopped.clone(),
            running: true,
        }))
    }
}

struct FakeStream {
    frame: Option<Frame>,
    never_ready: bool,
    stopped: Arc<AtomicUsize>,
    running: bool,
}

#[async_trait]
impl CameraStream for FakeStream {
    async fn ready(&mut self) -> Result<(), CameraError> {
        if self.never_ready {
            Err(CameraError::NotReady("no frame".to_string()))
        } else {
            Ok(())
        }
    }

    fn latest_frame(&self) -> Option<Frame> {
        self.frame.clone()
    }

    async fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Clipboard recording every write.
#[derive(Default)]
pub struct RecordingClipboard {
    pub written: Mutex<Vec<String>>,
    pub fail: bool,
}

impl Clipboard for RecordingClipboard {
    fn write(&self, text: &str) -> Result<(), ClipboardError> {
        if self.fail {
            return Err(ClipboardError::Unavailable("no display".to_string()));
        }
        self.written.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Fakes wired into a controller, kept reachable for assertions.
pub struct Harness {
    pub controller: Arc<ExtractionController>,
    pub ocr: Arc<FakeOcr>,
    pub camera: Arc<FakeCamera>,
    pub clipboard: Arc<RecordingClipboard>,
}

impl Harness {
    pub fn new(ocr: FakeOcr, pdf: FakePdf, camera: FakeCamera) -> Self {
        Self::with_options(ocr, pdf, camera, ControllerOptions::default())
    }

    pub fn with_options(
        ocr: FakeOcr,
        pdf: FakePdf,
        camera: FakeCamera,
        options: ControllerOptions,
    ) -> Self {
        let ocr = Arc::new(ocr);
        let camera = Arc::new(camera);
        let clipboard = Arc::new(RecordingClipboard::default());
        let engines = Engines {
            ocr: ocr.clone(),
            pdf: Arc::new(pdf),
            camera: camera.clone(),
            clipboard: clipboard.clone(),
        };
        Self {
            controller: Arc::new(ExtractionController::new(engines, options)),
            ocr,
            camera,
            clipboard,
        }
    }
}
