//! Extraction controller.
//!
//! Owns the interaction state, the current source, the live camera session
//! and the latest result, and coordinates the OCR and PDF engines. The
//! controller is shared behind an `Arc` by the web server and the CLI.
//!
//! Locks are always taken session first, then state. The state lock is never
//! held while an engine runs; `Extracting` is claimed up front instead, so a
//! second submission is rejected with [`ControllerError::Busy`].

mod error;
mod result;
mod source;
mod state;

#[cfg(test)]
pub(crate) mod fakes;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::camera::{Camera, CameraConstraints, CameraStream, FfmpegCamera, Frame};
use crate::clipboard::{Clipboard, SystemClipboard};
use crate::config::Settings;
use crate::ocr::{OcrConfig, OcrEngine, TesseractEngine};
use crate::pdf::{PdfEngine, PopplerEngine};

pub use error::ControllerError;
pub use result::{
    format_pages, image_text, ExtractionResult, EXTRACTING_TEXT, FAILURE_MARKER, INITIAL_TEXT,
    NO_TEXT_IN_IMAGE, NO_TEXT_IN_PDF,
};
pub use source::{route, InputKind, Source, UploadedFile};
pub use state::{Event, TransitionError, UiState};

/// Backends the controller drives.
#[derive(Clone)]
pub struct Engines {
    pub ocr: Arc<dyn OcrEngine>,
    pub pdf: Arc<dyn PdfEngine>,
    pub camera: Arc<dyn Camera>,
    pub clipboard: Arc<dyn Clipboard>,
}

impl Engines {
    /// Host tools: tesseract, poppler, ffmpeg and the desktop clipboard.
    pub fn system(settings: &Settings) -> Self {
        Self {
            ocr: Arc::new(TesseractEngine::new()),
            pdf: Arc::new(PopplerEngine::new()),
            camera: Arc::new(FfmpegCamera::new(settings.camera.clone())),
            clipboard: Arc::new(SystemClipboard),
        }
    }
}

/// Per-controller tuning.
#[derive(Debug, Clone, Default)]
pub struct ControllerOptions {
    pub ocr: OcrConfig,
    pub camera: CameraConstraints,
    /// Reject inputs that are neither PDF nor image instead of trying OCR.
    pub reject_unsupported: bool,
}

impl ControllerOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            ocr: settings.ocr_config(),
            camera: CameraConstraints {
                facing: settings.facing,
            },
            reject_unsupported: settings.reject_unsupported,
        }
    }
}

/// Text and page count extracted from a PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfText {
    pub text: String,
    pub page_count: u32,
}

/// Everything the display layer renders from.
#[derive(Debug, Clone, Serialize)]
pub struct ControllerSnapshot {
    pub state: UiState,
    pub camera_active: bool,
    pub has_preview: bool,
    pub source_name: Option<String>,
    #[serde(flatten)]
    pub result: ExtractionResult,
}

struct ControllerState {
    ui: UiState,
    source: Option<Source>,
    result: ExtractionResult,
}

impl ControllerState {
    fn apply(&mut self, event: Event) -> Result<(), TransitionError> {
        let next = self.ui.apply(event)?;
        tracing::debug!("State {} -> {} on {:?}", self.ui, next, event);
        self.ui = next;
        Ok(())
    }

    /// Claim `Extracting` for a new source.
    fn begin(&mut self, source: Source) -> Result<(), TransitionError> {
        self.apply(Event::ExtractionStarted)?;
        self.source = Some(source);
        self.result = ExtractionResult::in_progress();
        Ok(())
    }
}

struct CameraSession {
    stream: Box<dyn CameraStream>,
    opened_at: DateTime<Utc>,
}

impl CameraSession {
    async fn close(mut self) {
        self.stream.stop().await;
        let open_for = Utc::now() - self.opened_at;
        tracing::debug!("Camera closed after {}ms", open_for.num_milliseconds());
    }
}

/// Coordinates sources, engines and the camera for one user.
pub struct ExtractionController {
    engines: Engines,
    options: ControllerOptions,
    state: RwLock<ControllerState>,
    session: Mutex<Option<CameraSession>>,
}

impl ExtractionController {
    pub fn new(engines: Engines, options: ControllerOptions) -> Self {
        Self {
            engines,
            options,
            state: RwLock::new(ControllerState {
                ui: UiState::Idle,
                source: None,
                result: ExtractionResult::initial(),
            }),
            session: Mutex::new(None),
        }
    }

    /// Controller wired to the host tools.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            Engines::system(settings),
            ControllerOptions::from_settings(settings),
        )
    }

    /// Open the camera, replacing any open session.
    ///
    /// Returns once the stream has delivered its first frame.
    pub async fn open_camera(&self) -> Result<(), ControllerError> {
        let mut session = self.session.lock().await;
        if self.state.read().await.ui == UiState::Extracting {
            return Err(ControllerError::Busy);
        }

        if let Some(previous) = session.take() {
            tracing::info!("Replacing open camera session");
            previous.close().await;
            self.state.write().await.apply(Event::CameraClosed)?;
        }

        let mut stream = match self.engines.camera.open(&self.options.camera).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("Camera open failed: {}", e);
                return Err(ControllerError::CameraUnavailable(e.to_string()));
            }
        };

        if let Err(e) = stream.ready().await {
            tracing::warn!("Camera never became ready: {}", e);
            stream.stop().await;
            return Err(ControllerError::CameraUnavailable(e.to_string()));
        }

        if let Err(e) = self.state.write().await.apply(Event::CameraOpened) {
            stream.stop().await;
            return Err(e.into());
        }

        tracing::info!("Camera open");
        *session = Some(CameraSession {
            stream,
            opened_at: Utc::now(),
        });
        Ok(())
    }

    /// Stop the camera if one is open. Safe to call at any time.
    pub async fn close_camera(&self) {
        let mut session = self.session.lock().await;
        let Some(active) = session.take() else {
            return;
        };
        active.close().await;
        if let Err(e) = self.state.write().await.apply(Event::CameraClosed) {
            tracing::warn!("Camera closed in unexpected state: {}", e);
        }
    }

    /// Grab the latest frame, close the camera and run OCR on the frame.
    ///
    /// The camera is closed whether or not a frame was available.
    pub async fn capture_frame(&self) -> Result<ExtractionResult, ControllerError> {
        let source = {
            let mut session = self.session.lock().await;
            let active = session.take().ok_or(ControllerError::NoActiveCamera)?;
            let frame = active.stream.latest_frame();
            active.close().await;

            let mut state = self.state.write().await;
            let Some(image) = frame else {
                state.apply(Event::CameraClosed)?;
                return Err(ControllerError::NoFrame);
            };

            let age = Utc::now() - image.captured_at;
            tracing::info!(
                "Captured {} byte frame ({}ms old)",
                image.data.len(),
                age.num_milliseconds()
            );
            let source = Source::CameraFrame { image };
            state.begin(source.clone())?;
            source
        };

        Ok(self.run_extraction(source).await)
    }

    /// Take a new file as the source and extract its text.
    ///
    /// Engine failures are published in the returned result rather than
    /// returned as errors.
    pub async fn submit_file(&self, file: UploadedFile) -> Result<ExtractionResult, ControllerError> {
        let mime_type = file.resolved_mime();
        let kind = route(&mime_type, self.options.reject_unsupported)?;
        let source = Source::File {
            bytes: file.bytes,
            mime_type,
            name: file.name,
            kind,
        };

        {
            let mut session = self.session.lock().await;
            if self.state.read().await.ui == UiState::Extracting {
                return Err(ControllerError::Busy);
            }
            if let Some(active) = session.take() {
                tracing::info!("New source selected, closing camera");
                active.close().await;
            }
            self.state.write().await.begin(source.clone())?;
        }

        Ok(self.run_extraction(source).await)
    }

    /// Recognize text in an image with a fresh OCR session.
    pub async fn extract_from_image(&self, image: &[u8]) -> Result<String, ControllerError> {
        let recognition = |e: crate::ocr::OcrError| ControllerError::RecognitionFailure(e.to_string());

        let mut session = self.engines.ocr.create().await.map_err(recognition)?;
        let outcome = match session.configure(&self.options.ocr).await {
            Ok(()) => session.recognize(image).await,
            Err(e) => Err(e),
        };
        session.dispose().await;

        let result = outcome.map_err(recognition)?;
        tracing::info!(
            "{} recognized {} chars ({}) in {}ms",
            self.engines.ocr.name(),
            result.text.len(),
            result.languages,
            result.processing_time_ms
        );
        Ok(image_text(&result.text))
    }

    /// Read the text layer of every page, in order.
    pub async fn extract_from_pdf(&self, data: &[u8]) -> Result<PdfText, ControllerError> {
        let parse = |e: crate::pdf::PdfError| ControllerError::PdfParseFailure(e.to_string());

        let document = self.engines.pdf.open(data).await.map_err(parse)?;
        let page_count = document.page_count();
        let mut pages = Vec::with_capacity(page_count as usize);
        for page in 1..=page_count {
            pages.push(document.page_text(page).await.map_err(parse)?);
        }

        tracing::info!("{} read {} PDF pages", self.engines.pdf.name(), page_count);
        Ok(PdfText {
            text: format_pages(&pages),
            page_count,
        })
    }

    async fn run_extraction(&self, source: Source) -> ExtractionResult {
        let kind = source.kind();
        let outcome = match kind {
            InputKind::Image => self
                .extract_from_image(source.bytes())
                .await
                .map(|text| (text, None)),
            InputKind::Pdf => self
                .extract_from_pdf(source.bytes())
                .await
                .map(|pdf| (pdf.text, Some(pdf.page_count))),
        };

        let result = match outcome {
            Ok((text, page_count)) => ExtractionResult::success(kind, text, page_count),
            Err(e) => {
                tracing::warn!("{}", e);
                ExtractionResult::failure(kind, &e)
            }
        };

        let mut state = self.state.write().await;
        state.result = result.clone();
        if let Err(e) = state.apply(Event::ExtractionFinished) {
            tracing::error!("Extraction finished in unexpected state: {}", e);
        }
        result
    }

    /// Reset source and result. Not allowed while extracting.
    pub async fn clear(&self) -> Result<(), ControllerError> {
        let mut state = self.state.write().await;
        state.apply(Event::Cleared)?;
        state.source = None;
        state.result = ExtractionResult::initial();
        Ok(())
    }

    /// Copy the current text to the clipboard.
    ///
    /// Returns `false` when there is nothing to copy. Clipboard failures are
    /// logged and not reported.
    pub async fn copy_to_clipboard(&self) -> Result<bool, ControllerError> {
        let text = {
            let state = self.state.read().await;
            if state.ui == UiState::Extracting {
                return Err(ControllerError::Busy);
            }
            state.result.text.clone()
        };
        if text.is_empty() {
            return Ok(false);
        }

        let clipboard = self.engines.clipboard.clone();
        match tokio::task::spawn_blocking(move || clipboard.write(&text)).await {
            Ok(Ok(())) => tracing::debug!("Copied result to clipboard"),
            Ok(Err(e)) => tracing::warn!("{}", e),
            Err(e) => tracing::warn!("Clipboard task failed: {}", e),
        }
        Ok(true)
    }

    pub async fn state(&self) -> UiState {
        self.state.read().await.ui
    }

    pub async fn result(&self) -> ExtractionResult {
        self.state.read().await.result.clone()
    }

    pub async fn snapshot(&self) -> ControllerSnapshot {
        let state = self.state.read().await;
        ControllerSnapshot {
            state: state.ui,
            camera_active: state.ui == UiState::CameraOpen,
            has_preview: state.source.as_ref().and_then(Source::preview).is_some(),
            source_name: state.source.as_ref().and_then(Source::name).map(String::from),
            result: state.result.clone(),
        }
    }

    /// Bytes and MIME type of the current image source.
    pub async fn preview(&self) -> Option<(Vec<u8>, String)> {
        let state = self.state.read().await;
        state
            .source
            .as_ref()
            .and_then(Source::preview)
            .map(|(bytes, mime)| (bytes.to_vec(), mime.to_string()))
    }

    /// Most recent live frame, if a camera is open and streaming.
    ///
    /// Returns `None` while another operation holds the session.
    pub fn latest_camera_frame(&self) -> Option<Frame> {
        let session = self.session.try_lock().ok()?;
        session.as_ref().and_then(|s| s.stream.latest_frame())
    }

    /// Release the camera before the process exits.
    pub async fn shutdown(&self) {
        self.close_camera().await;
    }
}
