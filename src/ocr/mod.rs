//! OCR engine boundary.
//!
//! Image text recognition is delegated to an external engine. The default
//! engine is Tesseract, driven through its command-line tool; tests swap in
//! in-memory engines through the `OcrEngine` trait.

mod backend;
mod tesseract;

pub use backend::{LanguageProfile, OcrConfig, OcrEngine, OcrError, OcrResult, OcrSession};
pub use tesseract::TesseractEngine;
