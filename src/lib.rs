//! textgrab - extract text from images, PDFs and camera captures.
//!
//! Recognition itself is delegated to external engines (Tesseract for
//! images, Poppler for PDF text layers). This crate coordinates them:
//! input routing, camera lifecycle, result formatting, and a small web UI.

pub mod camera;
pub mod cli;
pub mod clipboard;
pub mod config;
pub mod controller;
pub mod ocr;
pub mod pdf;
pub mod server;
pub mod tools;
