//! Route modules for OCR Desk Server

pub mod extract;
pub mod health;
pub mod ocr;
pub mod options;
pub mod sessions;
