//! Core trait abstractions: the seams where collaborators plug in.

pub mod extractor;
pub mod fetcher;
pub mod ocr;

pub use extractor::Extractor;
pub use fetcher::{error_for_status, FetchRequest, FetchResponse, Fetcher};
pub use ocr::OcrEngine;
