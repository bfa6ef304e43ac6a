//! OCR engine trait - the text-recognition collaborator.

use async_trait::async_trait;

use crate::error::OcrError;
use crate::types::content::OcrResult;

/// The OCR collaborator capability.
///
/// Stateless from the pipeline's point of view: injected per run, never
/// process-wide mutable state, so tests can substitute a deterministic
/// stub.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Recognize text in a batch of images.
    ///
    /// One call per `RawContent`, not one per image, to bound latency and
    /// rate-limit exposure. Returns one result per input image, order
    /// preserved.
    async fn recognize(&self, images: &[Vec<u8>]) -> Result<Vec<OcrResult>, OcrError>;

    /// Implementation name, for logging.
    fn name(&self) -> &str {
        "unknown"
    }
}
