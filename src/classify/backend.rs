use anyhow::Result;

use crate::classify::result::ClassificationResult;
use crate::frame::ConvertedImage;

/// Classifier backend trait.
///
/// The pipeline depends on inference only through this boundary: a backend
/// accepts an upright RGB image at the configured input resolution and
/// returns label/confidence pairs. It stays model-agnostic and is trivially
/// stubbed in tests.
///
/// Contract for implementations:
/// - Scores are confidences in [0, 1].
/// - The image reference must not be retained beyond the call; the worker
///   reuses its buffers on the next cycle.
/// - Errors are allowed; the worker treats a failed call as a skipped cycle
///   and never lets it escape the worker thread.
pub trait ClassifierBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run inference on one frame.
    fn classify(&mut self, image: &ConvertedImage) -> Result<ClassificationResult>;

    /// Optional warm-up hook, called once before the first frame.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
