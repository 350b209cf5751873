use anyhow::Result;
use sha2::{Digest, Sha256};

use crate::classify::backend::ClassifierBackend;
use crate::classify::result::ClassificationResult;
use crate::frame::ConvertedImage;

/// Stub backend for tests and synthetic runs.
///
/// Derives a deterministic score per label from a hash of the pixels, so the
/// same image always classifies the same way without any model on disk.
pub struct StubClassifier {
    labels: Vec<String>,
}

impl StubClassifier {
    pub fn new(labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for StubClassifier {
    fn default() -> Self {
        Self::new(["smile", "no face"])
    }
}

impl ClassifierBackend for StubClassifier {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn classify(&mut self, image: &ConvertedImage) -> Result<ClassificationResult> {
        let digest: [u8; 32] = Sha256::digest(image.pixels()).into();

        Ok(ClassificationResult::from_pairs(
            self.labels.iter().enumerate().map(|(index, label)| {
                let byte = digest[index % digest.len()];
                (label.clone(), byte as f32 / 255.0)
            }),
        ))
    }
}
