mod backend;
mod backends;
mod result;

pub use backend::ClassifierBackend;
pub use backends::StubClassifier;
pub use result::{ClassificationResult, LabelScore};
