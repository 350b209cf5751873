/// One label with its confidence score in [0, 1].
#[derive(Clone, Debug)]
pub struct LabelScore {
    pub label: String,
    pub score: f32,
}

/// Scores produced for one analyzed frame.
///
/// Order is the backend's emission order; the aggregator's tie-break depends
/// on it staying stable. Produced fresh per frame, consumed once, discarded.
#[derive(Clone, Debug, Default)]
pub struct ClassificationResult {
    pub scores: Vec<LabelScore>,
}

impl ClassificationResult {
    pub fn from_pairs<L: Into<String>>(pairs: impl IntoIterator<Item = (L, f32)>) -> Self {
        Self {
            scores: pairs
                .into_iter()
                .map(|(label, score)| LabelScore {
                    label: label.into(),
                    score,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }
}
