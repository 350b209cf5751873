//! Score aggregation and display formatting.
//!
//! Takes the classifier's raw label/confidence pairs, keeps the top-K by
//! score, maps each kept label through a fixed display-text table, and
//! renders one line for the UI sink. Labels without a table entry contribute
//! nothing; an empty selection renders as an empty string.

use std::collections::HashMap;

use crate::classify::ClassificationResult;

/// Separator between rendered entries when K > 1.
const ENTRY_SEPARATOR: &str = "; ";

/// Ranks classification scores and renders the display string.
#[derive(Clone, Debug)]
pub struct ResultAggregator {
    top_k: usize,
    display_names: HashMap<String, String>,
}

impl ResultAggregator {
    pub fn new(
        top_k: usize,
        display_names: impl IntoIterator<Item = (impl Into<String>, impl Into<String>)>,
    ) -> Self {
        Self {
            top_k,
            display_names: display_names
                .into_iter()
                .map(|(label, text)| (label.into(), text.into()))
                .collect(),
        }
    }

    /// Render the top-K entries as `"<text>: <pct>%"`, joined by `"; "`.
    ///
    /// The sort is stable, so labels with equal scores keep the order the
    /// backend emitted them in.
    pub fn aggregate(&self, result: ClassificationResult) -> String {
        let mut scores = result.scores;
        scores.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        scores
            .iter()
            .take(self.top_k)
            .filter_map(|entry| {
                self.display_names
                    .get(&entry.label)
                    .map(|text| format!("{}: {:.1}%", text, entry.score * 100.0))
            })
            .collect::<Vec<_>>()
            .join(ENTRY_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smile_aggregator(top_k: usize) -> ResultAggregator {
        ResultAggregator::new(top_k, [("smile", "Smiling"), ("no face", "No face")])
    }

    #[test]
    fn top_one_picks_the_highest_score() {
        let aggregator = smile_aggregator(1);
        let result = ClassificationResult::from_pairs([("smile", 0.82), ("no face", 0.65)]);

        assert_eq!(aggregator.aggregate(result), "Smiling: 82.0%");
    }

    #[test]
    fn equal_scores_keep_backend_order() {
        let aggregator = smile_aggregator(2);
        let result = ClassificationResult::from_pairs([("no face", 0.5), ("smile", 0.5)]);

        assert_eq!(aggregator.aggregate(result), "No face: 50.0%; Smiling: 50.0%");
    }

    #[test]
    fn unmapped_labels_are_silently_skipped() {
        let aggregator = smile_aggregator(2);
        let result = ClassificationResult::from_pairs([("frown", 0.99), ("smile", 0.42)]);

        assert_eq!(aggregator.aggregate(result), "Smiling: 42.0%");
    }

    #[test]
    fn zero_k_or_nothing_mapped_renders_empty() {
        let result = ClassificationResult::from_pairs([("smile", 0.9)]);
        assert_eq!(smile_aggregator(0).aggregate(result.clone()), "");

        let unmapped = ClassificationResult::from_pairs([("frown", 0.9)]);
        assert_eq!(smile_aggregator(1).aggregate(unmapped), "");
    }

    #[test]
    fn score_is_formatted_to_one_decimal() {
        let aggregator = smile_aggregator(1);
        let result = ClassificationResult::from_pairs([("no face", 0.93)]);

        assert_eq!(aggregator.aggregate(result), "No face: 93.0%");
    }
}
