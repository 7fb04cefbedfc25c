//! Pairwise scorer — fuses the three sub-signals into one suspicion score.

use super::signals::{EditPattern, FinalAnswerSimilarity, PairSignal, TimeCorrelation};
use super::Revision;

/// Weight of the final-answer similarity signal. What was ultimately
/// submitted matters more than timing or edit shape.
const WEIGHT_FINAL_SIMILARITY: f64 = 0.5;
/// Weight of the time-correlation signal.
const WEIGHT_TIME_CORRELATION: f64 = 0.3;
/// Weight of the edit-pattern signal. Weights sum to exactly 1.0, so the
/// combined score stays within [0, 1].
const WEIGHT_EDIT_PATTERN: f64 = 0.2;

/// Scores one (student A, student B) pair restricted to one question.
///
/// Pure numeric function over two non-empty histories; holds no state
/// between calls. The individual signals are swappable via
/// [`PairwiseScorer::new`].
pub struct PairwiseScorer {
    final_similarity: Box<dyn PairSignal>,
    time_correlation: Box<dyn PairSignal>,
    edit_pattern: Box<dyn PairSignal>,
}

impl Default for PairwiseScorer {
    fn default() -> Self {
        Self::new(
            Box::new(FinalAnswerSimilarity),
            Box::new(TimeCorrelation),
            Box::new(EditPattern),
        )
    }
}

impl PairwiseScorer {
    /// Build a scorer from custom signal strategies. The weights are fixed
    /// design constants regardless of the strategies plugged in.
    pub fn new(
        final_similarity: Box<dyn PairSignal>,
        time_correlation: Box<dyn PairSignal>,
        edit_pattern: Box<dyn PairSignal>,
    ) -> Self {
        Self {
            final_similarity,
            time_correlation,
            edit_pattern,
        }
    }

    /// Combined suspicion score for two same-question histories, in [0, 1].
    ///
    /// Both histories must be non-empty — the report builder only invokes
    /// this for students who share the question. An empty history here is
    /// a caller bug; release builds return 0.0 rather than panic.
    pub fn score_pair(&self, a: &[Revision], b: &[Revision]) -> f64 {
        debug_assert!(
            !a.is_empty() && !b.is_empty(),
            "score_pair requires non-empty histories"
        );
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }

        WEIGHT_FINAL_SIMILARITY * self.final_similarity.score(a, b)
            + WEIGHT_TIME_CORRELATION * self.time_correlation.score(a, b)
            + WEIGHT_EDIT_PATTERN * self.edit_pattern.score(a, b)
    }
}
