//! Suspicion sub-signals.
//!
//! Each signal scores one pair of revision histories (same question, both
//! non-empty) into [0, 1], independently of the others. They are expressed
//! as swappable strategies behind [`PairSignal`] so a stronger measure
//! (e.g. a true edit distance) can replace the length-ratio heuristic
//! without touching the report builder.

use super::Revision;

/// Seconds within which two revisions count as time-correlated at all.
/// A delta of 0 scores 1.0, decaying linearly to 0.0 at this window.
const TIME_WINDOW_SECS: f64 = 60.0;

/// One scoring strategy over a pair of same-question histories.
///
/// Implementations must be pure and symmetric where the signal definition
/// is symmetric; the report builder evaluates each unordered pair once.
pub trait PairSignal: Send + Sync {
    fn name(&self) -> &'static str;

    /// Score two histories into [0, 1]. Histories are oldest → newest.
    fn score(&self, a: &[Revision], b: &[Revision]) -> f64;
}

// ─── Final-answer similarity ──────────────────────────────────────────────────

/// Compares the *last* (most recent) answer text from each history.
///
/// Identical texts score 1.0; otherwise the score is the byte-length ratio
/// `min(len) / max(len)` — a deliberately cheap proxy for textual
/// closeness that avoids quadratic string algorithms on large answers.
/// Either side empty scores 0.0.
pub struct FinalAnswerSimilarity;

impl PairSignal for FinalAnswerSimilarity {
    fn name(&self) -> &'static str {
        "final_answer_similarity"
    }

    fn score(&self, a: &[Revision], b: &[Revision]) -> f64 {
        let (Some(last_a), Some(last_b)) = (a.last(), b.last()) else {
            return 0.0;
        };
        let (a, b) = (last_a.answer.as_str(), last_b.answer.as_str());
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        if a == b {
            return 1.0;
        }
        let (min, max) = if a.len() < b.len() {
            (a.len(), b.len())
        } else {
            (b.len(), a.len())
        };
        min as f64 / max as f64
    }
}

// ─── Time correlation ─────────────────────────────────────────────────────────

/// Compares submission timestamps revision-by-revision.
///
/// The histories are aligned on their **earliest** `min(len)` revisions —
/// the longer history's tail is truncated before comparing. Per aligned
/// index the score is `max(0, 1 − |Δt| / 60)`, so revisions within the
/// same minute score near 1 and anything 60 s apart or more scores 0; the
/// result is the mean over the aligned length. Empty alignment scores 0.
pub struct TimeCorrelation;

impl PairSignal for TimeCorrelation {
    fn name(&self) -> &'static str {
        "time_correlation"
    }

    fn score(&self, a: &[Revision], b: &[Revision]) -> f64 {
        let aligned = a.len().min(b.len());
        if aligned == 0 {
            return 0.0;
        }
        let sum: f64 = a
            .iter()
            .zip(b.iter())
            .map(|(ra, rb)| {
                let delta = (ra.submitted_at - rb.submitted_at).abs() as f64;
                (1.0 - delta / TIME_WINDOW_SECS).max(0.0)
            })
            .sum();
        sum / aligned as f64
    }
}

// ─── Edit pattern ─────────────────────────────────────────────────────────────

/// Compares the sequence of answer texts (the edit trail) pointwise.
///
/// Same front alignment as [`TimeCorrelation`]; an aligned index scores
/// 1.0 when both answers are textually identical, else 0.0, and the result
/// is the mean match rate. Empty alignment scores 0.
pub struct EditPattern;

impl PairSignal for EditPattern {
    fn name(&self) -> &'static str {
        "edit_pattern"
    }

    fn score(&self, a: &[Revision], b: &[Revision]) -> f64 {
        let aligned = a.len().min(b.len());
        if aligned == 0 {
            return 0.0;
        }
        let matches = a
            .iter()
            .zip(b.iter())
            .filter(|(ra, rb)| ra.answer == rb.answer)
            .count();
        matches as f64 / aligned as f64
    }
}
