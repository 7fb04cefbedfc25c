//! Report builder — orchestrates the full exam-level audit.

use tracing::debug;

use super::scorer::PairwiseScorer;
use super::{AggregatedHistories, AuditReport, SuspicionEdge};

/// Build the suspicion report for one exam.
///
/// Enumerates every unordered student pair in sorted-id order; for every
/// question **both** students answered, scores the pair with `scorer` and
/// emits one edge per qualifying (pair, question). An edge qualifies only
/// when `score > threshold` — strict inequality, a score exactly equal to
/// the threshold is dropped. Cross-question scores are never averaged into
/// a single pair-level edge.
///
/// Deterministic: `AggregatedHistories` is a `BTreeMap`, so for a fixed
/// input and threshold the edge list (content and order) is reproducible
/// across runs. Edges come out sorted by
/// `(student_a, student_b, question_id)` by construction.
pub fn build_report(
    exam_id: &str,
    histories: &AggregatedHistories,
    threshold: f64,
    scorer: &PairwiseScorer,
) -> AuditReport {
    let students: Vec<&String> = histories.keys().collect();
    let mut edges = Vec::new();

    for (i, a_id) in students.iter().enumerate() {
        let a_questions = &histories[*a_id];
        for b_id in &students[i + 1..] {
            let b_questions = &histories[*b_id];
            // BTreeMap iteration keeps the per-pair edges question-sorted.
            for (question_id, a_history) in a_questions {
                let Some(b_history) = b_questions.get(question_id) else {
                    continue;
                };
                if a_history.is_empty() || b_history.is_empty() {
                    continue;
                }

                let score = scorer.score_pair(a_history, b_history);
                debug!(
                    student_a = %a_id,
                    student_b = %b_id,
                    question = %question_id,
                    score,
                    "pair scored"
                );
                if score > threshold {
                    edges.push(SuspicionEdge {
                        student_a: (*a_id).clone(),
                        student_b: (*b_id).clone(),
                        question_id: question_id.clone(),
                        score,
                        reason: Some(format!("similarity-{score:.3}")),
                    });
                }
            }
        }
    }

    AuditReport {
        exam_id: exam_id.to_string(),
        edges,
    }
}
