//! History aggregator — reshapes the ledger's flat revision records into
//! the per-student, per-question structure the report builder walks.

use super::{AggregatedHistories, AnswerRecord, Revision};

/// Group flat `(student, question, answer, submitted_at)` records into
/// nested per-student, per-question histories.
///
/// Pure reshaping: arrival order is preserved within each history, nothing
/// is deduplicated or re-sorted — the ledger already returns revisions in
/// submission (`seq`) order. Empty input yields an empty map.
pub fn aggregate_revisions(records: impl IntoIterator<Item = AnswerRecord>) -> AggregatedHistories {
    let mut out = AggregatedHistories::new();
    for rec in records {
        out.entry(rec.student_id)
            .or_default()
            .entry(rec.question_id)
            .or_default()
            .push(Revision {
                answer: rec.answer,
                submitted_at: rec.submitted_at,
            });
    }
    out
}
