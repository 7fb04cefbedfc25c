//! Collusion audit engine.
//!
//! Pure, synchronous core: takes per-student, per-question answer revision
//! histories and produces a suspicion report flagging student pairs whose
//! answer evolution is improbably correlated. No I/O, no state between
//! invocations — everything arrives materialized from the ledger and the
//! report is handed back to the caller.
//!
//! Pipeline: flat `AnswerRecord`s → [`aggregate::aggregate_revisions`] →
//! [`report::build_report`] → (per pair, per shared question)
//! [`scorer::PairwiseScorer`] → [`AuditReport`].

pub mod aggregate;
pub mod report;
pub mod scorer;
pub mod signals;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One timestamped answer submission (including edits) for a
/// (student, question) pair. Immutable once read from the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    /// Answer text as submitted.
    pub answer: String,
    /// Submission time, UNIX seconds. Non-decreasing within one history.
    pub submitted_at: i64,
}

/// Flattened ledger record — one revision tagged with its owning
/// (student, question) key. The aggregator's input shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub student_id: String,
    pub question_id: String,
    pub answer: String,
    pub submitted_at: i64,
}

/// Ordered revision history for one (student, question) pair,
/// oldest → newest.
pub type StudentQuestionHistory = Vec<Revision>;

/// student id → question id → revision history.
///
/// `BTreeMap` on both levels so enumeration order is canonical: the report
/// builder walks this structure directly and its output must be
/// reproducible across runs. Built fresh per audit call, dropped after.
pub type AggregatedHistories = BTreeMap<String, BTreeMap<String, StudentQuestionHistory>>;

/// A scored relationship between two students on one question.
///
/// Undirected: `student_a` is always the lexicographically smaller id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspicionEdge {
    pub student_a: String,
    pub student_b: String,
    pub question_id: String,
    /// Weighted sum of three [0, 1] signals; always within [0, 1].
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// The full audit result for one exam: every (pair, question) edge whose
/// score strictly exceeded the threshold, sorted by
/// `(student_a, student_b, question_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditReport {
    pub exam_id: String,
    pub edges: Vec<SuspicionEdge>,
}
