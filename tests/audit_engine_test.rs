//! End-to-end scenarios for the collusion audit engine, exercised through
//! the public library API (flat records → aggregate → report).
//!
//! Scenarios mirror the instructor-facing cases:
//! 1. High collusion — matching final answers, near-simultaneous edits
//! 2. Moderate collusion — matching final answers, edits 40 s apart
//! 3. No collusion — diverging final answers
//! plus threshold-boundary and determinism checks.

use proctord::audit::aggregate::aggregate_revisions;
use proctord::audit::report::build_report;
use proctord::audit::scorer::PairwiseScorer;
use proctord::audit::signals::{EditPattern, PairSignal as _};
use proctord::audit::{AnswerRecord, Revision};

const T0: i64 = 1_700_000_000;

fn rec(student: &str, question: &str, answer: &str, at: i64) -> AnswerRecord {
    AnswerRecord {
        student_id: student.to_string(),
        question_id: question.to_string(),
        answer: answer.to_string(),
        submitted_at: at,
    }
}

// ─── Scenario 1: high collusion ───────────────────────────────────────────────

#[test]
fn high_collusion_is_flagged() {
    // s1 revises A → C at t0 and t0+10; s2 submits C once at t0.
    let histories = aggregate_revisions(vec![
        rec("s1", "q1", "A", T0),
        rec("s2", "q1", "C", T0),
        rec("s1", "q1", "C", T0 + 10),
    ]);

    let report = build_report("exam170126", &histories, 0.0, &PairwiseScorer::default());

    assert_eq!(report.exam_id, "exam170126");
    assert_eq!(report.edges.len(), 1);
    let edge = &report.edges[0];
    assert_eq!((edge.student_a.as_str(), edge.student_b.as_str()), ("s1", "s2"));
    assert!(edge.score > 0.0);
    // Final answers identical (0.5) + aligned first revisions simultaneous
    // (0.3); the first answers differ so edit pattern contributes nothing.
    assert!((edge.score - 0.8).abs() < 1e-9, "score was {}", edge.score);
}

// ─── Scenario 2: moderate collusion ───────────────────────────────────────────

#[test]
fn moderate_collusion_scores_below_high() {
    // Both students make two revisions so the 10 s vs 40 s gap lands
    // inside the aligned window (front alignment truncates tails, so a
    // lone tail revision would never be compared).
    let tight = aggregate_revisions(vec![
        rec("s1", "q1", "A", T0),
        rec("s2", "q1", "A", T0),
        rec("s1", "q1", "C", T0 + 10),
        rec("s2", "q1", "C", T0 + 20),
    ]);
    let loose = aggregate_revisions(vec![
        rec("s1", "q1", "A", T0),
        rec("s2", "q1", "A", T0),
        rec("s1", "q1", "C", T0 + 10),
        rec("s2", "q1", "C", T0 + 50),
    ]);

    let scorer = PairwiseScorer::default();
    let tight_report = build_report("e1", &tight, 0.0, &scorer);
    let loose_report = build_report("e1", &loose, 0.0, &scorer);

    let tight_score = tight_report.edges[0].score;
    let loose_score = loose_report.edges[0].score;
    assert!(
        loose_score < tight_score,
        "expected {loose_score} < {tight_score}"
    );
    // Both still exceed a low threshold: final answers match either way.
    let low_bar = build_report("e1", &loose, 0.5, &scorer);
    assert_eq!(low_bar.edges.len(), 1);
}

// ─── Scenario 3: no collusion ─────────────────────────────────────────────────

#[test]
fn diverging_answers_are_not_flagged_at_a_high_threshold() {
    // s1 ends on "D", s2 on "C" — no shared edit trail, different finals.
    let histories = aggregate_revisions(vec![
        rec("s1", "q1", "A", T0),
        rec("s2", "q1", "C", T0),
        rec("s1", "q1", "D", T0 + 40),
    ]);

    // The edit trails never match.
    assert_eq!(
        EditPattern.score(&histories["s1"]["q1"], &histories["s2"]["q1"]),
        0.0
    );

    let report = build_report("e1", &histories, 0.9, &PairwiseScorer::default());
    assert!(report.edges.is_empty());
}

// ─── Threshold boundary ───────────────────────────────────────────────────────

#[test]
fn score_equal_to_threshold_is_excluded() {
    // This pair scores exactly 0.8 (identical finals + simultaneous first
    // revisions, mismatched first answers).
    let histories = aggregate_revisions(vec![
        rec("s1", "q1", "A", T0),
        rec("s2", "q1", "C", T0),
        rec("s1", "q1", "C", T0 + 10),
    ]);
    let scorer = PairwiseScorer::default();

    let at = build_report("e1", &histories, 0.8, &scorer);
    assert!(at.edges.is_empty(), "score == threshold must not be reported");

    let just_below = build_report("e1", &histories, 0.8 - 1e-9, &scorer);
    assert_eq!(just_below.edges.len(), 1);
}

// ─── Determinism ──────────────────────────────────────────────────────────────

#[test]
fn report_is_reproducible_and_input_order_independent() {
    let records = vec![
        rec("walter", "q2", "42", T0),
        rec("alice", "q1", "A", T0),
        rec("walter", "q1", "C", T0 + 5),
        rec("alice", "q1", "C", T0 + 12),
        rec("alice", "q2", "41", T0 + 3),
        rec("mallory", "q1", "C", T0 + 8),
    ];

    let mut shuffled = records.clone();
    shuffled.reverse();

    let scorer = PairwiseScorer::default();
    let a = build_report("e1", &aggregate_revisions(records), 0.2, &scorer);
    let b = build_report("e1", &aggregate_revisions(shuffled.clone()), 0.2, &scorer);
    let c = build_report("e1", &aggregate_revisions(shuffled), 0.2, &scorer);

    // Same run twice: structurally identical. Reversed arrival order only
    // reverses *within-history* order (which is semantic); here every
    // history is key-unique per timestamp so the edge sets must agree on
    // membership and ordering.
    assert_eq!(b, c);
    for edges in [&a.edges, &b.edges] {
        let mut sorted = edges.clone();
        sorted.sort_by(|x, y| {
            (&x.student_a, &x.student_b, &x.question_id)
                .cmp(&(&y.student_a, &y.student_b, &y.question_id))
        });
        assert_eq!(&sorted, edges, "edges must come out canonically sorted");
    }
}

#[test]
fn multi_question_pairs_get_one_edge_per_question() {
    let histories = aggregate_revisions(vec![
        rec("s1", "q1", "C", T0),
        rec("s2", "q1", "C", T0),
        rec("s1", "q2", "same answer", T0 + 60),
        rec("s2", "q2", "same answer", T0 + 60),
    ]);
    let report = build_report("e1", &histories, 0.0, &PairwiseScorer::default());

    let questions: Vec<&str> = report.edges.iter().map(|e| e.question_id.as_str()).collect();
    assert_eq!(questions, vec!["q1", "q2"]);
}

#[test]
fn pair_needs_both_students_on_the_question() {
    let histories = aggregate_revisions(vec![
        rec("s1", "q1", "C", T0),
        rec("s2", "q2", "C", T0),
        rec("s3", "q1", "C", T0),
    ]);
    let report = build_report("e1", &histories, 0.0, &PairwiseScorer::default());

    // Only s1↔s3 share q1.
    assert_eq!(report.edges.len(), 1);
    assert_eq!(report.edges[0].student_a, "s1");
    assert_eq!(report.edges[0].student_b, "s3");

    let one_revision: Vec<Revision> = histories["s2"]["q2"].clone();
    assert_eq!(one_revision.len(), 1);
}
