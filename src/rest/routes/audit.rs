// rest/routes/audit.rs — collusion audit + revision history reads.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::audit::aggregate::aggregate_revisions;
use crate::audit::report::build_report;
use crate::audit::scorer::PairwiseScorer;
use crate::audit::AuditReport;
use crate::ledger::{LedgerError, RevisionStore as _};
use crate::AppContext;

#[derive(Deserialize)]
pub struct AuditParams {
    /// Per-request override of the configured suspicion threshold.
    pub threshold: Option<f64>,
}

/// Run the full collusion audit for one exam.
///
/// Roster lookup → ledger query for every (question, student) key →
/// aggregate → report. Any ledger failure aborts the request; a partial
/// report is never returned.
pub async fn audit_exam(
    State(ctx): State<Arc<AppContext>>,
    Path(exam_id): Path<String>,
    Query(params): Query<AuditParams>,
) -> Result<Json<AuditReport>, (StatusCode, Json<Value>)> {
    let Some(exam) = ctx.roster.exam(&exam_id) else {
        return Err((
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("unknown exam: {exam_id}") })),
        ));
    };

    let question_ids = ctx.roster.question_ids(exam);
    let student_ids = ctx.roster.student_ids();

    let records = ctx
        .ledger
        .exam_revisions(&exam_id, &question_ids, &student_ids)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": format!("ledger query failed: {e}") })),
            )
        })?;

    let histories = aggregate_revisions(records);
    let threshold = params
        .threshold
        .unwrap_or(ctx.config.suspicion_score_threshold);
    let report = build_report(&exam_id, &histories, threshold, &PairwiseScorer::default());

    info!(
        exam = %exam_id,
        students = histories.len(),
        edges = report.edges.len(),
        threshold,
        "audit complete"
    );
    Ok(Json(report))
}

/// Raw revision trail for one (exam, question, student) key.
pub async fn revision_history(
    State(ctx): State<Arc<AppContext>>,
    Path((exam_id, question_id, student_id)): Path<(String, String, String)>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let rows = ctx
        .ledger
        .history(&exam_id, &question_id, &student_id)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })?;

    Ok(Json(json!({ "revisions": rows })))
}

/// Recompute one key's hash chain against the stored hashes.
///
/// 409 with the offending seq when the chain diverges — the history has
/// been edited behind the ledger's back and no audit over it should be
/// trusted.
pub async fn verify_history(
    State(ctx): State<Arc<AppContext>>,
    Path((exam_id, question_id, student_id)): Path<(String, String, String)>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match ctx
        .ledger
        .verify_chain(&exam_id, &question_id, &student_id)
        .await
    {
        Ok(len) => Ok(Json(json!({ "revisions": len, "chainIntact": true }))),
        Err(e @ LedgerError::ChainMismatch { .. }) => Err((
            StatusCode::CONFLICT,
            Json(json!({ "error": e.to_string() })),
        )),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )),
    }
}
