// rest/routes/answers.rs — answer submission (ledger writes).

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use crate::ledger::RevisionStore as _;
use crate::AppContext;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub student_id: String,
    pub exam_id: String,
    pub question_id: String,
    pub ans: String,
}

/// Append one answer revision to the ledger. Re-submitting the same
/// question extends the history — edits are the whole point.
pub async fn submit_answer(
    State(ctx): State<Arc<AppContext>>,
    Json(body): Json<SubmitAnswerRequest>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    if body.student_id.is_empty() || body.exam_id.is_empty() || body.question_id.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "studentId, examId and questionId are required" })),
        ));
    }

    let submitted_at = chrono::Utc::now().timestamp();
    let row = ctx
        .ledger
        .append(
            &body.exam_id,
            &body.question_id,
            &body.student_id,
            &body.ans,
            submitted_at,
        )
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
        })?;

    info!(
        exam = %row.exam_id,
        question = %row.question_id,
        student = %row.student_id,
        seq = row.seq,
        "answer revision recorded"
    );
    Ok(StatusCode::NO_CONTENT)
}
