// rest/mod.rs — Public REST API server.
//
// Axum HTTP server, local only by default.
//
// Endpoints:
//   POST /api/v1/answers
//   GET  /api/v1/exams/{exam_id}/audit
//   GET  /api/v1/exams/{exam_id}/questions/{question_id}/students/{student_id}/history
//   GET  /api/v1/exams/{exam_id}/questions/{question_id}/students/{student_id}/history/verify
//   GET  /api/v1/health

pub mod routes;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::AppContext;

/// Serve the REST API until `shutdown` resolves, then drain open
/// connections before returning — in-flight audits finish their response.
pub async fn start_rest_server(
    ctx: Arc<AppContext>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let bind = format!("{}:{}", ctx.config.bind_address, ctx.config.port);
    let addr: SocketAddr = bind.parse()?;

    let router = build_router(ctx);

    info!("REST API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("REST server stopped");
    Ok(())
}

pub fn build_router(ctx: Arc<AppContext>) -> Router {
    Router::new()
        // Health
        .route("/api/v1/health", get(routes::health::health))
        // Answer submission (writes to the revision ledger)
        .route("/api/v1/answers", post(routes::answers::submit_answer))
        // Collusion audit
        .route(
            "/api/v1/exams/{exam_id}/audit",
            get(routes::audit::audit_exam),
        )
        // Raw revision trail for one (exam, question, student) key
        .route(
            "/api/v1/exams/{exam_id}/questions/{question_id}/students/{student_id}/history",
            get(routes::audit::revision_history),
        )
        // Ledger tamper-evidence check for the same key
        .route(
            "/api/v1/exams/{exam_id}/questions/{question_id}/students/{student_id}/history/verify",
            get(routes::audit::verify_history),
        )
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
