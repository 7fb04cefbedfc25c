//! Append-only revision ledger.
//!
//! The system of record for answer histories: one SQLite row per submitted
//! revision, keyed `(exam, question, student, seq)`, never updated or
//! deleted. Each row carries a SHA-256 hash chained to its predecessor
//! within the same key, so post-hoc edits to the history are detectable
//! via [`Ledger::verify_chain`]. The audit engine itself never verifies —
//! it trusts the histories this layer hands it.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::{sqlite::SqliteConnectOptions, ConnectOptions as _, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

use crate::audit::AnswerRecord;

/// Anchor value for the first revision of a key's chain.
const GENESIS_HASH: &str = "genesis";

/// Default timeout for individual SQLite queries. Prevents a hung query
/// from blocking the daemon indefinitely.
const QUERY_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Queries slower than this are logged at WARN level.
const SLOW_QUERY_THRESHOLD: std::time::Duration = std::time::Duration::from_millis(100);

// ─── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The stored hash chain diverges from the recomputed one at `seq` —
    /// the history has been tampered with (or the file is corrupt).
    #[error("hash chain mismatch for {exam_id}/{question_id}/{student_id} at seq {seq}")]
    ChainMismatch {
        exam_id: String,
        question_id: String,
        student_id: String,
        seq: i64,
    },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("query timed out after {}s", QUERY_TIMEOUT.as_secs())]
    Timeout,

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Rows ─────────────────────────────────────────────────────────────────────

/// One persisted answer revision.
#[derive(Debug, Clone, sqlx::FromRow, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionRow {
    pub id: String,
    pub exam_id: String,
    pub question_id: String,
    pub student_id: String,
    /// Position within this key's history, starting at 0.
    pub seq: i64,
    pub answer: String,
    /// UNIX seconds, assigned by the server clock at append time.
    pub submitted_at: i64,
    pub prev_hash: String,
    pub entry_hash: String,
}

// ─── Store seam ───────────────────────────────────────────────────────────────

/// Revision store contract the audit pipeline consumes.
///
/// Returned histories are ordered oldest → newest (by `seq`); the
/// aggregator relies on this and does not re-sort.
#[async_trait]
pub trait RevisionStore: Send + Sync {
    /// Append one revision for `(exam, question, student)` with the given
    /// server-side timestamp. Returns the stored row.
    async fn append(
        &self,
        exam_id: &str,
        question_id: &str,
        student_id: &str,
        answer: &str,
        submitted_at: i64,
    ) -> Result<RevisionRow, LedgerError>;

    /// Full revision history for one key, in submission order.
    async fn history(
        &self,
        exam_id: &str,
        question_id: &str,
        student_id: &str,
    ) -> Result<Vec<RevisionRow>, LedgerError>;

    /// Flattened union of every `(question, student)` history for one
    /// exam — the aggregator's input. Produced by repeated `history`
    /// calls, so per-key submission order is preserved.
    async fn exam_revisions(
        &self,
        exam_id: &str,
        question_ids: &[String],
        student_ids: &[String],
    ) -> Result<Vec<AnswerRecord>, LedgerError> {
        let mut out = Vec::new();
        for student_id in student_ids {
            for question_id in question_ids {
                for row in self.history(exam_id, question_id, student_id).await? {
                    out.push(AnswerRecord {
                        student_id: row.student_id,
                        question_id: row.question_id,
                        answer: row.answer,
                        submitted_at: row.submitted_at,
                    });
                }
            }
        }
        Ok(out)
    }
}

// ─── SQLite ledger ────────────────────────────────────────────────────────────

pub struct Ledger {
    pool: SqlitePool,
}

impl Ledger {
    /// Open (or create) the ledger database at `{data_dir}/proctord.db`.
    pub async fn new(data_dir: &Path) -> Result<Self, LedgerError> {
        tokio::fs::create_dir_all(data_dir).await?;
        let db_path = data_dir.join("proctord.db");
        let opts =
            SqliteConnectOptions::from_str(&format!("sqlite://{}?mode=rwc", db_path.display()))?
                .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
                .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
                .create_if_missing(true)
                .log_slow_statements(log::LevelFilter::Warn, SLOW_QUERY_THRESHOLD);

        let pool = SqlitePool::connect_with(opts).await?;
        sqlx::migrate!("src/ledger/migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Return a clone of the connection pool (cheap — Arc-backed).
    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    /// Recompute the hash chain for one key and compare it against the
    /// stored hashes. Returns the chain length on success.
    pub async fn verify_chain(
        &self,
        exam_id: &str,
        question_id: &str,
        student_id: &str,
    ) -> Result<usize, LedgerError> {
        let rows = self.history(exam_id, question_id, student_id).await?;
        let mut prev = GENESIS_HASH.to_string();
        for row in &rows {
            let expected = chain_hash(
                &prev,
                exam_id,
                question_id,
                student_id,
                row.seq,
                &row.answer,
                row.submitted_at,
            );
            if row.prev_hash != prev || row.entry_hash != expected {
                return Err(LedgerError::ChainMismatch {
                    exam_id: exam_id.to_string(),
                    question_id: question_id.to_string(),
                    student_id: student_id.to_string(),
                    seq: row.seq,
                });
            }
            prev = expected;
        }
        Ok(rows.len())
    }
}

/// `hex(sha256(prev ‖ exam ‖ question ‖ student ‖ seq ‖ answer ‖ t))`,
/// every field length-prefixed so adjacent fields cannot be confused.
fn chain_hash(
    prev_hash: &str,
    exam_id: &str,
    question_id: &str,
    student_id: &str,
    seq: i64,
    answer: &str,
    submitted_at: i64,
) -> String {
    let mut hasher = Sha256::new();
    for field in [prev_hash, exam_id, question_id, student_id, answer] {
        hasher.update((field.len() as u64).to_le_bytes());
        hasher.update(field.as_bytes());
    }
    hasher.update(seq.to_le_bytes());
    hasher.update(submitted_at.to_le_bytes());
    hex::encode(hasher.finalize())
}

/// Tip lookup + insert for one revision. Must run inside an immediate
/// transaction on `conn` — the caller holds the write lock.
async fn append_locked(
    conn: &mut sqlx::SqliteConnection,
    exam_id: &str,
    question_id: &str,
    student_id: &str,
    answer: &str,
    submitted_at: i64,
) -> Result<RevisionRow, LedgerError> {
    let tip: Option<(i64, String)> = sqlx::query_as(
        "SELECT seq, entry_hash FROM revisions \
         WHERE exam_id = ? AND question_id = ? AND student_id = ? \
         ORDER BY seq DESC LIMIT 1",
    )
    .bind(exam_id)
    .bind(question_id)
    .bind(student_id)
    .fetch_optional(&mut *conn)
    .await?;

    let (seq, prev_hash) = match tip {
        Some((tip_seq, tip_hash)) => (tip_seq + 1, tip_hash),
        None => (0, GENESIS_HASH.to_string()),
    };
    let entry_hash = chain_hash(
        &prev_hash,
        exam_id,
        question_id,
        student_id,
        seq,
        answer,
        submitted_at,
    );

    let row = RevisionRow {
        id: Uuid::new_v4().to_string(),
        exam_id: exam_id.to_string(),
        question_id: question_id.to_string(),
        student_id: student_id.to_string(),
        seq,
        answer: answer.to_string(),
        submitted_at,
        prev_hash,
        entry_hash,
    };

    sqlx::query(
        "INSERT INTO revisions \
         (id, exam_id, question_id, student_id, seq, answer, submitted_at, prev_hash, entry_hash) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&row.id)
    .bind(&row.exam_id)
    .bind(&row.question_id)
    .bind(&row.student_id)
    .bind(row.seq)
    .bind(&row.answer)
    .bind(row.submitted_at)
    .bind(&row.prev_hash)
    .bind(&row.entry_hash)
    .execute(&mut *conn)
    .await?;

    Ok(row)
}

/// Execute a future with the standard query timeout.
async fn with_timeout<T>(
    fut: impl std::future::Future<Output = Result<T, LedgerError>>,
) -> Result<T, LedgerError> {
    match tokio::time::timeout(QUERY_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => Err(LedgerError::Timeout),
    }
}

#[async_trait]
impl RevisionStore for Ledger {
    async fn append(
        &self,
        exam_id: &str,
        question_id: &str,
        student_id: &str,
        answer: &str,
        submitted_at: i64,
    ) -> Result<RevisionRow, LedgerError> {
        with_timeout(async {
            // BEGIN IMMEDIATE takes the write lock before the tip lookup,
            // so concurrent submitters for the same key serialize instead
            // of reading the same tip and racing for the same seq. A
            // deferred transaction would only lock at the INSERT, by
            // which point both writers hold the old tip.
            let mut conn = self.pool.acquire().await?;
            sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;

            match append_locked(
                &mut conn,
                exam_id,
                question_id,
                student_id,
                answer,
                submitted_at,
            )
            .await
            {
                Ok(row) => {
                    sqlx::query("COMMIT").execute(&mut *conn).await?;
                    Ok(row)
                }
                Err(e) => {
                    let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                    Err(e)
                }
            }
        })
        .await
    }

    async fn history(
        &self,
        exam_id: &str,
        question_id: &str,
        student_id: &str,
    ) -> Result<Vec<RevisionRow>, LedgerError> {
        with_timeout(async {
            let rows = sqlx::query_as::<_, RevisionRow>(
                "SELECT id, exam_id, question_id, student_id, seq, answer, submitted_at, \
                        prev_hash, entry_hash \
                 FROM revisions \
                 WHERE exam_id = ? AND question_id = ? AND student_id = ? \
                 ORDER BY seq ASC",
            )
            .bind(exam_id)
            .bind(question_id)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;
            Ok(rows)
        })
        .await
    }
}
