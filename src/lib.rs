pub mod audit;
pub mod config;
pub mod ledger;
pub mod rest;
pub mod roster;

use std::sync::Arc;

use config::ProctordConfig;
use ledger::Ledger;
use roster::Roster;

/// Shared application state passed to every REST handler.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ProctordConfig>,
    /// Append-only answer revision store (the system of record).
    pub ledger: Arc<Ledger>,
    /// Static exam/question definitions and the enrolled roster.
    pub roster: Arc<Roster>,
    pub started_at: std::time::Instant,
}
