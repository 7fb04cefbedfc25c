use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 4310;
/// Default audit threshold: every pair with a strictly positive score is
/// reported. The engine is agnostic to where this value comes from — it
/// is read here once and threaded into the report builder as a parameter.
const DEFAULT_SUSPICION_THRESHOLD: f64 = 0.0;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── TOML config file ─────────────────────────────────────────────────────────

/// `{data_dir}/config.toml` — all fields are optional overrides.
/// Priority: CLI / env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// REST server port (default: 4310).
    port: Option<u16>,
    /// Bind address for the REST server (default: "127.0.0.1").
    bind_address: Option<String>,
    /// Log level filter string, e.g. "debug", "info,proctord=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default, human-readable) | "json" (structured for log aggregators).
    log_format: Option<String>,
    /// Minimum suspicion score (exclusive) for a pair to appear in an
    /// audit report (default: 0.0).
    suspicion_score_threshold: Option<f64>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── ProctordConfig ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ProctordConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub log: String,
    /// Bind address for the REST server (PROCTORD_BIND env var).
    pub bind_address: String,
    /// Log output format: "pretty" (default) | "json".
    pub log_format: String,
    /// Default audit threshold, overridable per request via `?threshold=`.
    pub suspicion_score_threshold: f64,
}

impl ProctordConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
        suspicion_score_threshold: Option<f64>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        // Load TOML as the lowest-priority override layer
        let toml = load_toml(&data_dir).unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let bind_address = bind_address
            .or(std::env::var("PROCTORD_BIND").ok().filter(|s| !s.is_empty()))
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);

        let log_format = std::env::var("PROCTORD_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());

        let suspicion_score_threshold = suspicion_score_threshold
            .or(toml.suspicion_score_threshold)
            .unwrap_or(DEFAULT_SUSPICION_THRESHOLD);

        Self {
            port,
            data_dir,
            log,
            bind_address,
            log_format,
            suspicion_score_threshold,
        }
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/proctord
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("proctord");
        }
    }
    #[cfg(target_os = "linux")]
    {
        // $XDG_DATA_HOME/proctord or ~/.local/share/proctord
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("proctord");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("proctord");
        }
    }
    #[cfg(target_os = "windows")]
    {
        // %APPDATA%\proctord
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("proctord");
        }
    }
    // Fallback
    PathBuf::from(".proctord")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_toml() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ProctordConfig::new(None, Some(dir.path().to_path_buf()), None, None, None);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.log, "info");
        assert_eq!(cfg.suspicion_score_threshold, 0.0);
    }

    #[test]
    fn toml_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "port = 9000\nsuspicion_score_threshold = 0.4\n",
        )
        .unwrap();
        let cfg = ProctordConfig::new(None, Some(dir.path().to_path_buf()), None, None, None);
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.suspicion_score_threshold, 0.4);
    }

    #[test]
    fn cli_beats_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "port = 9000\nsuspicion_score_threshold = 0.4\n",
        )
        .unwrap();
        let cfg = ProctordConfig::new(
            Some(4444),
            Some(dir.path().to_path_buf()),
            None,
            None,
            Some(0.7),
        );
        assert_eq!(cfg.port, 4444);
        assert_eq!(cfg.suspicion_score_threshold, 0.7);
    }

    #[test]
    fn malformed_toml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "port = \"not a number").unwrap();
        let cfg = ProctordConfig::new(None, Some(dir.path().to_path_buf()), None, None, None);
        assert_eq!(cfg.port, DEFAULT_PORT);
    }
}
