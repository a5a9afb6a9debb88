use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct ShellDiagnostics {
    pub(super) phase: String,
    pub(super) detail: String,
    pub(super) last_error: Option<String>,
    pub(super) boot_started_at_unix_ms: Option<u64>,
    pub(super) boot_total_latency_ms: Option<u64>,
    pub(super) names_loaded: bool,
    pub(super) status_refreshes: u64,
    pub(super) status_failures: u64,
    pub(super) last_status_at_unix_ms: Option<u64>,
    pub(super) poll_interval_ms: Option<u64>,
}
