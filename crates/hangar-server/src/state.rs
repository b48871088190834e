use hangar_core::target::TierSchedule;
use hangar_db::Database;

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    pub db: Database,
    /// Bearer token required on every `/v1` route.
    pub api_token: String,
    /// Tier frequencies used to compute the due count in `/v1/stats`.
    pub schedule: TierSchedule,
}
