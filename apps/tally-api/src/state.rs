//! Shared application state.

use std::sync::Arc;

use tally_db::Database;

use crate::auth::JwtManager;
use crate::config::ApiConfig;
use crate::services::{DocumentLifecycle, Notifier, ShiftService};

/// State handed to every handler. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
    pub jwt: Arc<JwtManager>,
    pub lifecycle: DocumentLifecycle,
    pub shifts: ShiftService,
}

impl AppState {
    /// Wires the services around `db`, notifying through `notifier`.
    pub fn new(db: Database, config: ApiConfig, notifier: Notifier) -> Self {
        let jwt = JwtManager::new(config.jwt_secret.clone(), config.jwt_access_lifetime_secs);
        let lifecycle = DocumentLifecycle::new(db.clone(), config.stock_policy(), notifier);
        let shifts = ShiftService::new(db.clone());

        AppState {
            db,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
            lifecycle,
            shifts,
        }
    }
}
