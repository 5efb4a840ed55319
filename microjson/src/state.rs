use axum::extract::FromRef;
use chrono::Utc;

use crate::{config::Config, db::connection::DbPool, types::DateTime};

/// Identity of the running process, reported by `/up` and the version header.
#[derive(Debug, Clone)]
pub struct ServiceInfo {
    pub version: String,
    pub hostname: String,
    pub booted: DateTime,
}

impl ServiceInfo {
    pub fn new(version: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            hostname: hostname.into(),
            booted: DateTime::now(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.version.clone(), config.hostname.clone())
    }

    pub fn uptime_seconds(&self) -> f64 {
        let elapsed = Utc::now() - self.booted.into_inner();
        elapsed.num_milliseconds().max(0) as f64 / 1000.0
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Config,
    pub service: ServiceInfo,
}

impl AppState {
    pub fn new(pool: DbPool, config: Config) -> Self {
        let service = ServiceInfo::from_config(&config);
        Self {
            pool,
            config,
            service,
        }
    }
}

impl FromRef<AppState> for ServiceInfo {
    fn from_ref(state: &AppState) -> Self {
        state.service.clone()
    }
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}
