// NeuRazor Analytics - Core Library
// Exposes all modules for use in the terminal dashboard, web server, and tests

pub mod analytics;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod games;
pub mod logging;
pub mod mock_data;
pub mod web;

// Re-export commonly used types
pub use analytics::{
    AnalyticsFilter, AnalyticsReport, DisplayRow, HistogramBin, Statistics,
    build_histogram, compute_statistics, detect_outliers, filter_candidates,
    HISTOGRAM_BINS,
};
pub use auth::{
    AuthError, AuthGate, AuthService, AuthState, AuthStateChange, AuthTimeouts,
    MemoryAuth, Session, SupabaseAuth, User, UserDirectory, ADMIN_ROLE,
};
pub use config::{AppConfig, AuthConfig, AuthProviderKind, ConfigError, UserAccount};
pub use dashboard::{DashboardState, Route, RouteDecision};
pub use games::{Accent, GameType, UnknownGame};
pub use mock_data::{CandidateRecord, GameDetails, GameMockData, MockDataset};

use std::sync::Arc;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Builds one auth client per login context (one per browser session on the
/// server, one for the terminal dashboard).
#[derive(Clone)]
pub enum AuthBackend {
    Supabase { http: reqwest::Client, config: AuthConfig },
    Memory(Arc<UserDirectory>),
}

impl AuthBackend {
    pub fn from_config(config: &AuthConfig) -> Self {
        match config.provider {
            AuthProviderKind::Supabase => AuthBackend::Supabase {
                http: reqwest::Client::new(),
                config: config.clone(),
            },
            AuthProviderKind::Memory => {
                AuthBackend::Memory(Arc::new(UserDirectory::from_accounts(&config.users)))
            }
        }
    }

    pub fn new_client(&self) -> Result<Arc<dyn AuthService>, ConfigError> {
        match self {
            AuthBackend::Supabase { http, config } => {
                Ok(Arc::new(SupabaseAuth::from_config(http.clone(), config)?))
            }
            AuthBackend::Memory(directory) => Ok(Arc::new(MemoryAuth::new(directory.clone()))),
        }
    }
}
