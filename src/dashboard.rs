// 🧭 Dashboard state - routes, access decisions, game selection

use crate::analytics::AnalyticsFilter;
use crate::auth::AuthState;
use crate::games::GameType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    Login,
    Dashboard,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Dashboard => "/dashboard",
        }
    }
}

/// What a protected route does for the current auth state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Still checking authentication
    Loading,
    RedirectToLogin,
    Allow,
}

impl RouteDecision {
    pub fn for_state(state: &AuthState) -> Self {
        if state.loading {
            RouteDecision::Loading
        } else if state.user.is_none() || !state.is_admin {
            RouteDecision::RedirectToLogin
        } else {
            RouteDecision::Allow
        }
    }
}

/// Selection and filter state of one dashboard view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    pub selected_game: Option<GameType>,
    pub filter: AnalyticsFilter,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select_game(&mut self, game: GameType) {
        self.selected_game = Some(game);
    }

    /// Back to the selector; filter values are kept.
    pub fn back_to_selection(&mut self) {
        self.selected_game = None;
    }

    pub fn title(&self) -> &'static str {
        self.selected_game
            .map(|g| g.display_name())
            .unwrap_or("Analytics")
    }
}
