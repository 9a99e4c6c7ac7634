// NeuRazor Analytics - Web Server
// Admin dashboard + JSON API with Axum

use anyhow::Context;
use axum::{
    extract::{Form, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Redirect, Response},
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use neurazor_analytics::web::{self, AnalyticsQuery};
use neurazor_analytics::{
    logging, AnalyticsFilter, AnalyticsReport, AppConfig, AuthBackend, AuthGate, AuthTimeouts,
    GameType, HistogramBin, MockDataset, Route, RouteDecision, Statistics, User,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::{Duration, Instant};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

const SESSION_COOKIE: &str = "neurazor_session";
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// One signed-in browser: its auth client and its generated data.
struct BrowserSession {
    gate: Arc<AuthGate>,
    data: Arc<MockDataset>,
    last_seen: Mutex<Instant>,
}

impl BrowserSession {
    fn new(gate: Arc<AuthGate>, data: MockDataset) -> Self {
        BrowserSession {
            gate,
            data: Arc::new(data),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        let last_seen = *self.last_seen.lock().unwrap_or_else(|e| e.into_inner());
        now.saturating_duration_since(last_seen)
    }
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    backend: AuthBackend,
    timeouts: AuthTimeouts,
    data_seed: Option<u64>,
    history_days: u32,
    idle_timeout: Duration,
    sessions: Arc<RwLock<HashMap<String, Arc<BrowserSession>>>>,
}

impl AppState {
    fn new(
        backend: AuthBackend,
        timeouts: AuthTimeouts,
        data_seed: Option<u64>,
        history_days: u32,
        idle_timeout: Duration,
    ) -> Self {
        AppState {
            backend,
            timeouts,
            data_seed,
            history_days,
            idle_timeout,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn from_config(config: &AppConfig) -> Self {
        AppState::new(
            AuthBackend::from_config(&config.auth),
            AuthTimeouts::from(&config.auth),
            config.data.seed,
            config.data.history_days,
            config.server.session_idle_timeout(),
        )
    }

    /// Session for the request's cookie; marks it as used.
    fn session(&self, jar: &CookieJar) -> Option<Arc<BrowserSession>> {
        let id = jar.get(SESSION_COOKIE)?.value().to_string();
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        let session = sessions.get(&id).cloned()?;
        session.touch();
        Some(session)
    }

    fn insert_session(&self, id: String, session: BrowserSession) {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.insert(id, Arc::new(session));
    }

    fn remove_session(&self, jar: &CookieJar) -> Option<Arc<BrowserSession>> {
        let id = jar.get(SESSION_COOKIE)?.value().to_string();
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.remove(&id)
    }

    /// Drop sessions that are signed out or idle past the timeout.
    fn sweep_sessions(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let before = sessions.len();
        sessions.retain(|_, session| {
            session.gate.decision() != RouteDecision::RedirectToLogin
                && session.idle_for(now) < self.idle_timeout
        });
        before - sessions.len()
    }

    fn session_count(&self) -> usize {
        self.sessions.read().unwrap_or_else(|e| e.into_inner()).len()
    }
}

fn spawn_session_sweeper(state: AppState) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let evicted = state.sweep_sessions(Instant::now());
            if evicted > 0 {
                info!(evicted, remaining = state.session_count(), "expired dashboard sessions dropped");
            }
        }
    })
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Game list entry
#[derive(Serialize)]
struct GameResponse {
    game_type: GameType,
    game_name: String,
    accent: &'static str,
    candidate_count: usize,
}

/// Candidate row (simplified for API)
#[derive(Serialize)]
struct CandidateResponse {
    id: Uuid,
    candidate_name: String,
    score: u32,
    time_taken: u32,
    completion_date: String,
    accuracy_rate: Option<u32>,
    attempts: Option<u32>,
    is_outlier: bool,
}

/// Analytics response
#[derive(Serialize)]
struct AnalyticsResponse {
    game_type: GameType,
    game_name: &'static str,
    filter: AnalyticsFilter,
    statistics: Statistics,
    histogram: Vec<HistogramBin>,
    outlier_count: usize,
    candidates: Vec<CandidateResponse>,
}

impl From<&AnalyticsReport<'_>> for AnalyticsResponse {
    fn from(report: &AnalyticsReport<'_>) -> Self {
        let candidates = report
            .display_rows()
            .into_iter()
            .map(|row| CandidateResponse {
                id: row.record.id,
                candidate_name: row.record.candidate_name.clone(),
                score: row.record.score,
                time_taken: row.record.time_taken,
                completion_date: row.record.completion_date.to_rfc3339(),
                accuracy_rate: row.record.accuracy_rate(),
                attempts: row.record.attempts(),
                is_outlier: row.is_outlier,
            })
            .collect();

        Self {
            game_type: report.game,
            game_name: report.game.display_name(),
            filter: report.filter,
            statistics: report.statistics.rounded(),
            histogram: report.histogram.clone(),
            outlier_count: report.outliers.len(),
            candidates,
        }
    }
}

#[derive(Deserialize)]
struct LoginForm {
    email: String,
    password: String,
}

// ============================================================================
// Access control
// ============================================================================

fn to_login() -> Response {
    Redirect::to(Route::Login.path()).into_response()
}

/// Admin session for a page request, or the response that replaces the page.
/// The provider session is re-read first, so an expired one signs out here.
async fn authorize_page(state: &AppState, jar: &CookieJar) -> Result<(Arc<BrowserSession>, User), Response> {
    let Some(session) = state.session(jar) else {
        return Err(to_login());
    };

    match session.gate.revalidate().await {
        RouteDecision::Allow => match session.gate.user() {
            Some(user) => Ok((session, user)),
            None => Err(to_login()),
        },
        RouteDecision::Loading => Err(Html(web::render_loading()).into_response()),
        RouteDecision::RedirectToLogin => {
            state.remove_session(jar);
            Err(to_login())
        }
    }
}

async fn authorize_api(state: &AppState, jar: &CookieJar) -> Result<Arc<BrowserSession>, Response> {
    let unauthorized = || {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::err("Admin session required")),
        )
            .into_response()
    };

    let Some(session) = state.session(jar) else {
        return Err(unauthorized());
    };
    match session.gate.revalidate().await {
        RouteDecision::Allow => Ok(session),
        RouteDecision::Loading => Err(unauthorized()),
        RouteDecision::RedirectToLogin => {
            state.remove_session(jar);
            Err(unauthorized())
        }
    }
}

fn not_found(message: &str) -> Response {
    (StatusCode::NOT_FOUND, Html(format!("<h1>Not found</h1><p>{}</p>", web::escape(message)))).into_response()
}

// ============================================================================
// Page Handlers
// ============================================================================

/// GET / - Redirect to the dashboard
async fn index() -> Redirect {
    Redirect::to(Route::Dashboard.path())
}

/// GET /login - Login form
async fn login_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    match state.session(&jar) {
        Some(session) if session.gate.decision() == RouteDecision::Allow => {
            Redirect::to(Route::Dashboard.path()).into_response()
        }
        _ => Html(web::render_login(None, "")).into_response(),
    }
}

/// POST /login - Sign in; only admins get a session
async fn login_submit(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let client = match state.backend.new_client() {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "auth provider unavailable");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Html(web::render_login(Some("Authentication service unavailable."), &form.email)),
            )
                .into_response();
        }
    };

    let gate = Arc::new(AuthGate::new(client, state.timeouts));
    match gate.login(&form.email, &form.password).await {
        Ok(user) => {
            gate.listen();
            let session_id = Uuid::new_v4().to_string();
            let data = MockDataset::from_seed(state.data_seed, state.history_days);
            state.insert_session(session_id.clone(), BrowserSession::new(gate, data));
            info!(email = user.email_or_id(), "dashboard session started");

            let cookie = Cookie::build((SESSION_COOKIE, session_id))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build();
            (jar.add(cookie), Redirect::to(Route::Dashboard.path())).into_response()
        }
        Err(e) => {
            warn!(email = %form.email, error = %e, "login failed");
            (
                StatusCode::UNAUTHORIZED,
                Html(web::render_login(Some(&e.user_message()), &form.email)),
            )
                .into_response()
        }
    }
}

/// POST /logout - Sign out and drop the session
///
/// A failed sign-out keeps the session; the user stays on the dashboard.
async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(session) = state.session(&jar) {
        if let Err(e) = session.gate.logout().await {
            error!(error = %e, "logout error");
            return Redirect::to(Route::Dashboard.path()).into_response();
        }
        state.remove_session(&jar);
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, to_login()).into_response()
}

/// GET /dashboard - Game selector
async fn dashboard(State(state): State<AppState>, jar: CookieJar) -> Response {
    let (session, user) = match authorize_page(&state, &jar).await {
        Ok(ok) => ok,
        Err(response) => return response,
    };

    Html(web::render_game_selector(user.email_or_id(), &session.data.available_games())).into_response()
}

/// GET /dashboard/:game - Analytics view for one game
async fn game_analytics(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(game): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Response {
    let (session, user) = match authorize_page(&state, &jar).await {
        Ok(ok) => ok,
        Err(response) => return response,
    };
    let Ok(game) = game.parse::<GameType>() else {
        return not_found(&format!("Unknown game: {}", game));
    };

    let report = AnalyticsReport::build(game, session.data.candidates_for(game), query.into_filter());
    Html(web::render_analytics(user.email_or_id(), &report)).into_response()
}

/// GET /dashboard/:game/candidates/:id - Candidate details
async fn candidate_detail(
    State(state): State<AppState>,
    jar: CookieJar,
    Path((game, id)): Path<(String, Uuid)>,
    Query(query): Query<AnalyticsQuery>,
) -> Response {
    let (session, user) = match authorize_page(&state, &jar).await {
        Ok(ok) => ok,
        Err(response) => return response,
    };
    let Ok(game) = game.parse::<GameType>() else {
        return not_found(&format!("Unknown game: {}", game));
    };
    let Some(record) = session.data.find_candidate(game, id) else {
        return not_found("Candidate not found");
    };

    let filter = query.into_filter();
    let report = AnalyticsReport::build(game, session.data.candidates_for(game), filter);
    let is_outlier = report.is_outlier(&record.id);

    Html(web::render_candidate_detail(user.email_or_id(), game, record, is_outlier, &filter)).into_response()
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/games - Available base games
async fn api_games(State(state): State<AppState>, jar: CookieJar) -> Response {
    let session = match authorize_api(&state, &jar).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let games: Vec<GameResponse> = session
        .data
        .all()
        .map(|g| GameResponse {
            game_type: g.game_type,
            game_name: g.game_name.clone(),
            accent: g.game_type.accent().as_str(),
            candidate_count: g.candidates.len(),
        })
        .collect();

    Json(ApiResponse::ok(games)).into_response()
}

/// GET /api/games/:game/analytics - Statistics, histogram and rows
async fn api_game_analytics(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(game): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Response {
    let session = match authorize_api(&state, &jar).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    match game.parse::<GameType>() {
        Ok(game) => {
            let report = AnalyticsReport::build(game, session.data.candidates_for(game), query.into_filter());
            Json(ApiResponse::ok(AnalyticsResponse::from(&report))).into_response()
        }
        Err(e) => (StatusCode::NOT_FOUND, Json(ApiResponse::<()>::err(e.to_string()))).into_response(),
    }
}

// ============================================================================
// Main Server
// ============================================================================

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/games", get(api_games))
        .route("/games/:game/analytics", get(api_game_analytics));

    Router::new()
        .route("/", get(index))
        .route(Route::Login.path(), get(login_page).post(login_submit))
        .route("/logout", post(logout))
        .route(Route::Dashboard.path(), get(dashboard))
        .route("/dashboard/:game", get(game_analytics))
        .route("/dashboard/:game/candidates/:id", get(candidate_detail))
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new("web"))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_stdout();
    info!("🌐 NeuRazor Analytics - Web Server v{}", neurazor_analytics::VERSION);

    let config = AppConfig::load().context("failed to load configuration")?;
    let state = AppState::from_config(&config);
    spawn_session_sweeper(state.clone());
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind to {}", config.server.bind))?;

    info!("🚀 Server running on http://{}", config.server.bind);
    info!("   UI:  http://{}/dashboard", config.server.bind);
    info!("   API: http://{}/api/games", config.server.bind);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use neurazor_analytics::{AuthService, MemoryAuth, UserDirectory};
    use tower::ServiceExt;

    fn directory() -> Arc<UserDirectory> {
        let mut directory = UserDirectory::new();
        directory.add_user("admin@neurazor.com", "correct-horse", Some("admin"));
        directory.add_user("viewer@neurazor.com", "battery-staple", None);
        Arc::new(directory)
    }

    fn state_with_idle_timeout(idle_timeout: Duration) -> AppState {
        AppState::new(
            AuthBackend::Memory(directory()),
            AuthTimeouts::default(),
            Some(42),
            30,
            idle_timeout,
        )
    }

    fn state() -> AppState {
        state_with_idle_timeout(Duration::from_secs(1_800))
    }

    async fn send(state: &AppState, request: Request<Body>) -> Response {
        build_router(state.clone()).oneshot(request).await.unwrap()
    }

    fn request(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn login_request(email: &str, password: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(format!("email={}&password={}", email, password)))
            .unwrap()
    }

    fn location(response: &Response) -> &str {
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
    }

    /// Full `Set-Cookie` header for the session cookie, if any.
    fn set_session_cookie(response: &Response) -> Option<String> {
        response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(SESSION_COOKIE))
            .map(str::to_string)
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    /// Sign the admin in and return the `Cookie` header value.
    async fn sign_in(state: &AppState) -> String {
        let response = send(state, login_request("admin@neurazor.com", "correct-horse")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let cookie = set_session_cookie(&response).unwrap();
        cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_failed_login_rerenders_form() {
        let state = state();
        let response = send(&state, login_request("admin@neurazor.com", "wrong")).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(set_session_cookie(&response).is_none());
        let body = body_text(response).await;
        assert!(body.contains("Invalid login credentials"));
        assert!(body.contains("admin@neurazor.com"));
        assert_eq!(state.session_count(), 0);
    }

    #[tokio::test]
    async fn test_non_admin_login_is_denied() {
        let state = state();
        let response = send(&state, login_request("viewer@neurazor.com", "battery-staple")).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(set_session_cookie(&response).is_none());
        assert!(body_text(response).await.contains("Access denied. Admin role required."));
        assert_eq!(state.session_count(), 0);
    }

    #[tokio::test]
    async fn test_admin_login_opens_dashboard() {
        let state = state();
        let response = send(&state, login_request("admin@neurazor.com", "correct-horse")).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/dashboard");
        let set_cookie = set_session_cookie(&response).unwrap();
        assert!(set_cookie.contains("HttpOnly"));
        let cookie = set_cookie.split(';').next().unwrap().to_string();
        assert_eq!(state.session_count(), 1);

        let response = send(&state, request("GET", "/dashboard", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Select Base Game"));
        assert!(body.contains("admin@neurazor.com"));

        // Signed-in users skip the login form
        let response = send(&state, request("GET", "/login", Some(&cookie))).await;
        assert_eq!(location(&response), "/dashboard");
    }

    #[tokio::test]
    async fn test_protected_pages_redirect_to_login() {
        let state = state();
        let candidate = format!("/dashboard/math_sprint/candidates/{}", Uuid::nil());

        for uri in ["/dashboard", "/dashboard/math_sprint", candidate.as_str()] {
            let response = send(&state, request("GET", uri, None)).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", uri);
            assert_eq!(location(&response), "/login", "{}", uri);
        }

        let stale = format!("{}=not-a-session", SESSION_COOKIE);
        let response = send(&state, request("GET", "/dashboard", Some(&stale))).await;
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_api_requires_session() {
        let state = state();

        for uri in ["/api/games", "/api/games/math_sprint/analytics"] {
            let response = send(&state, request("GET", uri, None)).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
            let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
            assert_eq!(body["success"], false);
            assert_eq!(body["error"], "Admin session required");
        }

        let response = send(&state, request("GET", "/api/health", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_api_returns_analytics() {
        let state = state();
        let cookie = sign_in(&state).await;

        let response = send(&state, request("GET", "/api/games", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["success"], true);
        assert!(!body["data"].as_array().unwrap().is_empty());

        let response = send(&state, request("GET", "/api/games/math_sprint/analytics", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["data"]["game_type"], "math_sprint");
        assert_eq!(body["data"]["histogram"].as_array().unwrap().len(), 20);
    }

    #[tokio::test]
    async fn test_unknown_game_is_not_found() {
        let state = state();
        let cookie = sign_in(&state).await;

        let response = send(&state, request("GET", "/dashboard/chess", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("Unknown game: chess"));

        let response = send(&state, request("GET", "/api/games/chess/analytics", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["success"], false);

        let missing = format!("/dashboard/math_sprint/candidates/{}", Uuid::nil());
        let response = send(&state, request("GET", &missing, Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_logout_drops_session_and_cookie() {
        let state = state();
        let cookie = sign_in(&state).await;

        let response = send(&state, request("POST", "/logout", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
        let removal = set_session_cookie(&response).unwrap();
        assert!(removal.contains("Max-Age=0"));
        assert_eq!(state.session_count(), 0);

        let response = send(&state, request("GET", "/dashboard", Some(&cookie))).await;
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_ended_provider_session_signs_out() {
        let state = state();
        let service = Arc::new(MemoryAuth::new(directory()));
        let gate = Arc::new(AuthGate::new(service.clone(), AuthTimeouts::default()));
        gate.login("admin@neurazor.com", "correct-horse").await.unwrap();
        state.insert_session(
            "ended".to_string(),
            BrowserSession::new(gate, MockDataset::from_seed(Some(1), 30)),
        );
        let cookie = format!("{}=ended", SESSION_COOKIE);

        // No listener on this gate; only the request notices
        service.sign_out().await.unwrap();

        let response = send(&state, request("GET", "/dashboard", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
        assert_eq!(state.session_count(), 0);
    }

    #[tokio::test]
    async fn test_ended_provider_session_is_rejected_by_api() {
        let state = state();
        let service = Arc::new(MemoryAuth::new(directory()));
        let gate = Arc::new(AuthGate::new(service.clone(), AuthTimeouts::default()));
        gate.login("admin@neurazor.com", "correct-horse").await.unwrap();
        state.insert_session(
            "ended".to_string(),
            BrowserSession::new(gate, MockDataset::from_seed(Some(1), 30)),
        );
        service.sign_out().await.unwrap();

        let cookie = format!("{}=ended", SESSION_COOKIE);
        let response = send(&state, request("GET", "/api/games", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(state.session_count(), 0);
    }

    #[tokio::test]
    async fn test_sweep_drops_idle_sessions() {
        let state = state_with_idle_timeout(Duration::ZERO);
        let cookie = sign_in(&state).await;
        assert_eq!(state.session_count(), 1);

        assert_eq!(state.sweep_sessions(Instant::now()), 1);
        assert_eq!(state.session_count(), 0);

        let response = send(&state, request("GET", "/dashboard", Some(&cookie))).await;
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_sweep_keeps_recent_sessions() {
        let state = state();
        let cookie = sign_in(&state).await;

        assert_eq!(state.sweep_sessions(Instant::now()), 0);
        let response = send(&state, request("GET", "/dashboard", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let later = Instant::now() + Duration::from_secs(1_801);
        assert_eq!(state.sweep_sessions(later), 1);
    }

    #[tokio::test]
    async fn test_sweep_drops_signed_out_sessions() {
        let state = state();
        sign_in(&state).await;
        let session = state.sessions.read().unwrap().values().next().cloned().unwrap();

        session.gate.apply_change(neurazor_analytics::AuthStateChange::SignedOut).await;

        assert_eq!(state.sweep_sessions(Instant::now()), 1);
    }
}
