// 🌐 Web pages - server-rendered HTML for the browser dashboard
//
// Pure rendering: handlers in the server binary gather state and call these.

use crate::analytics::{AnalyticsFilter, AnalyticsReport, HistogramBin};
use crate::games::GameType;
use crate::mock_data::CandidateRecord;
use serde::Deserialize;

const APP_TITLE: &str = "NeuRazor Analytics";

/// Escape text for HTML element and attribute content.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ============================================================================
// QUERY
// ============================================================================

/// Filter form fields as they arrive in the query string.
///
/// Unchecked checkboxes are not submitted, so `applied` marks a submitted
/// form in which a missing `show_outliers` means "hide".
///
/// Number inputs arrive as text and may be blank; anything that is not a
/// number falls back to the default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub time_threshold: Option<String>,
    pub score_min: Option<String>,
    pub score_max: Option<String>,
    pub show_outliers: Option<String>,
    pub applied: Option<String>,
}

fn number(field: &Option<String>) -> Option<u32> {
    field.as_deref().and_then(|v| v.trim().parse().ok())
}

fn flag(field: &Option<String>) -> Option<bool> {
    field.as_deref().map(|v| matches!(v, "true" | "on" | "1"))
}

impl AnalyticsQuery {
    pub fn into_filter(self) -> AnalyticsFilter {
        let defaults = AnalyticsFilter::default();
        let show_outliers = match (flag(&self.show_outliers), flag(&self.applied)) {
            (Some(show), _) => show,
            (None, Some(true)) => false,
            (None, _) => defaults.show_outliers,
        };

        AnalyticsFilter {
            time_threshold: number(&self.time_threshold).unwrap_or(defaults.time_threshold),
            score_min: number(&self.score_min).unwrap_or(defaults.score_min),
            score_max: number(&self.score_max).unwrap_or(defaults.score_max),
            show_outliers,
        }
    }
}

/// Query string that reproduces a filter.
pub fn filter_query(filter: &AnalyticsFilter) -> String {
    format!(
        "time_threshold={}&score_min={}&score_max={}&show_outliers={}",
        filter.time_threshold, filter.score_min, filter.score_max, filter.show_outliers
    )
}

// ============================================================================
// LAYOUT
// ============================================================================

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{} | {}</title>
    <link rel="stylesheet" href="/static/style.css">
</head>
<body>
{}
</body>
</html>"#,
        escape(title),
        APP_TITLE,
        body
    )
}

fn header(user_email: &str) -> String {
    format!(
        r#"<header class="app-header">
    <div class="brand">
        <h1>{}</h1>
        <p class="muted">Performance Dashboard</p>
    </div>
    <div class="account">
        <div class="account-info">
            <p class="account-email">{}</p>
            <p class="muted small">Admin</p>
        </div>
        <form method="post" action="/logout">
            <button type="submit" class="btn-logout" title="Logout">Logout</button>
        </form>
    </div>
</header>"#,
        APP_TITLE,
        escape(user_email)
    )
}

// ============================================================================
// PAGES
// ============================================================================

pub fn render_login(error: Option<&str>, email: &str) -> String {
    let error_html = error
        .map(|e| format!(r#"<div class="alert-error">{}</div>"#, escape(e)))
        .unwrap_or_default();

    let body = format!(
        r#"<main class="login-screen">
    <div class="card login-card">
        <div class="login-title">
            <h1>{}</h1>
            <p class="muted">Admin Dashboard Login</p>
        </div>
        <form method="post" action="/login" class="login-form">
            {}
            <label>Email
                <input type="email" name="email" value="{}" placeholder="admin@neurazor.com" required>
            </label>
            <label>Password
                <input type="password" name="password" placeholder="Enter your password" required>
            </label>
            <button type="submit" class="btn-primary">Login</button>
        </form>
    </div>
</main>"#,
        APP_TITLE,
        error_html,
        escape(email)
    );

    page("Login", &body)
}

pub fn render_loading() -> String {
    page(
        "Loading",
        r#"<main class="loading-screen">
    <meta http-equiv="refresh" content="1">
    <div class="spinner"></div>
    <div class="loading-title">Loading...</div>
    <div class="muted small">Checking authentication...</div>
</main>"#,
    )
}

pub fn render_game_selector(user_email: &str, games: &[(GameType, &str)]) -> String {
    let cards: String = games
        .iter()
        .map(|(game, name)| {
            format!(
                r#"
        <a class="game-card accent-{}" href="/dashboard/{}">
            <span class="game-icon">{}</span>
            <span class="game-name">{}</span>
        </a>"#,
                game.accent().as_str(),
                game.key(),
                game.icon(),
                escape(name)
            )
        })
        .collect();

    let body = format!(
        r#"{}
<main class="content">
    <div class="intro">
        <h2>Welcome to Analytics Dashboard</h2>
        <p class="muted">Select a base game below to view aggregate candidate performance data.</p>
    </div>
    <h2>Select Base Game</h2>
    <div class="game-grid">{}
    </div>
</main>"#,
        header(user_email),
        cards
    );

    page("Dashboard", &body)
}

fn render_filters(game: GameType, filter: &AnalyticsFilter) -> String {
    format!(
        r#"<section class="card">
    <h3>Filters</h3>
    <form method="get" action="/dashboard/{}" class="filter-form">
        <input type="hidden" name="applied" value="true">
        <label>Time Threshold (seconds)
            <input type="number" name="time_threshold" min="0" value="{}">
            <span class="muted small">Exclude attempts under {} seconds</span>
        </label>
        <label>Score Range (Min)
            <input type="number" name="score_min" min="0" max="100" value="{}">
        </label>
        <label>Score Range (Max)
            <input type="number" name="score_max" min="0" max="100" value="{}">
        </label>
        <label class="checkbox">
            <input type="checkbox" name="show_outliers" value="true"{}>
            Show outliers (candidates outside 2 standard deviations)
        </label>
        <button type="submit" class="btn-primary">Apply</button>
    </form>
</section>"#,
        game.key(),
        filter.time_threshold,
        filter.time_threshold,
        filter.score_min,
        filter.score_max,
        if filter.show_outliers { " checked" } else { "" }
    )
}

fn render_stat_cards(report: &AnalyticsReport<'_>) -> String {
    let stats = report.statistics.rounded();
    format!(
        r#"<section class="stat-grid">
    <div class="card stat-card"><h3>Mean Score</h3><p class="stat-value accent-text-blue">{:.2}</p></div>
    <div class="card stat-card"><h3>Standard Deviation</h3><p class="stat-value accent-text-purple">{:.2}</p></div>
    <div class="card stat-card"><h3>Candidates</h3><p class="stat-value accent-text-green">{}</p></div>
</section>"#,
        stats.mean, stats.std_dev, stats.count
    )
}

/// Inline SVG area chart of the histogram.
pub fn area_chart_svg(bins: &[HistogramBin]) -> String {
    const WIDTH: f64 = 800.0;
    const HEIGHT: f64 = 240.0;
    const LABEL_SPACE: f64 = 60.0;

    if bins.is_empty() {
        return String::new();
    }

    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64;
    let step = if bins.len() > 1 { WIDTH / (bins.len() - 1) as f64 } else { 0.0 };
    let point = |i: usize, count: usize| {
        let x = i as f64 * step;
        let y = HEIGHT - count as f64 / max_count * HEIGHT;
        format!("{:.1},{:.1}", x, y)
    };

    let mut polygon = vec![format!("0,{:.1}", HEIGHT)];
    polygon.extend(bins.iter().enumerate().map(|(i, b)| point(i, b.count)));
    polygon.push(format!("{:.1},{:.1}", WIDTH, HEIGHT));

    let labels: String = bins
        .iter()
        .enumerate()
        .map(|(i, b)| {
            format!(
                r#"<text x="{:.1}" y="{:.1}" transform="rotate(-45 {:.1} {:.1})" text-anchor="end"><title>{}: {}</title>{}</text>"#,
                i as f64 * step,
                HEIGHT + 14.0,
                i as f64 * step,
                HEIGHT + 14.0,
                b.range,
                b.count,
                b.range
            )
        })
        .collect();

    format!(
        r#"<svg class="area-chart" viewBox="-20 -10 {} {}" preserveAspectRatio="none" role="img" aria-label="Score distribution">
    <polygon points="{}" class="area"/>
    <g class="axis-labels">{}</g>
</svg>"#,
        WIDTH + 40.0,
        HEIGHT + LABEL_SPACE,
        polygon.join(" "),
        labels
    )
}

fn render_table(report: &AnalyticsReport<'_>) -> String {
    let rows = report.display_rows();
    let query = filter_query(&report.filter);

    let body: String = rows
        .iter()
        .map(|row| {
            let badge = if row.is_outlier {
                r#" <span class="badge-outlier">Outlier</span>"#
            } else {
                ""
            };
            format!(
                r#"
            <tr{}>
                <td>{}{}</td>
                <td class="strong">{}</td>
                <td>{}s</td>
                <td class="muted">{}</td>
                <td><a href="/dashboard/{}/candidates/{}?{}">View Details</a></td>
            </tr>"#,
                if row.is_outlier { r#" class="row-outlier""# } else { "" },
                escape(&row.record.candidate_name),
                badge,
                row.record.score,
                row.record.time_taken,
                row.record.completion_date.format("%Y-%m-%d"),
                report.game.key(),
                row.record.id,
                query
            )
        })
        .collect();

    let empty = if rows.is_empty() {
        r#"<p class="empty muted">No candidates match the current filters.</p>"#
    } else {
        ""
    };

    format!(
        r#"<section class="card table-card">
    <h3>Candidate Performance Data ({} candidates)</h3>
    <table>
        <thead>
            <tr><th>Name</th><th>Score</th><th>Time Taken</th><th>Date</th><th>Actions</th></tr>
        </thead>
        <tbody>{}
        </tbody>
    </table>
    {}
</section>"#,
        rows.len(),
        body,
        empty
    )
}

pub fn render_analytics(user_email: &str, report: &AnalyticsReport<'_>) -> String {
    let body = format!(
        r#"{}
<main class="content">
    <a class="back-link" href="/dashboard">← Back to Game Selection</a>
    <h2>{}</h2>
    {}
    {}
    <section class="card">
        <h3>Score Distribution</h3>
        {}
    </section>
    {}
</main>"#,
        header(user_email),
        report.game.display_name(),
        render_filters(report.game, &report.filter),
        render_stat_cards(report),
        area_chart_svg(&report.histogram),
        render_table(report)
    );

    page(report.game.display_name(), &body)
}

pub fn render_candidate_detail(
    user_email: &str,
    game: GameType,
    record: &CandidateRecord,
    is_outlier: bool,
    filter: &AnalyticsFilter,
) -> String {
    let mut fields = vec![
        ("Score", record.score.to_string()),
        ("Time Taken", format!("{}s", record.time_taken)),
        ("Completed", record.completion_date.format("%Y-%m-%d %H:%M UTC").to_string()),
    ];
    fields.extend(record.details.fields());

    let rows: String = fields
        .iter()
        .map(|(label, value)| format!("\n        <dt>{}</dt><dd>{}</dd>", label, escape(value)))
        .collect();

    let body = format!(
        r#"{}
<main class="content">
    <a class="back-link" href="/dashboard/{}?{}">← Back to {}</a>
    <section class="card detail-card">
        <h2>{}{}</h2>
        <dl>{}
        </dl>
    </section>
</main>"#,
        header(user_email),
        game.key(),
        filter_query(filter),
        game.display_name(),
        escape(&record.candidate_name),
        if is_outlier { r#" <span class="badge-outlier">Outlier</span>"# } else { "" },
        rows
    );

    page(&record.candidate_name, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_data::MockDataset;

    #[test]
    fn test_escape() {
        assert_eq!(escape(r#"<a href="x">O'Neil & co</a>"#), "&lt;a href=&quot;x&quot;&gt;O&#39;Neil &amp; co&lt;/a&gt;");
    }

    #[test]
    fn test_query_defaults() {
        let filter = AnalyticsQuery::default().into_filter();
        assert_eq!(filter, AnalyticsFilter::default());
    }

    #[test]
    fn test_unchecked_outliers_in_submitted_form() {
        let query = AnalyticsQuery {
            time_threshold: Some("60".to_string()),
            score_min: Some("".to_string()),
            score_max: Some("abc".to_string()),
            applied: Some("true".to_string()),
            ..Default::default()
        };
        let filter = query.into_filter();
        assert_eq!(filter.time_threshold, 60);
        assert_eq!(filter.score_min, 0);
        assert_eq!(filter.score_max, 100);
        assert!(!filter.show_outliers);
    }

    #[test]
    fn test_checked_outliers() {
        let query = AnalyticsQuery {
            show_outliers: Some("true".to_string()),
            applied: Some("true".to_string()),
            ..Default::default()
        };
        assert!(query.into_filter().show_outliers);
    }

    #[test]
    fn test_filter_query() {
        let filter = AnalyticsFilter { time_threshold: 10, score_min: 5, score_max: 95, show_outliers: false };
        assert_eq!(filter_query(&filter), "time_threshold=10&score_min=5&score_max=95&show_outliers=false");
    }

    #[test]
    fn test_login_page_shows_error() {
        let html = render_login(Some("Access denied. Admin role required."), "viewer@neurazor.com");
        assert!(html.contains("Access denied. Admin role required."));
        assert!(html.contains(r#"value="viewer@neurazor.com""#));

        let html = render_login(None, "");
        assert!(!html.contains("alert-error"));
    }

    #[test]
    fn test_selector_lists_every_game() {
        let data = MockDataset::seeded(1, 90);
        let html = render_game_selector("admin@neurazor.com", &data.available_games());
        for game in GameType::ALL {
            assert!(html.contains(&format!("/dashboard/{}", game.key())));
            assert!(html.contains(game.display_name()));
        }
    }

    #[test]
    fn test_analytics_page() {
        let data = MockDataset::seeded(1, 90);
        let report = AnalyticsReport::build(
            GameType::StroopTest,
            data.candidates_for(GameType::StroopTest),
            AnalyticsFilter::default(),
        );
        let html = render_analytics("admin@neurazor.com", &report);

        assert!(html.contains("Stroop Test"));
        assert!(html.contains(&format!("{:.2}", report.statistics.rounded().mean)));
        assert!(html.contains(&format!("Candidate Performance Data ({} candidates)", report.display_rows().len())));
        assert!(html.contains("<svg"));
    }

    #[test]
    fn test_empty_table_message() {
        let data = MockDataset::seeded(1, 90);
        let filter = AnalyticsFilter { score_min: 101, ..AnalyticsFilter::default() };
        let report = AnalyticsReport::build(GameType::BartTest, data.candidates_for(GameType::BartTest), filter);
        let html = render_analytics("admin@neurazor.com", &report);
        assert!(html.contains("No candidates match the current filters."));
    }

    #[test]
    fn test_chart_has_one_label_per_bin() {
        let data = MockDataset::seeded(1, 90);
        let report = AnalyticsReport::build(
            GameType::MathSprint,
            data.candidates_for(GameType::MathSprint),
            AnalyticsFilter::default(),
        );
        let svg = area_chart_svg(&report.histogram);
        assert_eq!(svg.matches("<text").count(), 20);
    }

    #[test]
    fn test_candidate_detail_page() {
        let data = MockDataset::seeded(1, 90);
        let record = &data.candidates_for(GameType::CardFlip)[0];
        let html = render_candidate_detail(
            "admin@neurazor.com",
            GameType::CardFlip,
            record,
            true,
            &AnalyticsFilter::default(),
        );
        assert!(html.contains("Pairs Found"));
        assert!(html.contains("badge-outlier"));
        assert!(html.contains("/dashboard/card_flip?"));
    }
}
