// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use neurazor_analytics::{
    logging, AnalyticsFilter, AnalyticsReport, AppConfig, AuthBackend, AuthGate, AuthTimeouts,
    GameType, MockDataset,
};
use std::env;
use std::sync::Arc;
use tokio::runtime::Runtime;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("games") => run_games(),
        Some("report") => run_report(&args[2..]),
        Some("help") | Some("--help") | Some("-h") => {
            print_usage();
            Ok(())
        }
        // UI mode (default)
        _ => run_ui_mode(),
    }
}

fn print_usage() {
    println!("NeuRazor Analytics v{}", neurazor_analytics::VERSION);
    println!();
    println!("Usage:");
    println!("  neurazor-analytics                 Terminal dashboard");
    println!("  neurazor-analytics games           List base games");
    println!("  neurazor-analytics report <game> [--time N] [--min N] [--max N] [--hide-outliers]");
    println!();
    println!("report signs in with NEURAZOR_EMAIL / NEURAZOR_PASSWORD (admin role required).");
}

/// Mock data and auth gate shared by every mode.
struct AppContext {
    runtime: Runtime,
    gate: Arc<AuthGate>,
    data: MockDataset,
}

fn setup() -> Result<AppContext> {
    let config = AppConfig::load().context("failed to load configuration")?;
    let runtime = Runtime::new().context("failed to start async runtime")?;

    let backend = AuthBackend::from_config(&config.auth);
    let client = backend.new_client().context("auth provider is not configured")?;
    let gate = Arc::new(AuthGate::new(client, AuthTimeouts::from(&config.auth)));

    // Listener task needs the runtime context to spawn
    runtime.block_on(async {
        gate.listen();
    });

    let data = MockDataset::from_seed(config.data.seed, config.data.history_days);
    Ok(AppContext { runtime, gate, data })
}

fn run_games() -> Result<()> {
    println!("🎮 Base Games");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for game in GameType::ALL {
        println!("  {} {:<20} {}", game.icon(), game.display_name(), game.key());
    }
    Ok(())
}

fn parse_report_args(args: &[String]) -> Result<(GameType, AnalyticsFilter)> {
    let Some(game) = args.first() else {
        bail!("missing game; run `neurazor-analytics games` for the list");
    };
    let game: GameType = game.parse()?;

    let mut filter = AnalyticsFilter::default();
    let mut rest = args[1..].iter();
    while let Some(flag) = rest.next() {
        let mut value = || -> Result<u32> {
            let raw = rest.next().with_context(|| format!("{} needs a value", flag))?;
            raw.parse().with_context(|| format!("invalid value for {}: {}", flag, raw))
        };

        match flag.as_str() {
            "--time" => filter.time_threshold = value()?,
            "--min" => filter.score_min = value()?,
            "--max" => filter.score_max = value()?,
            "--hide-outliers" => filter.show_outliers = false,
            other => bail!("unknown option: {}", other),
        }
    }

    Ok((game, filter))
}

fn run_report(args: &[String]) -> Result<()> {
    logging::init_stdout();
    let (game, filter) = parse_report_args(args)?;

    let email = env::var("NEURAZOR_EMAIL").context("NEURAZOR_EMAIL is not set")?;
    let password = env::var("NEURAZOR_PASSWORD").context("NEURAZOR_PASSWORD is not set")?;

    let ctx = setup()?;
    let user = ctx
        .runtime
        .block_on(ctx.gate.login(&email, &password))
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    let report = AnalyticsReport::build(game, ctx.data.candidates_for(game), filter);
    print_report(&report, user.email_or_id());

    if let Err(e) = ctx.runtime.block_on(ctx.gate.logout()) {
        eprintln!("⚠️  Logout failed: {}", e);
    }
    Ok(())
}

fn print_report(report: &AnalyticsReport<'_>, user: &str) {
    let stats = report.statistics.rounded();
    let filter = report.filter;

    println!("📊 {} - Candidate Analytics", report.game.display_name());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Signed in as {}", user);
    println!(
        "Filters: time ≥ {}s, score {}..={}, outliers {}",
        filter.time_threshold,
        filter.score_min,
        filter.score_max,
        if filter.show_outliers { "shown" } else { "hidden" }
    );
    println!();
    println!("  Mean Score:          {:.2}", stats.mean);
    println!("  Standard Deviation:  {:.2}", stats.std_dev);
    println!("  Total Candidates:    {}", stats.count);
    println!("  Outliers (±2σ):      {}", report.outliers.len());

    println!("\n📈 Score Distribution");
    let peak = report.histogram.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    for bin in &report.histogram {
        let width = bin.count * 40 / peak;
        println!("  {:>13} │{} {}", bin.range, "█".repeat(width), bin.count);
    }

    println!("\n👥 Candidates");
    println!("  {:<28} {:>5} {:>8}  {:<10}", "Name", "Score", "Time (s)", "Date");
    for row in report.display_rows() {
        let record = row.record;
        println!(
            "  {:<28} {:>5} {:>8}  {:<10} {}",
            record.candidate_name,
            record.score,
            record.time_taken,
            record.completion_date.format("%Y-%m-%d").to_string(),
            if row.is_outlier { "⚠ Outlier" } else { "" }
        );
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode() -> Result<()> {
    println!("🖥️  Loading NeuRazor Analytics...\n");

    logging::init_file(std::path::Path::new("neurazor-analytics.log"))
        .context("failed to open log file")?;

    let ctx = setup()?;
    println!("✓ Generated mock data for {} games\n", ctx.data.available_games().len());
    println!("Starting UI... (Press 'Esc' to quit)\n");

    let mut app = ui::App::new(ctx.gate.clone(), ctx.runtime.handle().clone(), ctx.data);
    ui::run_ui(&mut app)?;

    println!("\n✅ UI closed successfully");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode() -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use web UI: cargo run --bin neurazor-server --features server");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_report_defaults() {
        let (game, filter) = parse_report_args(&args(&["math_sprint"])).unwrap();
        assert_eq!(game, GameType::MathSprint);
        assert_eq!(filter, AnalyticsFilter::default());
    }

    #[test]
    fn test_parse_report_options() {
        let (game, filter) = parse_report_args(&args(&[
            "bart_test", "--time", "45", "--min", "20", "--max", "80", "--hide-outliers",
        ]))
        .unwrap();

        assert_eq!(game, GameType::BartTest);
        assert_eq!(filter.time_threshold, 45);
        assert_eq!(filter.score_min, 20);
        assert_eq!(filter.score_max, 80);
        assert!(!filter.show_outliers);
    }

    #[test]
    fn test_parse_report_errors() {
        assert!(parse_report_args(&[]).is_err());
        assert!(parse_report_args(&args(&["chess"])).is_err());
        assert!(parse_report_args(&args(&["math_sprint", "--min"])).is_err());
        assert!(parse_report_args(&args(&["math_sprint", "--min", "abc"])).is_err());
        assert!(parse_report_args(&args(&["math_sprint", "--verbose"])).is_err());
    }
}
