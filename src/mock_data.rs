// 🎲 Mock Data Generator - synthetic candidate performance records
//
// Records are generated once per process (or per seed) and never mutated.
// Every random field follows round(U[0,1) * span + base), so the declared
// ranges below are inclusive on both ends.

use crate::games::GameType;
use chrono::{DateTime, Duration, Timelike, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

const FIRST_NAMES: [&str; 48] = [
    "Alex", "Jordan", "Taylor", "Morgan", "Casey", "Riley", "Avery", "Quinn",
    "Blake", "Cameron", "Dakota", "Emery", "Finley", "Harper", "Hayden", "Jamie",
    "Kai", "Logan", "Parker", "Reese", "Rowan", "Sage", "Skylar", "Tyler",
    "Aiden", "Bella", "Carter", "Diana", "Ethan", "Fiona", "Grace", "Henry",
    "Isabella", "Jack", "Katherine", "Liam", "Mia", "Noah", "Olivia", "Penelope",
    "Quinn", "Ryan", "Sophia", "Thomas", "Uma", "Victoria", "William", "Zoe",
];

const LAST_NAMES: [&str; 48] = [
    "Anderson", "Brown", "Chen", "Davis", "Evans", "Foster", "Garcia", "Harris",
    "Jackson", "Kim", "Lee", "Martinez", "Nguyen", "Patel", "Rodriguez", "Singh",
    "Thompson", "Wang", "White", "Wilson", "Yang", "Zhang", "Adams", "Baker",
    "Clark", "Cooper", "Edwards", "Green", "Hall", "Hill", "Johnson", "Jones",
    "King", "Lewis", "Miller", "Moore", "Nelson", "Parker", "Roberts", "Scott",
    "Smith", "Taylor", "Turner", "Walker", "Ward", "Watson", "Williams", "Wright",
];

/// Default look-back window for completion dates.
pub const DEFAULT_HISTORY_DAYS: u32 = 90;

// ============================================================================
// CANDIDATE RECORD
// ============================================================================

/// One candidate's result for one base game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Stable identity within the session
    pub id: Uuid,

    pub candidate_name: String,

    /// 0-100
    pub score: u32,

    /// Seconds
    pub time_taken: u32,

    pub completion_date: DateTime<Utc>,

    /// Game-specific metadata
    pub details: GameDetails,
}

impl CandidateRecord {
    pub fn accuracy_rate(&self) -> Option<u32> {
        self.details.accuracy_rate()
    }

    pub fn attempts(&self) -> Option<u32> {
        self.details.attempts()
    }
}

/// Game-specific fields. Exactly one variant per base game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "game", rename_all = "snake_case")]
pub enum GameDetails {
    StroopTest {
        accuracy_rate: u32,
        correct_answers: u32,
        total_questions: u32,
    },
    MathSprint {
        accuracy_rate: u32,
        problems_solved: u32,
        total_problems: u32,
    },
    CreativeUses {
        uses_generated: u32,
        originality_score: u32,
        fluency_score: u32,
        flexibility_score: u32,
    },
    ScenarioChallenge {
        response_quality: u32,
        word_count: u32,
        scenarios_completed: u32,
    },
    CardFlip {
        attempts: u32,
        pairs_found: u32,
        total_pairs: u32,
        accuracy_rate: u32,
    },
    SignSudoku {
        cells_completed: u32,
        total_cells: u32,
        errors: u32,
        accuracy_rate: u32,
    },
    DebateMode {
        pros_count: u32,
        cons_count: u32,
        argument_quality: u32,
        word_count: u32,
    },
    InterviewMode {
        questions_answered: u32,
        average_response_length: u32,
        response_quality: u32,
    },
    BartTest {
        balloons_popped: u32,
        total_pumps: u32,
        risk_score: u32,
        average_pumps_per_balloon: u32,
    },
}

impl GameDetails {
    pub fn game(&self) -> GameType {
        match self {
            GameDetails::StroopTest { .. } => GameType::StroopTest,
            GameDetails::MathSprint { .. } => GameType::MathSprint,
            GameDetails::CreativeUses { .. } => GameType::CreativeUses,
            GameDetails::ScenarioChallenge { .. } => GameType::ScenarioChallenge,
            GameDetails::CardFlip { .. } => GameType::CardFlip,
            GameDetails::SignSudoku { .. } => GameType::SignSudoku,
            GameDetails::DebateMode { .. } => GameType::DebateMode,
            GameDetails::InterviewMode { .. } => GameType::InterviewMode,
            GameDetails::BartTest { .. } => GameType::BartTest,
        }
    }

    pub fn accuracy_rate(&self) -> Option<u32> {
        match self {
            GameDetails::StroopTest { accuracy_rate, .. }
            | GameDetails::MathSprint { accuracy_rate, .. }
            | GameDetails::CardFlip { accuracy_rate, .. }
            | GameDetails::SignSudoku { accuracy_rate, .. } => Some(*accuracy_rate),
            _ => None,
        }
    }

    pub fn attempts(&self) -> Option<u32> {
        match self {
            GameDetails::CardFlip { attempts, .. } => Some(*attempts),
            _ => None,
        }
    }

    /// Label/value pairs for the candidate detail view.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            GameDetails::StroopTest { accuracy_rate, correct_answers, total_questions } => vec![
                ("Accuracy", format!("{}%", accuracy_rate)),
                ("Correct Answers", format!("{}/{}", correct_answers, total_questions)),
            ],
            GameDetails::MathSprint { accuracy_rate, problems_solved, total_problems } => vec![
                ("Accuracy", format!("{}%", accuracy_rate)),
                ("Problems Solved", format!("{}/{}", problems_solved, total_problems)),
            ],
            GameDetails::CreativeUses {
                uses_generated,
                originality_score,
                fluency_score,
                flexibility_score,
            } => vec![
                ("Uses Generated", uses_generated.to_string()),
                ("Originality", originality_score.to_string()),
                ("Fluency", fluency_score.to_string()),
                ("Flexibility", flexibility_score.to_string()),
            ],
            GameDetails::ScenarioChallenge { response_quality, word_count, scenarios_completed } => vec![
                ("Response Quality", response_quality.to_string()),
                ("Word Count", word_count.to_string()),
                ("Scenarios Completed", scenarios_completed.to_string()),
            ],
            GameDetails::CardFlip { attempts, pairs_found, total_pairs, accuracy_rate } => vec![
                ("Attempts", attempts.to_string()),
                ("Pairs Found", format!("{}/{}", pairs_found, total_pairs)),
                ("Accuracy", format!("{}%", accuracy_rate)),
            ],
            GameDetails::SignSudoku { cells_completed, total_cells, errors, accuracy_rate } => vec![
                ("Cells Completed", format!("{}/{}", cells_completed, total_cells)),
                ("Errors", errors.to_string()),
                ("Accuracy", format!("{}%", accuracy_rate)),
            ],
            GameDetails::DebateMode { pros_count, cons_count, argument_quality, word_count } => vec![
                ("Pros", pros_count.to_string()),
                ("Cons", cons_count.to_string()),
                ("Argument Quality", argument_quality.to_string()),
                ("Word Count", word_count.to_string()),
            ],
            GameDetails::InterviewMode {
                questions_answered,
                average_response_length,
                response_quality,
            } => vec![
                ("Questions Answered", questions_answered.to_string()),
                ("Avg Response Length", format!("{} words", average_response_length)),
                ("Response Quality", response_quality.to_string()),
            ],
            GameDetails::BartTest {
                balloons_popped,
                total_pumps,
                risk_score,
                average_pumps_per_balloon,
            } => vec![
                ("Balloons Popped", balloons_popped.to_string()),
                ("Total Pumps", total_pumps.to_string()),
                ("Risk Score", risk_score.to_string()),
                ("Avg Pumps / Balloon", average_pumps_per_balloon.to_string()),
            ],
        }
    }
}

// ============================================================================
// GENERATION
// ============================================================================

/// round(U[0,1) * span + base)
fn roll<R: Rng + ?Sized>(rng: &mut R, span: f64, base: f64) -> u32 {
    (rng.random::<f64>() * span + base).round() as u32
}

fn ratio(numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return 0;
    }
    (numerator as f64 / denominator as f64 * 100.0).round() as u32
}

fn random_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first = FIRST_NAMES[rng.random_range(0..FIRST_NAMES.len())];
    let last = LAST_NAMES[rng.random_range(0..LAST_NAMES.len())];
    format!("{} {}", first, last)
}

fn random_date<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>, history_days: u32) -> DateTime<Utc> {
    let days_back = (rng.random::<f64>() * history_days as f64).floor() as i64;
    let hour = rng.random_range(0..24);
    let minute = rng.random_range(0..60);

    let day = now - Duration::days(days_back);
    day.date_naive()
        .and_hms_opt(hour, minute, now.second())
        .map(|naive| naive.and_utc())
        .unwrap_or(day)
}

/// Per-game generation parameters.
struct GameProfile {
    count: usize,
    score: (f64, f64),
    time: (f64, f64),
}

fn profile(game: GameType) -> GameProfile {
    // (span, base)
    match game {
        GameType::StroopTest => GameProfile { count: 55, score: (40.0, 60.0), time: (135.0, 45.0) },
        GameType::MathSprint => GameProfile { count: 58, score: (45.0, 55.0), time: (240.0, 60.0) },
        GameType::CreativeUses => GameProfile { count: 52, score: (50.0, 50.0), time: (480.0, 120.0) },
        GameType::ScenarioChallenge => GameProfile { count: 48, score: (40.0, 60.0), time: (720.0, 180.0) },
        GameType::CardFlip => GameProfile { count: 50, score: (50.0, 50.0), time: (240.0, 60.0) },
        GameType::SignSudoku => GameProfile { count: 47, score: (40.0, 60.0), time: (480.0, 120.0) },
        GameType::DebateMode => GameProfile { count: 45, score: (35.0, 65.0), time: (900.0, 300.0) },
        GameType::InterviewMode => GameProfile { count: 43, score: (30.0, 70.0), time: (1200.0, 600.0) },
        GameType::BartTest => GameProfile { count: 40, score: (50.0, 50.0), time: (420.0, 180.0) },
    }
}

fn generate_details<R: Rng + ?Sized>(rng: &mut R, game: GameType, score: u32) -> GameDetails {
    match game {
        GameType::StroopTest => {
            let accuracy_rate = roll(rng, 40.0, 60.0);
            GameDetails::StroopTest {
                accuracy_rate,
                correct_answers: (accuracy_rate as f64 / 100.0 * 30.0).round() as u32,
                total_questions: 30,
            }
        }
        GameType::MathSprint => {
            let accuracy_rate = roll(rng, 45.0, 50.0);
            let problems_solved = roll(rng, 30.0, 20.0);
            GameDetails::MathSprint {
                accuracy_rate,
                problems_solved,
                total_problems: problems_solved + roll(rng, 10.0, 0.0),
            }
        }
        GameType::CreativeUses => GameDetails::CreativeUses {
            uses_generated: roll(rng, 20.0, 10.0),
            originality_score: roll(rng, 30.0, 70.0),
            fluency_score: (score as f64 * 0.7).round() as u32,
            flexibility_score: (score as f64 * 0.3).round() as u32,
        },
        GameType::ScenarioChallenge => GameDetails::ScenarioChallenge {
            response_quality: roll(rng, 30.0, 70.0),
            word_count: roll(rng, 300.0, 200.0),
            scenarios_completed: roll(rng, 2.0, 3.0),
        },
        GameType::CardFlip => {
            let attempts = roll(rng, 20.0, 15.0);
            let pairs_found = (attempts as f64 * 0.6).round() as u32;
            GameDetails::CardFlip {
                attempts,
                pairs_found,
                total_pairs: 12,
                accuracy_rate: ratio(pairs_found, attempts),
            }
        }
        GameType::SignSudoku => {
            let cells_completed = roll(rng, 20.0, 60.0);
            let errors = roll(rng, 5.0, 0.0);
            GameDetails::SignSudoku {
                cells_completed,
                total_cells: 81,
                errors,
                accuracy_rate: ratio(cells_completed - errors, cells_completed),
            }
        }
        GameType::DebateMode => GameDetails::DebateMode {
            pros_count: roll(rng, 5.0, 5.0),
            cons_count: roll(rng, 5.0, 5.0),
            argument_quality: roll(rng, 25.0, 75.0),
            word_count: roll(rng, 400.0, 300.0),
        },
        GameType::InterviewMode => GameDetails::InterviewMode {
            questions_answered: roll(rng, 2.0, 3.0),
            average_response_length: roll(rng, 200.0, 300.0),
            response_quality: roll(rng, 20.0, 80.0),
        },
        GameType::BartTest => {
            let balloons_popped = roll(rng, 10.0, 5.0);
            let total_pumps = roll(rng, 50.0, 30.0);
            GameDetails::BartTest {
                balloons_popped,
                total_pumps,
                risk_score: roll(rng, 40.0, 60.0),
                average_pumps_per_balloon: (total_pumps as f64 / (balloons_popped + 1) as f64).round() as u32,
            }
        }
    }
}

/// Generate the candidate list for one game.
pub fn generate_candidates<R: Rng + ?Sized>(
    rng: &mut R,
    game: GameType,
    now: DateTime<Utc>,
    history_days: u32,
) -> Vec<CandidateRecord> {
    let profile = profile(game);

    (0..profile.count)
        .map(|_| {
            let score = roll(rng, profile.score.0, profile.score.1);
            let time_taken = roll(rng, profile.time.0, profile.time.1);
            let details = generate_details(rng, game, score);

            CandidateRecord {
                id: uuid::Builder::from_random_bytes(rng.random()).into_uuid(),
                candidate_name: random_name(rng),
                score,
                time_taken,
                completion_date: random_date(rng, now, history_days),
                details,
            }
        })
        .collect()
}

// ============================================================================
// DATASET
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMockData {
    pub game_type: GameType,
    pub game_name: String,
    pub candidates: Vec<CandidateRecord>,
}

/// All games' records for one session.
#[derive(Debug, Clone)]
pub struct MockDataset {
    games: Vec<GameMockData>,
}

impl MockDataset {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, now: DateTime<Utc>, history_days: u32) -> Self {
        let games: Vec<GameMockData> = GameType::ALL
            .iter()
            .map(|&game| GameMockData {
                game_type: game,
                game_name: game.display_name().to_string(),
                candidates: generate_candidates(rng, game, now, history_days),
            })
            .collect();

        debug!(
            games = games.len(),
            records = games.iter().map(|g| g.candidates.len()).sum::<usize>(),
            "generated mock dataset"
        );

        MockDataset { games }
    }

    /// Reproducible dataset for a given seed.
    pub fn seeded(seed: u64, history_days: u32) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::generate(&mut rng, Utc::now(), history_days)
    }

    /// Dataset from the configured seed, or fresh randomness when unset.
    pub fn from_seed(seed: Option<u64>, history_days: u32) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed, history_days),
            None => Self::generate(&mut rand::rng(), Utc::now(), history_days),
        }
    }

    pub fn from_games(games: Vec<GameMockData>) -> Self {
        MockDataset { games }
    }

    /// Records for a game; empty when the dataset has none for it.
    pub fn candidates_for(&self, game: GameType) -> &[CandidateRecord] {
        self.games
            .iter()
            .find(|g| g.game_type == game)
            .map(|g| g.candidates.as_slice())
            .unwrap_or(&[])
    }

    pub fn find_candidate(&self, game: GameType, id: Uuid) -> Option<&CandidateRecord> {
        self.candidates_for(game).iter().find(|c| c.id == id)
    }

    pub fn available_games(&self) -> Vec<(GameType, &str)> {
        self.games
            .iter()
            .map(|g| (g.game_type, g.game_name.as_str()))
            .collect()
    }

    pub fn all(&self) -> impl Iterator<Item = &GameMockData> {
        self.games.iter()
    }
}
