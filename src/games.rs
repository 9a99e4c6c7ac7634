// 🎮 Base Games - the nine assessment activities
//
// Every candidate record belongs to exactly one base game. The key is the
// stable identifier used in URLs, API payloads and config; the display name
// is what the operator sees.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// GAME TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameType {
    StroopTest,
    MathSprint,
    CreativeUses,
    ScenarioChallenge,
    CardFlip,
    SignSudoku,
    DebateMode,
    InterviewMode,
    BartTest,
}

/// Accent colour used by the game selector (web and terminal).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Accent {
    Blue,
    Green,
    Yellow,
    Purple,
    Orange,
    Indigo,
    Pink,
    Teal,
    Red,
}

impl Accent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Accent::Blue => "blue",
            Accent::Green => "green",
            Accent::Yellow => "yellow",
            Accent::Purple => "purple",
            Accent::Orange => "orange",
            Accent::Indigo => "indigo",
            Accent::Pink => "pink",
            Accent::Teal => "teal",
            Accent::Red => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown game type: {0}")]
pub struct UnknownGame(pub String);

impl GameType {
    /// All games, in selector order.
    pub const ALL: [GameType; 9] = [
        GameType::StroopTest,
        GameType::MathSprint,
        GameType::CreativeUses,
        GameType::ScenarioChallenge,
        GameType::CardFlip,
        GameType::SignSudoku,
        GameType::DebateMode,
        GameType::InterviewMode,
        GameType::BartTest,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            GameType::StroopTest => "stroop_test",
            GameType::MathSprint => "math_sprint",
            GameType::CreativeUses => "creative_uses",
            GameType::ScenarioChallenge => "scenario_challenge",
            GameType::CardFlip => "card_flip",
            GameType::SignSudoku => "sign_sudoku",
            GameType::DebateMode => "debate_mode",
            GameType::InterviewMode => "interview_mode",
            GameType::BartTest => "bart_test",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GameType::StroopTest => "Stroop Test",
            GameType::MathSprint => "Mental Math Sprint",
            GameType::CreativeUses => "Creative Uses",
            GameType::ScenarioChallenge => "Scenario Challenge",
            GameType::CardFlip => "Card Flip Challenge",
            GameType::SignSudoku => "Sign Sudoku",
            GameType::DebateMode => "Debate Mode",
            GameType::InterviewMode => "Interview Mode",
            GameType::BartTest => "BART Test",
        }
    }

    pub fn accent(&self) -> Accent {
        match self {
            GameType::StroopTest => Accent::Blue,
            GameType::MathSprint => Accent::Green,
            GameType::CreativeUses => Accent::Yellow,
            GameType::ScenarioChallenge => Accent::Purple,
            GameType::CardFlip => Accent::Orange,
            GameType::SignSudoku => Accent::Indigo,
            GameType::DebateMode => Accent::Pink,
            GameType::InterviewMode => Accent::Teal,
            GameType::BartTest => Accent::Red,
        }
    }

    /// Single-glyph icon shown next to the game name.
    pub fn icon(&self) -> &'static str {
        match self {
            GameType::StroopTest => "👁",
            GameType::MathSprint => "🧮",
            GameType::CreativeUses => "💡",
            GameType::ScenarioChallenge => "📖",
            GameType::CardFlip => "🃏",
            GameType::SignSudoku => "🔢",
            GameType::DebateMode => "💬",
            GameType::InterviewMode => "👤",
            GameType::BartTest => "🎮",
        }
    }
}

impl fmt::Display for GameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for GameType {
    type Err = UnknownGame;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GameType::ALL
            .iter()
            .copied()
            .find(|g| g.key() == s)
            .ok_or_else(|| UnknownGame(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_round_trip() {
        for game in GameType::ALL {
            assert_eq!(game.key().parse::<GameType>().unwrap(), game);
        }
    }

    #[test]
    fn test_unknown_key() {
        let err = "chess".parse::<GameType>().unwrap_err();
        assert_eq!(err, UnknownGame("chess".to_string()));
        assert_eq!(err.to_string(), "unknown game type: chess");
    }

    #[test]
    fn test_serde_uses_key() {
        let json = serde_json::to_string(&GameType::MathSprint).unwrap();
        assert_eq!(json, "\"math_sprint\"");

        let parsed: GameType = serde_json::from_str("\"bart_test\"").unwrap();
        assert_eq!(parsed, GameType::BartTest);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(GameType::MathSprint.display_name(), "Mental Math Sprint");
        assert_eq!(GameType::CardFlip.to_string(), "Card Flip Challenge");
        assert_eq!(GameType::StroopTest.accent(), Accent::Blue);
    }

    #[test]
    fn test_icons() {
        assert_eq!(GameType::StroopTest.icon(), "👁");
        assert_eq!(GameType::MathSprint.icon(), "🧮");
        assert_eq!(GameType::BartTest.icon(), "🎮");

        let mut icons: Vec<&str> = GameType::ALL.iter().map(|g| g.icon()).collect();
        icons.sort_unstable();
        icons.dedup();
        assert_eq!(icons.len(), GameType::ALL.len());
    }
}
