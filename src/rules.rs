//! The deterministic score/difficulty/tone rule table.
//!
//! The model never decides how many points a round is worth. Its suggested
//! deltas are advisory flavor; every transition below is a pure function of
//! the previous state and the locally graded outcome, so a hallucinated
//! number can never corrupt a session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered difficulty ladder. Transitions move one step at a time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    VeryEasy,
    Easy,
    Normal,
    Hard,
    Challenging,
}

impl Difficulty {
    pub fn step_up(self) -> Self {
        match self {
            Difficulty::VeryEasy => Difficulty::Easy,
            Difficulty::Easy => Difficulty::Normal,
            Difficulty::Normal => Difficulty::Hard,
            Difficulty::Hard | Difficulty::Challenging => Difficulty::Challenging,
        }
    }

    pub fn step_down(self) -> Self {
        match self {
            Difficulty::VeryEasy | Difficulty::Easy => Difficulty::VeryEasy,
            Difficulty::Normal => Difficulty::Easy,
            Difficulty::Hard => Difficulty::Normal,
            Difficulty::Challenging => Difficulty::Hard,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::VeryEasy => "very easy",
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Challenging => "challenging",
        };
        write!(f, "{s}")
    }
}

/// Conversational mood. Flavor only: echoed into prompts, no gameplay effect.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Normal,
    Excited,
    Sassy,
    Tense,
}

impl Tone {
    /// Lenient parse for model-suggested tones. Unknown strings are rejected
    /// so the rule table's tone stands.
    pub fn parse_suggested(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "normal" | "neutral" => Some(Tone::Normal),
            "excited" => Some(Tone::Excited),
            "sassy" => Some(Tone::Sassy),
            "tense" | "challenging" => Some(Tone::Tense),
            _ => None,
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tone::Normal => "normal",
            Tone::Excited => "excited",
            Tone::Sassy => "sassy",
            Tone::Tense => "tense",
        };
        write!(f, "{s}")
    }
}

/// Everything a graded round changes, computed deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundOutcome {
    pub correct: bool,
    /// Applied delta after floor clamping; `new_score - old_score`.
    pub delta: i64,
    pub new_score: i64,
    pub new_difficulty: Difficulty,
    pub new_tone: Tone,
    pub won: bool,
}

/// The fixed rule table. One table per session; constructible for tests.
#[derive(Debug, Clone)]
pub struct RuleTable {
    pub correct_delta: i64,
    pub incorrect_delta: i64,
    /// Scores never drop below this.
    pub score_floor: i64,
    pub win_threshold: i64,
    /// Difficulty advances when the score crosses a multiple of this, upward.
    pub difficulty_band: i64,
    /// At or above this score the tone locks to tense, regardless of outcome.
    pub tense_threshold: i64,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            correct_delta: 100,
            incorrect_delta: 50,
            score_floor: 0,
            win_threshold: 1000,
            difficulty_band: 200,
            tense_threshold: 750,
        }
    }
}

impl RuleTable {
    /// Apply one graded answer to the score/difficulty pair.
    pub fn apply(&self, score: i64, difficulty: Difficulty, correct: bool) -> RoundOutcome {
        let (new_score, new_difficulty, tone) = if correct {
            let new_score = score + self.correct_delta;
            let crossed_band =
                new_score / self.difficulty_band > score / self.difficulty_band;
            let new_difficulty = if crossed_band {
                difficulty.step_up()
            } else {
                difficulty
            };
            (new_score, new_difficulty, Tone::Excited)
        } else {
            let new_score = (score - self.incorrect_delta).max(self.score_floor);
            (new_score, difficulty.step_down(), Tone::Normal)
        };

        let new_tone = if new_score >= self.tense_threshold {
            Tone::Tense
        } else {
            tone
        };

        RoundOutcome {
            correct,
            delta: new_score - score,
            new_score,
            new_difficulty,
            new_tone,
            won: new_score >= self.win_threshold,
        }
    }
}
