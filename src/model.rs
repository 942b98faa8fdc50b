//! # Data Model Module
//!
//! Central definitions for the data that flows through the harness: questions
//! loaded from problem files, turns exchanged with the solver, transcript
//! records persisted between runs, and the reports emitted by evaluation.

use anyhow::Result;
use anyhow::anyhow;
use anyhow::Context;
use clap::ValueEnum;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

use std::fmt;

/* CATEGORIES */

/// The four families of games the harness knows how to drive. The category
/// determines how the scheduler caps rounds and composes prompts; the game
/// kind within a category determines everything else.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum Category {
    /// Pure-oracle games over fixed hidden state.
    InformationQuery,

    /// Games whose hidden state evolves in response to solver moves.
    DynamicAdaptation,

    /// World-manipulation puzzles with a target configuration.
    StateOperation,

    /// Two-player adversarial games against a built-in opponent.
    StrategicGaming,
}

impl Category {
    /// Maps the question file's `type` field to a category. Both the
    /// human-readable form (`"Information Query"`) and the snake_case form
    /// used in file layouts are accepted.
    pub fn from_type(name: &str) -> Option<Self> {
        match name.trim() {
            "Information Query" | "information_query" => {
                Some(Self::InformationQuery)
            },
            "Dynamic Adaptation" | "dynamic_adaptation" => {
                Some(Self::DynamicAdaptation)
            },
            "State Operation" | "state_operation" => {
                Some(Self::StateOperation)
            },
            "Strategic Gaming" | "strategic_gaming" => {
                Some(Self::StrategicGaming)
            },
            _ => None,
        }
    }

    /// True for the category whose sessions are capped by their question's
    /// own `turns` field rather than the global round limit.
    pub fn strategic(&self) -> bool {
        matches!(self, Self::StrategicGaming)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::InformationQuery => "information_query",
            Self::DynamicAdaptation => "dynamic_adaptation",
            Self::StateOperation => "state_operation",
            Self::StrategicGaming => "strategic_gaming",
        };
        write!(f, "{name}")
    }
}

/* QUESTIONS */

/// One immutable problem instance, parsed from a line of the question file.
///
/// Only the fields every game shares are typed; the kind-specific payload
/// (hidden answers, boards, graphs, and so on) stays as JSON and is pulled
/// out through the typed accessors below, which attach the question id to
/// any shape mismatch they encounter.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Question {
    #[serde(deserialize_with = "integer_like")]
    pub question_id: u64,

    pub title: String,

    #[serde(default)]
    pub prompt: String,

    #[serde(rename = "type", default)]
    pub question_type: Option<String>,

    #[serde(default)]
    pub difficulty: Option<String>,

    #[serde(default)]
    pub scale: Option<Value>,

    #[serde(default)]
    pub turns: Option<u64>,

    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Question {
    /// Returns the category encoded in this question's `type` field.
    pub fn category(&self) -> Result<Category> {
        let name = self
            .question_type
            .as_deref()
            .ok_or_else(|| self.malformed("missing 'type' field"))?;
        Category::from_type(name)
            .ok_or_else(|| self.malformed("unrecognized 'type' field"))
    }

    /// Returns the raw payload field `name`.
    pub fn field(&self, name: &str) -> Result<&Value> {
        self.payload
            .get(name)
            .ok_or_else(|| self.malformed(&format!("missing '{name}' field")))
    }

    pub fn u64_field(&self, name: &str) -> Result<u64> {
        self.field(name)?
            .as_u64()
            .ok_or_else(|| {
                self.malformed(&format!("'{name}' is not an integer"))
            })
    }

    pub fn i64_field(&self, name: &str) -> Result<i64> {
        self.field(name)?
            .as_i64()
            .ok_or_else(|| {
                self.malformed(&format!("'{name}' is not an integer"))
            })
    }

    pub fn str_field(&self, name: &str) -> Result<&str> {
        self.field(name)?
            .as_str()
            .ok_or_else(|| {
                self.malformed(&format!("'{name}' is not a string"))
            })
    }

    /// Returns payload field `name` as a list of signed integers.
    pub fn int_list_field(&self, name: &str) -> Result<Vec<i64>> {
        self.field(name)?
            .as_array()
            .ok_or_else(|| self.malformed(&format!("'{name}' is not a list")))?
            .iter()
            .map(|v| {
                v.as_i64().ok_or_else(|| {
                    self.malformed(&format!("'{name}' has a non-integer entry"))
                })
            })
            .collect()
    }

    /// Returns payload field `name` as a list of coordinate pairs.
    pub fn pair_list_field(&self, name: &str) -> Result<Vec<(i64, i64)>> {
        self.field(name)?
            .as_array()
            .ok_or_else(|| self.malformed(&format!("'{name}' is not a list")))?
            .iter()
            .map(pair_of)
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                self.malformed(&format!("'{name}' has a malformed pair"))
            })
    }

    /// Returns this question's `scale` as a single integer.
    pub fn scale_u64(&self) -> Result<u64> {
        self.scale
            .as_ref()
            .and_then(|v| v.as_u64())
            .ok_or_else(|| self.malformed("'scale' is not an integer"))
    }

    /// Returns this question's `scale` as an `(n, m)` pair.
    pub fn scale_pair(&self) -> Result<(u64, u64)> {
        self.scale
            .as_ref()
            .and_then(pair_of)
            .map(|(n, m)| (n as u64, m as u64))
            .ok_or_else(|| self.malformed("'scale' is not a pair"))
    }

    fn malformed(&self, hint: &str) -> anyhow::Error {
        anyhow!("Question {} is malformed: {hint}.", self.question_id)
    }
}

/// Extracts a two-element integer array from a JSON value.
pub fn pair_of(value: &Value) -> Option<(i64, i64)> {
    let items = value.as_array()?;
    match items.as_slice() {
        [a, b] => Some((a.as_i64()?, b.as_i64()?)),
        _ => None,
    }
}

/// Accepts `question_id` fields encoded either as a JSON number or as a
/// numeric string, both of which appear in problem files in the wild.
fn integer_like<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Loads a newline-delimited question file, skipping blank lines. A line
/// that fails to parse is an error: questions are authored inputs, unlike
/// transcript lines, which may be truncated by interrupted runs.
pub fn load_questions(path: &std::path::Path) -> Result<Vec<Question>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}.", path.display()))?;
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            serde_json::from_str(line).with_context(|| {
                format!("Failed to parse a question in {}.", path.display())
            })
        })
        .collect()
}

/* TRANSCRIPTS */

/// One exchange between the solver and a game handler. Created by the
/// scheduler, appended to the session log, and never edited afterwards.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Turn {
    /// 1-based round number, strictly increasing per session with no gaps.
    pub round: u64,

    /// The full completion as returned by the backend.
    pub raw_output: String,

    /// The completion with any leading reasoning segment stripped.
    pub output: String,

    /// Canonical summary of the parsed move, e.g. `"Guess: 12"`.
    pub result: String,

    /// The handler's textual response, fed back on the next round.
    pub feedback: String,
}

/// The persisted state of one session: every turn it has played so far.
/// Exactly one live record exists per question id after store recovery.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TranscriptRecord {
    #[serde(deserialize_with = "integer_like")]
    pub question_id: u64,
    pub turns: Vec<Turn>,
}

/* EVALUATION REPORTS */

/// Per-question verdict produced by an evaluator.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct QuestionReport {
    pub question_id: u64,
    pub success: bool,
    pub detail: String,
    pub num_turns: usize,
}

/// Aggregate evaluation output for one game kind, written as a single JSON
/// document to the evaluation file.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EvalReport {
    pub game_type: String,
    pub total_questions: usize,
    pub successful_games: usize,
    pub accuracy: f64,
    pub average_turns: f64,
    pub detailed_results: Vec<QuestionReport>,
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn category_accepts_both_spellings() {
        assert_eq!(
            Category::from_type("Information Query"),
            Some(Category::InformationQuery)
        );
        assert_eq!(
            Category::from_type("strategic_gaming"),
            Some(Category::StrategicGaming)
        );
        assert_eq!(Category::from_type("Chess"), None);
    }

    #[test]
    fn question_id_accepts_numbers_and_numeric_strings() {
        let q: Question = serde_json::from_str(
            r#"{"question_id": 3, "title": "Wordle", "answer": "ABCD"}"#,
        )
        .unwrap();
        assert_eq!(q.question_id, 3);

        let q: Question =
            serde_json::from_str(r#"{"question_id": "17", "title": "Wordle"}"#)
                .unwrap();
        assert_eq!(q.question_id, 17);
    }

    #[test]
    fn payload_accessors_attach_question_context() {
        let q: Question = serde_json::from_str(
            r#"{"question_id": 9, "title": "MinMax", "answer": "52877"}"#,
        )
        .unwrap();
        assert_eq!(q.str_field("answer").unwrap(), "52877");
        let err = q.u64_field("k").unwrap_err().to_string();
        assert!(err.contains('9'));
        assert!(err.contains('k'));
    }

    #[test]
    fn scale_reads_as_integer_or_pair() {
        let q: Question = serde_json::from_str(
            r#"{"question_id": 1, "title": "GridSum", "scale": [4, 6]}"#,
        )
        .unwrap();
        assert_eq!(q.scale_pair().unwrap(), (4, 6));
        assert!(q.scale_u64().is_err());

        let q: Question = serde_json::from_str(
            r#"{"question_id": 1, "title": "Wordle", "scale": 12}"#,
        )
        .unwrap();
        assert_eq!(q.scale_u64().unwrap(), 12);
    }

    #[test]
    fn turn_round_trips_through_json() {
        let turn = Turn {
            round: 2,
            raw_output: "<think>hm</think>My Guess: ABCD".into(),
            output: "My Guess: ABCD".into(),
            result: "ABCD".into(),
            feedback: "RRRR".into(),
        };
        let line = serde_json::to_string(&turn).unwrap();
        let back: Turn = serde_json::from_str(&line).unwrap();
        assert_eq!(back.round, 2);
        assert_eq!(back.feedback, "RRRR");
    }
}
