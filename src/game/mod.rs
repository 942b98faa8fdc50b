//! # Game Module
//!
//! Contains definitions shared by the per-game session handlers and their
//! post-hoc evaluators. Each game kind is a small protocol: a textual move
//! grammar, hidden state, per-move validation, and a terminal condition.
//! Handlers judge play as it happens; evaluators judge a finished transcript.

use anyhow::Result;
use rand::rngs::SmallRng;

use crate::model::Category;
use crate::model::Question;
use crate::model::Turn;

/* UTILITY MODULES */

pub mod error;
pub mod util;

/* GAME MODULES */

pub mod adapt;
pub mod duel;
pub mod puzzle;
pub mod query;

use error::GameError;

/* DEFINITIONS */

/// How a round left its session, as judged by the handler. The scheduler
/// retires a session on anything but [`Outcome::Continue`]; it never
/// inspects feedback text to decide termination.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The session is still live; schedule another round.
    Continue,

    /// The solver reached the game's winning condition.
    Win,

    /// The game was decided against the solver.
    Lose,

    /// The move was unparseable or illegal in a way this game treats as
    /// immediately disqualifying.
    Invalid,

    /// The game ended without a verdict the handler can issue itself; the
    /// evaluator decides success from the transcript.
    Retire,
}

impl Outcome {
    /// True iff the session should be retired after this round.
    pub fn terminal(self) -> bool {
        self != Self::Continue
    }
}

/// The product of one handler round: a canonical summary of the parsed move
/// (persisted as the turn's `result`), the feedback text shown to the solver
/// on its next round, and the session outcome.
#[derive(Clone, Debug)]
pub struct Exchange {
    pub result: String,
    pub feedback: String,
    pub outcome: Outcome,
}

impl Exchange {
    pub fn new(
        result: impl Into<String>,
        feedback: impl Into<String>,
        outcome: Outcome,
    ) -> Self {
        Self {
            result: result.into(),
            feedback: feedback.into(),
            outcome,
        }
    }

    /// A round that keeps the session alive.
    pub fn next(result: impl Into<String>, feedback: impl Into<String>) -> Self {
        Self::new(result, feedback, Outcome::Continue)
    }

    pub fn win(result: impl Into<String>, feedback: impl Into<String>) -> Self {
        Self::new(result, feedback, Outcome::Win)
    }

    pub fn lose(result: impl Into<String>, feedback: impl Into<String>) -> Self {
        Self::new(result, feedback, Outcome::Lose)
    }

    pub fn retire(
        result: impl Into<String>,
        feedback: impl Into<String>,
    ) -> Self {
        Self::new(result, feedback, Outcome::Retire)
    }

    /// A disqualifying move. The result is always the literal `"Invalid"`;
    /// games that merely burn the turn on bad input construct their
    /// exchange with [`Exchange::new`] and [`Outcome::Continue`] instead.
    pub fn invalid(feedback: impl Into<String>) -> Self {
        Self::new("Invalid", feedback, Outcome::Invalid)
    }
}

/* INTERFACES */

pub trait Handler: Send {
    /// Parses the solver's completion, advances hidden state, and returns
    /// the round's exchange.
    ///
    /// Matching follows the command grammar of the game kind, always taking
    /// the LAST occurrence of a command in the text (solvers restate moves
    /// while reasoning). When the text matches no grammar or the move
    /// violates a rule, the exchange carries `("Invalid", <reason>)`; this
    /// function never fails and never panics on adversarial input.
    fn parse_response(&mut self, text: &str) -> Exchange;

    /// True iff `result` (a move summary previously returned by this
    /// handler) satisfies the game's terminal acceptance test against the
    /// current hidden state. Used when resuming persisted sessions.
    fn is_complete(&self, result: &str) -> bool;
}

pub trait Evaluate: Send + Sync {
    /// Judges a finished transcript, returning success plus human-readable
    /// detail. Pure: must not re-seed or mutate anything. For games whose
    /// hidden state drifts during play, the recorded feedback is trusted
    /// rather than re-simulated.
    fn evaluate_game(&self, question: &Question, turns: &[Turn])
    -> (bool, String);
}

/* GAME KIND DISPATCH */

/// Selects one of the game protocols the harness implements. Constructed
/// from a question's `title` field; the palindrome-construction variants
/// share one kind, with their length suffix stripped during parsing.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum GameKind {
    /* INFORMATION QUERY */
    Wordle,
    Impostors,
    GuessMax,
    ListQuery,
    BitCompare,
    MedianQuery,
    CircleFinding,
    MinMax,
    BitQuery,
    LegendaryTree,

    /* DYNAMIC ADAPTATION */
    DriftingPassword,
    BitGuessing,
    TrainPursuit,
    MimicHunt,
    ZeroFinding,
    PermutationDiscovery,
    MahjongDetective,
    FindHidden,
    RotaryLock,
    AttendanceCheck,

    /* STATE OPERATION */
    CactusSearch,
    ChemicalSynthesis,
    ColorMagic,
    DarkMaze,
    FindBiggest,
    MagneticField,
    PalindromeConstruction,
    RainbowCandy,
    SafepathFinder,
    TreasureHunt,
    VladikMaze,

    /* STRATEGIC GAMING */
    KnightBattle,
    AssiutChess,
    PaperNumber,
    GridColoring,
    GridSum,
    DecreasingGame,
    ZigzagGraph,
    BeeChase,
    PizzaSlice,
    XorBreaking,
    GeoGame,
}

/// Every kind, in listing order.
pub const KINDS: [GameKind; 42] = [
    GameKind::Wordle,
    GameKind::Impostors,
    GameKind::GuessMax,
    GameKind::ListQuery,
    GameKind::BitCompare,
    GameKind::MedianQuery,
    GameKind::CircleFinding,
    GameKind::MinMax,
    GameKind::BitQuery,
    GameKind::LegendaryTree,
    GameKind::DriftingPassword,
    GameKind::BitGuessing,
    GameKind::TrainPursuit,
    GameKind::MimicHunt,
    GameKind::ZeroFinding,
    GameKind::PermutationDiscovery,
    GameKind::MahjongDetective,
    GameKind::FindHidden,
    GameKind::RotaryLock,
    GameKind::AttendanceCheck,
    GameKind::CactusSearch,
    GameKind::ChemicalSynthesis,
    GameKind::ColorMagic,
    GameKind::DarkMaze,
    GameKind::FindBiggest,
    GameKind::MagneticField,
    GameKind::PalindromeConstruction,
    GameKind::RainbowCandy,
    GameKind::SafepathFinder,
    GameKind::TreasureHunt,
    GameKind::VladikMaze,
    GameKind::KnightBattle,
    GameKind::AssiutChess,
    GameKind::PaperNumber,
    GameKind::GridColoring,
    GameKind::GridSum,
    GameKind::DecreasingGame,
    GameKind::ZigzagGraph,
    GameKind::BeeChase,
    GameKind::PizzaSlice,
    GameKind::XorBreaking,
    GameKind::GeoGame,
];

impl GameKind {
    /// Resolves a question title to a game kind.
    ///
    /// Any suffix after the first `.` is discarded, and a trailing run of
    /// digits is stripped before matching so that sized variants such as
    /// `PalindromeConstruction10` resolve to their shared kind. Unknown
    /// titles produce an error carrying the closest known name.
    pub fn from_title(title: &str) -> Result<Self, GameError> {
        let stem = title
            .split('.')
            .next()
            .unwrap_or(title)
            .trim();
        if let Some(kind) = Self::lookup(stem) {
            return Ok(kind);
        }

        let trimmed = stem.trim_end_matches(|c: char| c.is_ascii_digit());
        if !trimmed.is_empty() {
            if let Some(kind) = Self::lookup(trimmed) {
                return Ok(kind);
            }
        }

        Err(GameError::UnknownKind {
            title: title.to_owned(),
            suggestion: Self::closest(stem),
        })
    }

    fn lookup(name: &str) -> Option<Self> {
        let kind = match name {
            "Wordle" => Self::Wordle,
            "FindTheImpostors" => Self::Impostors,
            "GuessMax" => Self::GuessMax,
            "ListQuery" => Self::ListQuery,
            "BitCompare" => Self::BitCompare,
            "MedianQuery" => Self::MedianQuery,
            "CircleFinding" => Self::CircleFinding,
            "MinMax" => Self::MinMax,
            "BitQuery" => Self::BitQuery,
            "LegendaryTree" => Self::LegendaryTree,
            "RPD" => Self::DriftingPassword,
            "BitGuessing" => Self::BitGuessing,
            "TrainPursuit" => Self::TrainPursuit,
            "MimicHunt" => Self::MimicHunt,
            "ZeroFinding" => Self::ZeroFinding,
            "PermutationDiscovery" => Self::PermutationDiscovery,
            "MahjongDetective" => Self::MahjongDetective,
            "FindHidden" => Self::FindHidden,
            "RotaryLock" => Self::RotaryLock,
            "AttendanceCheck" => Self::AttendanceCheck,
            "CactusSearch" => Self::CactusSearch,
            "ChemicalSynthesis" => Self::ChemicalSynthesis,
            "ColorMagic" => Self::ColorMagic,
            "DarkMaze" | "DarkMazeExplorer" => Self::DarkMaze,
            "FindBiggest" => Self::FindBiggest,
            "MagneticField" => Self::MagneticField,
            "PalindromeConstruction" => Self::PalindromeConstruction,
            "RainbowCandy" => Self::RainbowCandy,
            "SafepathFinder" => Self::SafepathFinder,
            "TreasureHunt" => Self::TreasureHunt,
            "VladikMaze" => Self::VladikMaze,
            "KnightBattle" => Self::KnightBattle,
            "AssiutChess" | "AssiutGuess" => Self::AssiutChess,
            "PaperNumber" => Self::PaperNumber,
            "GridColoring" => Self::GridColoring,
            "GridSum" | "GridGame" => Self::GridSum,
            "DecreasingGame" => Self::DecreasingGame,
            "ZigzagGraph" => Self::ZigzagGraph,
            "BeeChase" => Self::BeeChase,
            "PizzaSlice" => Self::PizzaSlice,
            "XORBreaking" => Self::XorBreaking,
            "GeoGame" => Self::GeoGame,
            _ => return None,
        };
        Some(kind)
    }

    fn closest(name: &str) -> Option<&'static str> {
        KINDS
            .iter()
            .map(|kind| kind.name())
            .map(|known| (known, strsim::normalized_levenshtein(name, known)))
            .filter(|&(_, score)| score > 0.5)
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(known, _)| known)
    }

    /// The canonical name of this kind, as used in question titles and in
    /// evaluation reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Wordle => "Wordle",
            Self::Impostors => "FindTheImpostors",
            Self::GuessMax => "GuessMax",
            Self::ListQuery => "ListQuery",
            Self::BitCompare => "BitCompare",
            Self::MedianQuery => "MedianQuery",
            Self::CircleFinding => "CircleFinding",
            Self::MinMax => "MinMax",
            Self::BitQuery => "BitQuery",
            Self::LegendaryTree => "LegendaryTree",
            Self::DriftingPassword => "RPD",
            Self::BitGuessing => "BitGuessing",
            Self::TrainPursuit => "TrainPursuit",
            Self::MimicHunt => "MimicHunt",
            Self::ZeroFinding => "ZeroFinding",
            Self::PermutationDiscovery => "PermutationDiscovery",
            Self::MahjongDetective => "MahjongDetective",
            Self::FindHidden => "FindHidden",
            Self::RotaryLock => "RotaryLock",
            Self::AttendanceCheck => "AttendanceCheck",
            Self::CactusSearch => "CactusSearch",
            Self::ChemicalSynthesis => "ChemicalSynthesis",
            Self::ColorMagic => "ColorMagic",
            Self::DarkMaze => "DarkMaze",
            Self::FindBiggest => "FindBiggest",
            Self::MagneticField => "MagneticField",
            Self::PalindromeConstruction => "PalindromeConstruction",
            Self::RainbowCandy => "RainbowCandy",
            Self::SafepathFinder => "SafepathFinder",
            Self::TreasureHunt => "TreasureHunt",
            Self::VladikMaze => "VladikMaze",
            Self::KnightBattle => "KnightBattle",
            Self::AssiutChess => "AssiutChess",
            Self::PaperNumber => "PaperNumber",
            Self::GridColoring => "GridColoring",
            Self::GridSum => "GridSum",
            Self::DecreasingGame => "DecreasingGame",
            Self::ZigzagGraph => "ZigzagGraph",
            Self::BeeChase => "BeeChase",
            Self::PizzaSlice => "PizzaSlice",
            Self::XorBreaking => "XORBreaking",
            Self::GeoGame => "GeoGame",
        }
    }

    /// The scheduling category this kind belongs to.
    pub fn category(&self) -> Category {
        match self {
            Self::Wordle
            | Self::Impostors
            | Self::GuessMax
            | Self::ListQuery
            | Self::BitCompare
            | Self::MedianQuery
            | Self::CircleFinding
            | Self::MinMax
            | Self::BitQuery
            | Self::LegendaryTree => Category::InformationQuery,

            Self::DriftingPassword
            | Self::BitGuessing
            | Self::TrainPursuit
            | Self::MimicHunt
            | Self::ZeroFinding
            | Self::PermutationDiscovery
            | Self::MahjongDetective
            | Self::FindHidden
            | Self::RotaryLock
            | Self::AttendanceCheck => Category::DynamicAdaptation,

            Self::CactusSearch
            | Self::ChemicalSynthesis
            | Self::ColorMagic
            | Self::DarkMaze
            | Self::FindBiggest
            | Self::MagneticField
            | Self::PalindromeConstruction
            | Self::RainbowCandy
            | Self::SafepathFinder
            | Self::TreasureHunt
            | Self::VladikMaze => Category::StateOperation,

            Self::KnightBattle
            | Self::AssiutChess
            | Self::PaperNumber
            | Self::GridColoring
            | Self::GridSum
            | Self::DecreasingGame
            | Self::ZigzagGraph
            | Self::BeeChase
            | Self::PizzaSlice
            | Self::XorBreaking
            | Self::GeoGame => Category::StrategicGaming,
        }
    }

    /// Constructs a fresh session handler for `question`, including the
    /// session RNG for kinds with randomized adversaries or rule variants.
    pub fn session(&self, question: &Question) -> Result<Box<dyn Handler>> {
        let rng = util::session_rng(question.question_id);
        Ok(match self {
            Self::Wordle => Box::new(query::wordle::Session::new(question)?),
            Self::Impostors => {
                Box::new(query::impostors::Session::new(question)?)
            },
            Self::GuessMax => {
                Box::new(query::guess_max::Session::new(question)?)
            },
            Self::ListQuery => {
                Box::new(query::linked_list::Session::new(question)?)
            },
            Self::BitCompare => {
                Box::new(query::bit_compare::Session::new(question)?)
            },
            Self::MedianQuery => {
                Box::new(query::median::Session::new(question)?)
            },
            Self::CircleFinding => {
                Box::new(query::circle::Session::new(question)?)
            },
            Self::MinMax => Box::new(query::min_max::Session::new(question)?),
            Self::BitQuery => {
                Box::new(query::bit_query::Session::new(question)?)
            },
            Self::LegendaryTree => {
                Box::new(query::legendary_tree::Session::new(question)?)
            },
            Self::DriftingPassword => {
                Box::new(adapt::drift::Session::new(question)?)
            },
            Self::BitGuessing => {
                Box::new(adapt::popcount::Session::new(question)?)
            },
            Self::TrainPursuit => {
                Box::new(adapt::train::Session::new(question)?)
            },
            Self::MimicHunt => {
                Box::new(adapt::mimic::Session::new(question, rng)?)
            },
            Self::ZeroFinding => {
                Box::new(adapt::zero_finding::Session::new(question)?)
            },
            Self::PermutationDiscovery => {
                Box::new(adapt::permutation::Session::new(question)?)
            },
            Self::MahjongDetective => {
                Box::new(adapt::mahjong::Session::new(question)?)
            },
            Self::FindHidden => {
                Box::new(adapt::hidden_number::Session::new(question, rng)?)
            },
            Self::RotaryLock => {
                Box::new(adapt::rotary::Session::new(question)?)
            },
            Self::AttendanceCheck => {
                Box::new(adapt::attendance::Session::new(question, rng)?)
            },
            Self::CactusSearch => {
                Box::new(puzzle::cactus::Session::new(question, rng)?)
            },
            Self::ChemicalSynthesis => {
                Box::new(puzzle::chemical::Session::new(question, rng)?)
            },
            Self::ColorMagic => {
                Box::new(puzzle::color_magic::Session::new(question)?)
            },
            Self::DarkMaze => {
                Box::new(puzzle::dark_maze::Session::new(question)?)
            },
            Self::FindBiggest => {
                Box::new(puzzle::find_biggest::Session::new(question, rng)?)
            },
            Self::MagneticField => {
                Box::new(puzzle::magnetic::Session::new(question)?)
            },
            Self::PalindromeConstruction => {
                Box::new(puzzle::palindrome::Session::new(question, rng)?)
            },
            Self::RainbowCandy => {
                Box::new(puzzle::rainbow::Session::new(question)?)
            },
            Self::SafepathFinder => {
                Box::new(puzzle::safepath::Session::new(question)?)
            },
            Self::TreasureHunt => {
                Box::new(puzzle::treasure::Session::new(question, rng)?)
            },
            Self::VladikMaze => {
                Box::new(puzzle::vladik::Session::new(question, rng)?)
            },
            Self::KnightBattle => {
                Box::new(duel::knight::Session::new(question, rng)?)
            },
            Self::AssiutChess => {
                Box::new(duel::assiut::Session::new(question, rng)?)
            },
            Self::PaperNumber => {
                Box::new(duel::paper::Session::new(question, rng)?)
            },
            Self::GridColoring => {
                Box::new(duel::grid_coloring::Session::new(question, rng)?)
            },
            Self::GridSum => {
                Box::new(duel::grid_sum::Session::new(question, rng)?)
            },
            Self::DecreasingGame => {
                Box::new(duel::decreasing::Session::new(question, rng)?)
            },
            Self::ZigzagGraph => {
                Box::new(duel::zigzag::Session::new(question, rng)?)
            },
            Self::BeeChase => {
                Box::new(duel::bee_chase::Session::new(question, rng)?)
            },
            Self::PizzaSlice => {
                Box::new(duel::pizza::Session::new(question, rng)?)
            },
            Self::XorBreaking => {
                Box::new(duel::xor_break::Session::new(question, rng)?)
            },
            Self::GeoGame => {
                Box::new(duel::geo::Session::new(question, rng)?)
            },
        })
    }

    /// Constructs the stateless evaluator matching this kind.
    pub fn evaluator(&self) -> Box<dyn Evaluate> {
        match self {
            Self::Wordle => Box::new(query::wordle::Evaluator),
            Self::Impostors => Box::new(query::impostors::Evaluator),
            Self::GuessMax => Box::new(query::guess_max::Evaluator),
            Self::ListQuery => Box::new(query::linked_list::Evaluator),
            Self::BitCompare => Box::new(query::bit_compare::Evaluator),
            Self::MedianQuery => Box::new(query::median::Evaluator),
            Self::CircleFinding => Box::new(query::circle::Evaluator),
            Self::MinMax => Box::new(query::min_max::Evaluator),
            Self::BitQuery => Box::new(query::bit_query::Evaluator),
            Self::LegendaryTree => Box::new(query::legendary_tree::Evaluator),
            Self::DriftingPassword => Box::new(adapt::drift::Evaluator),
            Self::BitGuessing => Box::new(adapt::popcount::Evaluator),
            Self::TrainPursuit => Box::new(adapt::train::Evaluator),
            Self::MimicHunt => Box::new(adapt::mimic::Evaluator),
            Self::ZeroFinding => Box::new(adapt::zero_finding::Evaluator),
            Self::PermutationDiscovery => {
                Box::new(adapt::permutation::Evaluator)
            },
            Self::MahjongDetective => Box::new(adapt::mahjong::Evaluator),
            Self::FindHidden => Box::new(adapt::hidden_number::Evaluator),
            Self::RotaryLock => Box::new(adapt::rotary::Evaluator),
            Self::AttendanceCheck => Box::new(adapt::attendance::Evaluator),
            Self::CactusSearch => Box::new(puzzle::cactus::Evaluator),
            Self::ChemicalSynthesis => Box::new(puzzle::chemical::Evaluator),
            Self::ColorMagic => Box::new(puzzle::color_magic::Evaluator),
            Self::DarkMaze => Box::new(puzzle::dark_maze::Evaluator),
            Self::FindBiggest => Box::new(puzzle::find_biggest::Evaluator),
            Self::MagneticField => Box::new(puzzle::magnetic::Evaluator),
            Self::PalindromeConstruction => {
                Box::new(puzzle::palindrome::Evaluator)
            },
            Self::RainbowCandy => Box::new(puzzle::rainbow::Evaluator),
            Self::SafepathFinder => Box::new(puzzle::safepath::Evaluator),
            Self::TreasureHunt => Box::new(puzzle::treasure::Evaluator),
            Self::VladikMaze => Box::new(puzzle::vladik::Evaluator),
            Self::KnightBattle => Box::new(duel::knight::Evaluator),
            Self::AssiutChess => Box::new(duel::assiut::Evaluator),
            Self::PaperNumber => Box::new(duel::paper::Evaluator),
            Self::GridColoring => Box::new(duel::grid_coloring::Evaluator),
            Self::GridSum => Box::new(duel::grid_sum::Evaluator),
            Self::DecreasingGame => Box::new(duel::decreasing::Evaluator),
            Self::ZigzagGraph => Box::new(duel::zigzag::Evaluator),
            Self::BeeChase => Box::new(duel::bee_chase::Evaluator),
            Self::PizzaSlice => Box::new(duel::pizza::Evaluator),
            Self::XorBreaking => Box::new(duel::xor_break::Evaluator),
            Self::GeoGame => Box::new(duel::geo::Evaluator),
        }
    }
}

/// Shorthand for the RNG type handlers draw adversary decisions from.
pub type Rng = SmallRng;

/* TESTS */
