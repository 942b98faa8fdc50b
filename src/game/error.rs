//! # Game Error Module
//!
//! This module defines possible errors that could happen as a result of
//! malformed question input or an unrecognized game selection.

use std::{error::Error, fmt};

/* ERROR WRAPPER */

/// Wrapper for all game-related errors that could happen during runtime.
/// Note that failures to parse the solver's output are not errors: handlers
/// fold those into their feedback and never raise to the scheduler.
#[derive(Debug)]
pub enum GameError {
    /// An error to indicate that a question's title did not select any known
    /// game kind. Offers the lexicographically closest known kind, if any is
    /// reasonably similar.
    UnknownKind {
        title: String,
        suggestion: Option<&'static str>,
    },

    /// An error to indicate that a question carried a payload the selected
    /// game kind could not interpret. Includes a message on exactly what
    /// went wrong.
    PayloadMalformed { kind: &'static str, hint: String },
}

impl Error for GameError {}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnknownKind { title, suggestion } => {
                if let Some(close) = suggestion {
                    write!(
                        f,
                        "The title '{title}' does not select any known game \
                        kind. Did you mean '{close}'? Run 'gauntlet info' \
                        for the full list of offerings.",
                    )
                } else {
                    write!(
                        f,
                        "The title '{title}' does not select any known game \
                        kind. Run 'gauntlet info' for the full list of \
                        offerings.",
                    )
                }
            },
            Self::PayloadMalformed { kind, hint } => {
                write!(
                    f,
                    "{hint}\n\nMore information on the fields the game \
                    '{kind}' expects can be found in its problem generator's \
                    output schema.",
                )
            },
        }
    }
}
