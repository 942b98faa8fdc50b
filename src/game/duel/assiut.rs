//! # Queen Hunt Game Module
//!
//! The solver plays a queen against a hidden king. The first move places
//! the queen; every later move slides it along a rank, file, or diagonal.
//! The king steps to any safe adjacent square and reports only the compass
//! word of its step; when it is caught or has no safe square, the handler
//! reports `Done` and the hunt is won.

use anyhow::Result;
use rand::seq::IndexedRandom;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Rng;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const CHOICE: &str = r"My Choice:\s*(\d+)\s+(\d+)";

const STEPS: [(&str, (i64, i64)); 8] = [
    ("Right", (0, 1)),
    ("Left", (0, -1)),
    ("Up", (-1, 0)),
    ("Down", (1, 0)),
    ("Down-Right", (1, 1)),
    ("Down-Left", (1, -1)),
    ("Up-Left", (-1, -1)),
    ("Up-Right", (-1, 1)),
];

/* GAME IMPLEMENTATION */

pub struct Session {
    board: i64,
    king: (i64, i64),
    queen: Option<(i64, i64)>,
    rng: Rng,
}

impl Session {
    pub fn new(question: &Question, rng: Rng) -> Result<Self> {
        let position = question.str_field("initial_position")?;
        let coordinates: Vec<i64> = util::grammar(r"\d+")
            .find_iter(position)
            .filter_map(|m| m.as_str().parse().ok())
            .collect();
        let king = match coordinates.as_slice() {
            [x, y] => (*x, *y),
            _ => anyhow::bail!(
                "Question {} is malformed: bad 'initial_position'.",
                question.question_id,
            ),
        };

        Ok(Self {
            board: question.scale_u64()? as i64,
            king,
            queen: None,
            rng,
        })
    }

    fn on_board(&self, square: (i64, i64)) -> bool {
        1 <= square.0
            && square.0 <= self.board
            && 1 <= square.1
            && square.1 <= self.board
    }

    fn queen_attacks(&self, square: (i64, i64)) -> bool {
        let Some(queen) = self.queen else {
            return false;
        };
        if square == queen {
            return true;
        }
        let (dx, dy) = (square.0 - queen.0, square.1 - queen.1);
        dx == 0 || dy == 0 || dx.abs() == dy.abs()
    }

    fn king_escapes(&self) -> Vec<(&'static str, (i64, i64))> {
        STEPS
            .iter()
            .map(|&(word, (dx, dy))| {
                (word, (self.king.0 + dx, self.king.1 + dy))
            })
            .filter(|&(_, square)| {
                self.on_board(square) && !self.queen_attacks(square)
            })
            .collect()
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        let Some(caps) = util::last_match(CHOICE, text) else {
            return Exchange::invalid("Invalid format. Use 'My Choice: x y'");
        };
        let (Some(x), Some(y)) =
            (util::group_i64(&caps, 1), util::group_i64(&caps, 2))
        else {
            return Exchange::invalid("Invalid number format");
        };
        let destination = (x, y);

        match self.queen {
            None => {
                if !self.on_board(destination) || destination == self.king {
                    return Exchange::invalid("Invalid initial position");
                }
                self.queen = Some(destination);
            },
            Some(queen) => {
                let (dx, dy) =
                    (destination.0 - queen.0, destination.1 - queen.1);
                let straight = dx == 0 || dy == 0 || dx.abs() == dy.abs();
                if !self.on_board(destination)
                    || destination == queen
                    || !straight
                {
                    return Exchange::invalid("Invalid queen move");
                }
                self.queen = Some(destination);
            },
        }

        let result = format!("My Choice: {x} {y}");
        if self.queen == Some(self.king) {
            return Exchange::win(result, "Done");
        }

        let escapes = self.king_escapes();
        let Some(&(word, square)) = escapes.choose(&mut self.rng) else {
            return Exchange::win(result, "Done");
        };
        self.king = square;
        Exchange::next(result, word)
    }

    fn is_complete(&self, _result: &str) -> bool {
        self.queen == Some(self.king) || self.king_escapes().is_empty()
    }
}

/* EVALUATION */

pub struct Evaluator;

impl Evaluate for Evaluator {
    fn evaluate_game(&self, _: &Question, turns: &[Turn]) -> (bool, String) {
        if turns.is_empty() {
            return (false, "No turns played".into());
        }

        let mut moves = Vec::new();
        for (i, turn) in turns.iter().enumerate() {
            let round = i + 1;
            let Some(square) =
                turn.result.strip_prefix("My Choice: ")
            else {
                return (
                    false,
                    format!(
                        "Lost: Invalid format at turn {round}\n{}",
                        moves.join("\n"),
                    ),
                );
            };
            moves.push(format!(
                "Turn {round} - Queen moved to: ({})",
                square.replace(' ', ","),
            ));

            if turn.feedback.contains("Invalid") {
                return (
                    false,
                    format!(
                        "Lost: Invalid move at turn {round}\n{}",
                        moves.join("\n"),
                    ),
                );
            }
            if turn.feedback == "Done" {
                return (true, format!("Win!\n{}", moves.join("\n")));
            }
            moves.push(format!(
                "Turn {round} - King moved: {}",
                turn.feedback,
            ));
        }

        (false, format!("Game incomplete\n{}", moves.join("\n")))
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;
    use crate::game::Outcome;

    fn session() -> Session {
        let question: Question = serde_json::from_str(
            r#"{"question_id": 33, "title": "AssiutChess", "scale": 8,
                "initial_position": "(4, 4)"}"#,
        )
        .unwrap();
        Session::new(&question, util::session_rng(33)).unwrap()
    }

    #[test]
    fn first_move_places_the_queen_anywhere_free() {
        let mut s = session();
        let x = s.parse_response("My Choice: 1 1");
        assert_eq!(x.outcome, Outcome::Continue);
        assert_eq!(s.queen, Some((1, 1)));
        assert!(STEPS.iter().any(|(word, _)| *word == x.feedback));
    }

    #[test]
    fn placing_on_the_king_is_rejected() {
        let mut s = session();
        let x = s.parse_response("My Choice: 4 4");
        assert_eq!(x.outcome, Outcome::Invalid);
    }

    #[test]
    fn queen_moves_slide_along_lines_only() {
        let mut s = session();
        s.parse_response("My Choice: 1 1");
        let x = s.parse_response("My Choice: 2 3");
        assert_eq!(x.feedback, "Invalid queen move");
        assert_eq!(x.outcome, Outcome::Invalid);
    }

    #[test]
    fn the_king_never_steps_into_check() {
        let mut s = session();
        s.parse_response("My Choice: 1 1");
        for slide in ["My Choice: 1 2", "My Choice: 1 1"] {
            s.parse_response(slide);
            assert!(!s.queen_attacks(s.king));
        }
    }

    #[test]
    fn a_cornered_king_reports_done() {
        let mut s = session();
        s.king = (1, 8);
        s.queen = Some((3, 7));
        // After sliding to (2,7) the queen covers (1,7), (2,8), and her
        // own square: every square adjacent to the cornered king.
        let x = s.parse_response("My Choice: 2 7");
        assert_eq!(x.feedback, "Done");
        assert_eq!(x.outcome, Outcome::Win);
    }
}
