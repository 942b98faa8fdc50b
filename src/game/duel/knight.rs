//! # Knight Battle Game Module
//!
//! White (the solver) and black race knights across a shared board. A side
//! wins by capturing the other knight or by sitting on its own target
//! square while not under attack. Black replies with a uniformly random
//! legal knight move.

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

const MOVE: &str = r"My Move:\s*(\d+)\s+(\d+)";

const JUMPS: [(i64, i64); 8] = [
    (1, 2),
    (1, -2),
    (-1, 2),
    (-1, -2),
    (2, 1),
    (2, -1),
    (-2, 1),
    (-2, -1),
];

/* GAME IMPLEMENTATION */

pub struct Session {
    board: i64,
    white: (i64, i64),
    black: (i64, i64),
    white_target: (i64, i64),
    black_target: (i64, i64),
    rng: Rng,
}

impl Session {
    pub fn new(question: &Question, rng: Rng) -> Result<Self> {
        let setup = question.field("answer")?;
        let point = |name: &str| -> Result<(i64, i64)> {
            setup
                .get(name)
                .and_then(|v| v.as_array())
                .and_then(|pair| match pair.as_slice() {
                    [x, y] => Some((x.as_i64()?, y.as_i64()?)),
                    _ => None,
                })
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "Question {} is malformed: bad '{name}' point.",
                        question.question_id,
                    )
                })
        };

        Ok(Self {
            board: question.scale_u64()? as i64,
            white: point("white_start")?,
            black: point("black_start")?,
            white_target: point("white_target")?,
            black_target: point("black_target")?,
            rng,
        })
    }

    fn on_board(&self, square: (i64, i64)) -> bool {
        1 <= square.0
            && square.0 <= self.board
            && 1 <= square.1
            && square.1 <= self.board
    }

    fn legal_jump(&self, from: (i64, i64), to: (i64, i64)) -> bool {
        let (dx, dy) = ((to.0 - from.0).abs(), (to.1 - from.1).abs());
        self.on_board(to) && ((dx == 1 && dy == 2) || (dx == 2 && dy == 1))
    }

    fn jumps_from(&self, from: (i64, i64)) -> Vec<(i64, i64)> {
        JUMPS
            .iter()
            .map(|(dx, dy)| (from.0 + dx, from.1 + dy))
            .filter(|&to| self.on_board(to))
            .collect()
    }

    fn under_attack(&self, square: (i64, i64), attacker: (i64, i64)) -> bool {
        self.jumps_from(attacker).contains(&square)
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        let Some(caps) = util::last_match(MOVE, text) else {
            return Exchange::invalid("Invalid format. Use 'My Move: x y'");
        };
        let (Some(x), Some(y)) =
            (util::group_i64(&caps, 1), util::group_i64(&caps, 2))
        else {
            return Exchange::invalid("Invalid number format");
        };

        if !self.legal_jump(self.white, (x, y)) {
            return Exchange::invalid("Invalid knight move");
        }
        self.white = (x, y);
        let result = format!("Move: {x},{y}");

        let white_wins = self.white == self.black
            || (self.white == self.white_target
                && !self.under_attack(self.white, self.black));
        if white_wins {
            return Exchange::win(result, "White wins!");
        }

        let replies = self.jumps_from(self.black);
        let Some(&reply) = replies.choose(&mut self.rng) else {
            return Exchange::retire(result, "Black has no valid moves");
        };
        self.black = reply;

        let black_wins = self.black == self.white
            || (self.black == self.black_target
                && !self.under_attack(self.black, self.white));
        if black_wins {
            return Exchange::lose(
                result,
                format!("Black wins with {},{}", reply.0, reply.1),
            );
        }

        Exchange::next(result, format!("{} {}", reply.0, reply.1))
    }

    fn is_complete(&self, _result: &str) -> bool {
        self.white == self.black
            || (self.white == self.white_target
                && !self.under_attack(self.white, self.black))
    }
}

/* EVALUATION */

pub struct Evaluator;

impl Evaluator {
    fn legal(
        board: i64,
        from: (i64, i64),
        to: (i64, i64),
    ) -> bool {
        let (dx, dy) = ((to.0 - from.0).abs(), (to.1 - from.1).abs());
        let on_board =
            1 <= to.0 && to.0 <= board && 1 <= to.1 && to.1 <= board;
        on_board && ((dx == 1 && dy == 2) || (dx == 2 && dy == 1))
    }

    fn attacks(from: (i64, i64), square: (i64, i64)) -> bool {
        let (dx, dy) = ((square.0 - from.0).abs(), (square.1 - from.1).abs());
        (dx == 1 && dy == 2) || (dx == 2 && dy == 1)
    }
}

impl Evaluate for Evaluator {
    fn evaluate_game(
        &self,
        question: &Question,
        turns: &[Turn],
    ) -> (bool, String) {
        if turns.is_empty() {
            return (false, "No turns played".into());
        }

        let Ok(board) = question.scale_u64().map(|s| s as i64) else {
            return (false, "Question has no board size".into());
        };
        let setup = question.field("answer").ok();
        let point = |name: &str| -> Option<(i64, i64)> {
            setup?
                .get(name)?
                .as_array()
                .and_then(|pair| match pair.as_slice() {
                    [x, y] => Some((x.as_i64()?, y.as_i64()?)),
                    _ => None,
                })
        };
        let (Some(mut white), Some(mut black)) =
            (point("white_start"), point("black_start"))
        else {
            return (false, "Question has no starting squares".into());
        };
        let (Some(white_target), Some(black_target)) =
            (point("white_target"), point("black_target"))
        else {
            return (false, "Question has no target squares".into());
        };

        let mut moves = Vec::new();
        for (i, turn) in turns.iter().enumerate() {
            let round = i + 1;
            let Some(square) = turn
                .result
                .strip_prefix("Move: ")
                .and_then(util::csv_ints)
                .and_then(|xy| match xy.as_slice() {
                    [x, y] => Some((*x, *y)),
                    _ => None,
                })
            else {
                return (
                    false,
                    format!(
                        "Lost: Invalid move at turn {round}\n{}",
                        moves.join("\n"),
                    ),
                );
            };
            if !Self::legal(board, white, square) {
                return (
                    false,
                    format!(
                        "Lost: Invalid move at turn {round}\n{}",
                        moves.join("\n"),
                    ),
                );
            }

            white = square;
            moves.push(format!(
                "Turn {round} - White: ({},{})",
                square.0, square.1,
            ));

            if white == black
                || (white == white_target && !Self::attacks(black, white))
            {
                if round > 14 {
                    return (
                        false,
                        format!(
                            "Draw: Exceeded 15 turns\n{}",
                            moves.join("\n"),
                        ),
                    );
                }
                let detail = format!(
                    "Game Result:\nWon at turn {round}\nMove sequence:\n{}",
                    moves.join("\n"),
                );
                return (true, detail);
            }

            if turn.feedback != "White wins!" {
                if let Some(reply) =
                    util::ints(&turn.feedback).filter(|xy| xy.len() == 2)
                {
                    black = (reply[0], reply[1]);
                    moves.push(format!(
                        "Turn {round} - Black: ({},{})",
                        black.0, black.1,
                    ));
                    if black == white {
                        return (
                            false,
                            format!(
                                "Lost: Captured by Black Knight at turn \
                                {round}\n{}",
                                moves.join("\n"),
                            ),
                        );
                    }
                    if black == black_target
                        && !Self::attacks(white, black)
                    {
                        return (
                            false,
                            format!(
                                "Lost: Black Knight reached target safely \
                                at turn {round}\n{}",
                                moves.join("\n"),
                            ),
                        );
                    }
                }
            }
        }

        (false, format!("Game incomplete or lost\n{}", moves.join("\n")))
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;
    use crate::game::Outcome;

    fn session() -> Session {
        let question: Question = serde_json::from_str(
            r#"{"question_id": 32, "title": "KnightBattle", "scale": 8,
                "answer": {
                    "white_start": [1, 1], "black_start": [8, 8],
                    "white_target": [4, 4], "black_target": [5, 5]
                }}"#,
        )
        .unwrap();
        Session::new(&question, util::session_rng(32)).unwrap()
    }

    #[test]
    fn white_moves_must_be_l_shaped() {
        let mut s = session();
        let x = s.parse_response("My Move: 2 3");
        assert_eq!(x.outcome, Outcome::Continue);
        assert_eq!(s.white, (2, 3));

        let mut s = session();
        let x = s.parse_response("My Move: 2 2");
        assert_eq!(x.feedback, "Invalid knight move");
        assert_eq!(x.outcome, Outcome::Invalid);
    }

    #[test]
    fn black_replies_with_a_legal_jump() {
        let mut s = session();
        let before = s.black;
        let x = s.parse_response("My Move: 2 3");
        let reply = util::ints(&x.feedback).unwrap();
        let to = (reply[0], reply[1]);
        assert!(s.legal_jump(before, to));
        assert_eq!(s.black, to);
    }

    #[test]
    fn capturing_black_wins_immediately() {
        let mut s = session();
        s.black = (2, 3);
        let x = s.parse_response("My Move: 2 3");
        assert_eq!(x.feedback, "White wins!");
        assert_eq!(x.outcome, Outcome::Win);
    }

    #[test]
    fn reaching_the_target_wins_only_when_safe() {
        let mut s = session();
        s.white = (2, 3);
        let x = s.parse_response("My Move: 4 4");
        assert_eq!(x.feedback, "White wins!");
        assert_eq!(x.outcome, Outcome::Win);

        let mut s = session();
        s.white = (2, 3);
        s.black = (3, 2); // Attacks (4, 4).
        let x = s.parse_response("My Move: 4 4");
        assert_ne!(x.feedback, "White wins!");
    }

    #[test]
    fn evaluator_replays_the_recorded_moves() {
        let question: Question = serde_json::from_str(
            r#"{"question_id": 32, "title": "KnightBattle", "scale": 8,
                "answer": {
                    "white_start": [1, 1], "black_start": [8, 8],
                    "white_target": [2, 3], "black_target": [5, 5]
                }}"#,
        )
        .unwrap();
        let turn = Turn {
            round: 1,
            raw_output: String::new(),
            output: String::new(),
            result: "Move: 2,3".into(),
            feedback: "White wins!".into(),
        };
        let (ok, detail) = Evaluator.evaluate_game(&question, &[turn]);
        assert!(ok);
        assert!(detail.contains("Won at turn 1"));
    }
}
