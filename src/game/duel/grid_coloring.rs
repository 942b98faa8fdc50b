//! # Grid Coloring Game Module
//!
//! The solver picks uncolored cells and an adversary assigns each a random
//! color. The solver wins by naming an axis-aligned rectangle whose four
//! corners are colored with four distinct colors; ten placements without a
//! rectangle end the game.

use anyhow::Result;
use rand::Rng as _;
use serde_json::Value;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Rng;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

use std::collections::HashMap;
use std::collections::HashSet;

/* GRAMMAR */

const ANSWER: &str = r"My Answer:\s*(\d+)\s+(\d+)\s+(\d+)\s+(\d+)";
const CHOICE: &str = r"My Choice:\s*(\d+)\s+(\d+)";

const MAX_PLACEMENTS: u32 = 10;

/* GAME IMPLEMENTATION */

pub struct Session {
    size: i64,
    colors: HashMap<(i64, i64), i64>,
    max_color: i64,
    placements: u32,
    rng: Rng,
}

impl Session {
    pub fn new(question: &Question, rng: Rng) -> Result<Self> {
        let size = question.scale_u64()? as i64;
        let mut colors = HashMap::new();
        if let Some(cells) = question
            .payload
            .get("colored_cells")
            .and_then(Value::as_object)
        {
            for (key, color) in cells {
                let coordinates: Vec<i64> = util::grammar(r"-?\d+")
                    .find_iter(key)
                    .filter_map(|m| m.as_str().parse().ok())
                    .collect();
                if let ([x, y], Some(c)) =
                    (coordinates.as_slice(), color.as_i64())
                {
                    colors.insert((*x, *y), c);
                }
            }
        }

        Ok(Self {
            size,
            colors,
            max_color: size * 2,
            placements: 0,
            rng,
        })
    }

    fn rectangle(&mut self, corners: [i64; 4]) -> Exchange {
        let [x1, x2, y1, y2] = corners;
        if corners.iter().any(|&c| c < 1 || c > self.size) {
            return Exchange::invalid("Coordinates out of bounds");
        }

        let squares =
            [(x1, y1), (x1, y2), (x2, y1), (x2, y2)];
        let Some(colors) = squares
            .iter()
            .map(|square| self.colors.get(square).copied())
            .collect::<Option<Vec<i64>>>()
        else {
            return Exchange::invalid("Not all cells are colored");
        };

        let distinct: HashSet<i64> = colors.into_iter().collect();
        if distinct.len() != 4 {
            return Exchange::invalid("Colors must be different");
        }
        if x1 == x2 || y1 == y2 {
            return Exchange::invalid("Not a valid rectangle");
        }

        Exchange::win(format!("My Answer:{x1} {x2} {y1} {y2}"), "Win")
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if let Some(caps) = util::last_match(ANSWER, text) {
            let corners: Vec<i64> = (1..=4)
                .filter_map(|i| util::group_i64(&caps, i))
                .collect();
            if let [x1, x2, y1, y2] = corners.as_slice() {
                return self.rectangle([*x1, *x2, *y1, *y2]);
            }
            return Exchange::invalid("Invalid number format");
        }

        let Some(caps) = util::last_match(CHOICE, text) else {
            return Exchange::invalid(
                "Invalid format. Use 'My Choice: x y' or \
                'My Answer: x1 x2 y1 y2'",
            );
        };
        let (Some(x), Some(y)) =
            (util::group_i64(&caps, 1), util::group_i64(&caps, 2))
        else {
            return Exchange::invalid("Invalid number format");
        };
        if x < 1
            || x > self.size
            || y < 1
            || y > self.size
            || self.colors.contains_key(&(x, y))
        {
            return Exchange::invalid(
                "Invalid move: Cell already colored or out of bounds",
            );
        }

        let color = self.rng.random_range(1..=self.max_color);
        self.colors.insert((x, y), color);
        self.placements += 1;

        let result = format!("My Choice: {x} {y}");
        if self.placements >= MAX_PLACEMENTS {
            return Exchange::retire(result, "Maximum moves reached");
        }
        Exchange::next(
            result,
            format!("Cell ({x},{y}) colored with color {color}"),
        )
    }

    fn is_complete(&self, result: &str) -> bool {
        result.starts_with("My Answer:")
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
            if turn.result.starts_with("My Choice:") {
                if turn.feedback.contains("Invalid") {
                    return (
                        false,
                        format!(
                            "Lost: Invalid move at turn {round}\n{}",
                            moves.join("\n"),
                        ),
                    );
                }
                moves.push(format!("Turn {round} - {}", turn.feedback));
                continue;
            }

            if turn.result.starts_with("My Answer:") {
                moves.push(format!(
                    "Turn {round} - Final Answer: {}",
                    turn.result.trim_start_matches("My Answer:"),
                ));
                if turn.feedback == "Win" {
                    return (true, format!("Win!\n{}", moves.join("\n")));
                }
                return (
                    false,
                    format!(
                        "Lost: Invalid rectangle\n{}",
                        moves.join("\n"),
                    ),
                );
            }
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
            r#"{"question_id": 35, "title": "GridColoring", "scale": 4,
                "colored_cells": {
                    "(1, 1)": 1, "(1, 3)": 2, "(3, 1)": 3, "(3, 3)": 4
                }}"#,
        )
        .unwrap();
        Session::new(&question, util::session_rng(35)).unwrap()
    }

    #[test]
    fn placements_draw_random_colors() {
        let mut s = session();
        let x = s.parse_response("My Choice: 2 2");
        assert_eq!(x.outcome, Outcome::Continue);
        let color = s.colors[&(2, 2)];
        assert!((1..=8).contains(&color));
        assert!(x.feedback.contains("(2,2)"));
    }

    #[test]
    fn recoloring_a_cell_is_rejected() {
        let mut s = session();
        let x = s.parse_response("My Choice: 1 1");
        assert_eq!(x.outcome, Outcome::Invalid);
    }

    #[test]
    fn four_distinct_corners_win() {
        let mut s = session();
        let x = s.parse_response("My Answer: 1 3 1 3");
        assert_eq!(x.feedback, "Win");
        assert_eq!(x.outcome, Outcome::Win);
    }

    #[test]
    fn degenerate_rectangles_are_rejected() {
        let mut s = session();
        let x = s.parse_response("My Answer: 1 1 1 3");
        assert_eq!(x.outcome, Outcome::Invalid);
    }

    #[test]
    fn uncolored_corners_are_rejected() {
        let mut s = session();
        let x = s.parse_response("My Answer: 1 4 1 3");
        assert_eq!(x.feedback, "Not all cells are colored");
        assert_eq!(x.outcome, Outcome::Invalid);
    }

    #[test]
    fn the_placement_budget_retires_the_session() {
        let mut s = session();
        s.placements = 9;
        let x = s.parse_response("My Choice: 2 2");
        assert_eq!(x.feedback, "Maximum moves reached");
        assert_eq!(x.outcome, Outcome::Retire);
    }
}
