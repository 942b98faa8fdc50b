//! # Swapped-Controls Maze Game Module
//!
//! The solver steers through a grid maze whose controls are sabotaged: at
//! least one of the L/R and U/D button pairs is secretly swapped (decided
//! once per session). Danger cells lose, the `F` cell wins, and moves off
//! the grid keep the walker in place.

use anyhow::Result;
use rand::Rng as _;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Rng;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const MOVE: &str = r"My Move:\s*([UDLR])";

/* GAME IMPLEMENTATION */

pub struct Session {
    rows: i64,
    cols: i64,
    grid: Vec<Vec<char>>,
    position: (i64, i64),
    lr_swapped: bool,
    ud_swapped: bool,
}

impl Session {
    pub fn new(question: &Question, mut rng: Rng) -> Result<Self> {
        let grid: Vec<Vec<char>> = question
            .field("grids")?
            .as_array()
            .map(|rows| {
                rows.iter()
                    .map(|row| match row {
                        serde_json::Value::String(line) => {
                            line.chars().collect()
                        },
                        serde_json::Value::Array(cells) => cells
                            .iter()
                            .filter_map(|c| c.as_str())
                            .filter_map(|c| c.chars().next())
                            .collect(),
                        _ => Vec::new(),
                    })
                    .collect()
            })
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Question {} is malformed: 'grids' is not a grid.",
                    question.question_id,
                )
            })?;
        let rows = grid.len() as i64;
        let cols = grid.first().map(Vec::len).unwrap_or(0) as i64;

        // At least one pair is always swapped; the other is a coin flip.
        let (lr_swapped, ud_swapped) = if rng.random_bool(0.5) {
            (true, rng.random_bool(0.5))
        } else {
            (rng.random_bool(0.5), true)
        };

        Ok(Self {
            rows,
            cols,
            grid,
            position: (1, 1),
            lr_swapped,
            ud_swapped,
        })
    }

    fn effective(&self, pressed: char) -> char {
        match pressed {
            'L' if self.lr_swapped => 'R',
            'R' if self.lr_swapped => 'L',
            'U' if self.ud_swapped => 'D',
            'D' if self.ud_swapped => 'U',
            other => other,
        }
    }

    fn cell(&self, x: i64, y: i64) -> char {
        self.grid
            .get(x as usize - 1)
            .and_then(|row| row.get(y as usize - 1))
            .copied()
            .unwrap_or('.')
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        let Some(caps) = util::last_match(MOVE, text) else {
            return Exchange::invalid(
                "Invalid format. Use 'My Move: X' where X is U, D, L, or R",
            );
        };
        let pressed = caps[1].chars().next().unwrap_or('U');
        let result = format!("My Move: {pressed}");

        let (dx, dy) = match self.effective(pressed) {
            'U' => (-1, 0),
            'D' => (1, 0),
            'L' => (0, -1),
            _ => (0, 1),
        };
        let (mut x, mut y) =
            (self.position.0 + dx, self.position.1 + dy);
        if x < 1 || x > self.rows || y < 1 || y > self.cols {
            (x, y) = self.position;
        }

        match self.cell(x, y) {
            '*' => Exchange::lose(result, "-1 -1 You lose!"),
            'F' => Exchange::win(result, format!("{x} {y} You win!")),
            _ => {
                self.position = (x, y);
                Exchange::next(result, format!("{x} {y}"))
            },
        }
    }

    fn is_complete(&self, _result: &str) -> bool {
        self.cell(self.position.0, self.position.1) == 'F'
    }
}

/* EVALUATION */

pub struct Evaluator;

impl Evaluate for Evaluator {
    fn evaluate_game(&self, _: &Question, turns: &[Turn]) -> (bool, String) {
        let Some(last) = turns.last() else {
            return (false, "No turns played".into());
        };
        if !last.result.contains("Move:") {
            return (false, "Game did not end with a move".into());
        }

        let hit_danger = turns
            .iter()
            .any(|turn| turn.feedback.starts_with("-1 -1"));
        let success = last.feedback.to_lowercase().contains("win");
        let detail = format!(
            "Moves made: {}, Hit danger: {}, Final position: {}",
            turns.len(),
            if hit_danger { "Yes" } else { "No" },
            last.feedback,
        );
        (success, detail)
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;
    use crate::game::Outcome;

    fn session() -> Session {
        let question: Question = serde_json::from_str(
            r#"{"question_id": 31, "title": "VladikMaze", "scale": 2,
                "grids": ["..", "*F"]}"#,
        )
        .unwrap();
        Session::new(&question, util::session_rng(31)).unwrap()
    }

    #[test]
    fn at_least_one_control_pair_is_swapped() {
        let s = session();
        assert!(s.lr_swapped || s.ud_swapped);
    }

    #[test]
    fn blocked_moves_stay_in_place() {
        let mut s = session();
        // Whichever way L/R maps from (1,1), one of the two keeps the
        // walker put against the left wall.
        let pressed = if s.lr_swapped { 'R' } else { 'L' };
        let x = s.parse_response(&format!("My Move: {pressed}"));
        assert_eq!(x.feedback, "1 1");
        assert_eq!(s.position, (1, 1));
    }

    #[test]
    fn danger_cells_lose_and_finish_cells_win() {
        let mut s = session();
        s.lr_swapped = false;
        s.ud_swapped = true;
        // Pressing U maps to D: from (1,1) onto the '*' at (2,1).
        let x = s.parse_response("My Move: U");
        assert_eq!(x.feedback, "-1 -1 You lose!");
        assert_eq!(x.outcome, Outcome::Lose);

        let mut s = session();
        s.lr_swapped = false;
        s.ud_swapped = true;
        s.position = (1, 2);
        // Pressing U maps to D: from (1,2) onto the 'F' at (2,2).
        let x = s.parse_response("My Move: U");
        assert_eq!(x.feedback, "2 2 You win!");
        assert_eq!(x.outcome, Outcome::Win);
    }

    #[test]
    fn grammar_miss_retires() {
        let mut s = session();
        let x = s.parse_response("go north");
        assert_eq!(x.outcome, Outcome::Invalid);
    }
}
