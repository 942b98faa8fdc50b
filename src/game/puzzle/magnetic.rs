//! # Magnetic Field Maze Game Module
//!
//! The solver walks a grid containing directional magnets, danger cells,
//! and a goal. Stepping onto a magnet cascades one cell per magnet along
//! each magnet's arrow, capped at twenty chained magnets; entering danger
//! during the walk or the cascade loses.

use anyhow::Result;
use serde_json::Value;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const MOVE: &str = r"My Move:\s*([UDLR])";

/// Hard cap on chained magnets, preventing non-termination on cyclic
/// layouts.
const MAX_CASCADE: u32 = 20;

/* GAME IMPLEMENTATION */

pub struct Session {
    size: i64,
    grid: Vec<Vec<char>>,
    position: (i64, i64),
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        let spec = question.field("graph")?;
        let size = spec
            .get("size")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Question {} is malformed: 'graph' has no size.",
                    question.question_id,
                )
            })?;
        let grid = spec
            .get("grid")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .map(|row| match row {
                        Value::String(line) => line.chars().collect(),
                        Value::Array(cells) => cells
                            .iter()
                            .filter_map(|c| c.as_str())
                            .filter_map(|c| c.chars().next())
                            .collect(),
                        _ => Vec::new(),
                    })
                    .collect::<Vec<Vec<char>>>()
            })
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Question {} is malformed: 'graph' has no grid.",
                    question.question_id,
                )
            })?;

        Ok(Self {
            size,
            grid,
            position: (1, 1),
        })
    }

    fn cell(&self, x: i64, y: i64) -> char {
        self.grid
            .get(x as usize - 1)
            .and_then(|row| row.get(y as usize - 1))
            .copied()
            .unwrap_or('.')
    }

    fn magnet_delta(cell: char) -> Option<(i64, i64)> {
        match cell {
            'N' => Some((-1, 0)),
            'S' => Some((1, 0)),
            'E' => Some((0, 1)),
            'W' => Some((0, -1)),
            _ => None,
        }
    }

    /// One step clamped to the grid; blocked moves stay in place.
    fn step(&self, x: i64, y: i64, dx: i64, dy: i64) -> (i64, i64) {
        let (nx, ny) = (x + dx, y + dy);
        if nx < 1 || nx > self.size || ny < 1 || ny > self.size {
            (x, y)
        } else {
            (nx, ny)
        }
    }

    /// Rides the magnet chain. Returns `None` on death: either a danger
    /// cell mid-cascade or a chain longer than the cap.
    fn cascade(&self, mut x: i64, mut y: i64) -> Option<(i64, i64)> {
        let mut chained = 0;
        while let Some((dx, dy)) = Self::magnet_delta(self.cell(x, y)) {
            chained += 1;
            if chained > MAX_CASCADE {
                return None;
            }

            let (nx, ny) = self.step(x, y, dx, dy);
            if self.cell(nx, ny) == 'X' {
                return None;
            }
            if Self::magnet_delta(self.cell(nx, ny)).is_none() {
                return Some((nx, ny));
            }
            (x, y) = (nx, ny);
        }
        Some((x, y))
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        let Some(caps) = util::last_match(MOVE, text) else {
            return Exchange::invalid(
                "Invalid format. Use 'My Move: X' where X is U, D, L, or R",
            );
        };
        let direction = caps[1].chars().next().unwrap_or('U');
        let result = format!("My Move: {direction}");

        let (dx, dy) = match direction {
            'U' => (-1, 0),
            'D' => (1, 0),
            'L' => (0, -1),
            _ => (0, 1),
        };
        let (x, y) = self.step(self.position.0, self.position.1, dx, dy);
        if self.cell(x, y) == 'X' {
            return Exchange::lose(result, "-1 -1 You lose!");
        }

        let landed = if Self::magnet_delta(self.cell(x, y)).is_some() {
            self.cascade(x, y)
        } else {
            Some((x, y))
        };
        let Some((x, y)) = landed else {
            return Exchange::lose(result, "-1 -1 You lose!");
        };

        self.position = (x, y);
        if self.cell(x, y) == 'G' {
            return Exchange::win(result, "WIN");
        }
        Exchange::next(result, format!("{x} {y}"))
    }

    fn is_complete(&self, _result: &str) -> bool {
        self.cell(self.position.0, self.position.1) == 'G'
    }
}

/* EVALUATION */

pub struct Evaluator;

impl Evaluate for Evaluator {
    fn evaluate_game(&self, _: &Question, turns: &[Turn]) -> (bool, String) {
        let Some(last) = turns.last() else {
            return (false, "No turns played".into());
        };

        let failed = turns
            .iter()
            .filter(|turn| turn.feedback.to_lowercase().contains("invalid"))
            .count();
        let success = last.feedback == "WIN";
        let detail = format!(
            "Total moves: {}, Valid moves: {}, Failed moves: {failed}",
            turns.len(),
            turns.len() - failed,
        );
        (success, detail)
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;
    use crate::game::Outcome;

    fn session(rows: &str) -> Session {
        let question: Question = serde_json::from_str(&format!(
            r#"{{"question_id": 26, "title": "MagneticField",
                "graph": {{"size": 4, "grid": {rows}}}}}"#,
        ))
        .unwrap();
        Session::new(&question).unwrap()
    }

    #[test]
    fn plain_moves_report_the_new_position() {
        let mut s = session(r#"["....", "....", "....", "...G"]"#);
        let x = s.parse_response("My Move: R");
        assert_eq!(x.feedback, "1 2");
        assert_eq!(x.outcome, Outcome::Continue);
    }

    #[test]
    fn magnets_cascade_until_a_plain_cell() {
        // Stepping right onto the E magnet pushes through the second magnet
        // onto the plain cell at column 4.
        let mut s = session(r#"[".EE.", "....", "....", "...G"]"#);
        let x = s.parse_response("My Move: R");
        assert_eq!(x.feedback, "1 4");
    }

    #[test]
    fn cascading_into_danger_loses() {
        let mut s = session(r#"[".EX.", "....", "....", "...G"]"#);
        let x = s.parse_response("My Move: R");
        assert_eq!(x.feedback, "-1 -1 You lose!");
        assert_eq!(x.outcome, Outcome::Lose);
    }

    #[test]
    fn opposing_magnets_trip_the_cascade_cap() {
        // E and W magnets bounce the walker forever; the cap turns that
        // into a loss.
        let mut s = session(r#"[".EW.", "....", "....", "...G"]"#);
        let x = s.parse_response("My Move: R");
        assert_eq!(x.feedback, "-1 -1 You lose!");
        assert_eq!(x.outcome, Outcome::Lose);
    }

    #[test]
    fn stepping_onto_the_goal_wins() {
        let mut s = session(r#"["....", "....", "....", "...G"]"#);
        s.position = (4, 3);
        let x = s.parse_response("My Move: R");
        assert_eq!(x.feedback, "WIN");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(s.is_complete(""));
    }

    #[test]
    fn walking_into_danger_loses() {
        let mut s = session(r#"[".X..", "....", "....", "...G"]"#);
        let x = s.parse_response("My Move: R");
        assert_eq!(x.outcome, Outcome::Lose);
    }
}
