//! # Color Magic Game Module
//!
//! A grid of R/B/Y cells is driven toward a single color through three
//! spells, presented to the solver under permuted labels: 1 casts beta,
//! 2 casts alpha, 3 casts gamma. A spell rotates the color of its center
//! cell (alpha and beta only) and of the four adjacent cells, following
//! rotation tables named by the question.

use anyhow::Result;
use serde_json::Value;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const MOVE: &str = r"My Move:\s*(\d+)\s+(\d+)";

/* DEFINITIONS */

struct Spell {
    center: Option<String>,
    adjacent: String,
}

/* GAME IMPLEMENTATION */

pub struct Session {
    size: usize,
    grid: Vec<Vec<char>>,
    alpha: Spell,
    beta: Spell,
    gamma: Spell,
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        let spec = question.field("graph")?;
        let size = spec
            .get("size")
            .and_then(Value::as_u64)
            .ok_or_else(|| malformed(question, "graph.size"))?
            as usize;

        let grid = spec
            .get("initial_state")
            .and_then(Value::as_array)
            .map(|rows| {
                rows.iter()
                    .map(|row| {
                        row.as_array()
                            .map(|cells| {
                                cells
                                    .iter()
                                    .filter_map(|c| c.as_str())
                                    .filter_map(|c| c.chars().next())
                                    .collect::<Vec<char>>()
                            })
                            .unwrap_or_default()
                    })
                    .collect::<Vec<_>>()
            })
            .ok_or_else(|| malformed(question, "graph.initial_state"))?;

        let operations = spec
            .get("operations")
            .and_then(Value::as_object)
            .ok_or_else(|| malformed(question, "graph.operations"))?;
        let spell = |name: &str| -> Result<Spell> {
            let op = operations
                .get(name)
                .and_then(Value::as_object)
                .ok_or_else(|| malformed(question, name))?;
            Ok(Spell {
                center: op
                    .get("center")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
                adjacent: op
                    .get("adjacent")
                    .and_then(Value::as_str)
                    .map(str::to_owned)
                    .ok_or_else(|| malformed(question, name))?,
            })
        };

        Ok(Self {
            size,
            grid,
            alpha: spell("alpha")?,
            beta: spell("beta")?,
            gamma: spell("gamma")?,
        })
    }

    fn rotate(color: char, table: &str) -> char {
        match (table, color) {
            ("RBY" | "swap", 'R') => 'B',
            ("RBY" | "swap", 'B') => 'Y',
            ("RBY" | "swap", 'Y') => 'R',
            ("BYR", 'B') => 'Y',
            ("BYR", 'Y') => 'R',
            ("BYR", 'R') => 'B',
            ("RYB", 'R') => 'Y',
            ("RYB", 'Y') => 'B',
            ("RYB", 'B') => 'R',
            ("BRY", 'B') => 'R',
            ("BRY", 'R') => 'Y',
            ("BRY", 'Y') => 'B',
            _ => color,
        }
    }

    fn cast(&mut self, label: i64, position: i64) {
        let (spell, rotates_center) = match label {
            1 => (&self.beta, true),
            2 => (&self.alpha, true),
            _ => (&self.gamma, false),
        };

        let row = (position as usize - 1) / self.size;
        let col = (position as usize - 1) % self.size;
        if rotates_center {
            if let Some(table) = &spell.center {
                self.grid[row][col] = Self::rotate(self.grid[row][col], table);
            }
        }

        let adjacent = spell.adjacent.clone();
        let deltas = [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)];
        for (dr, dc) in deltas {
            let (r, c) = (row as i64 + dr, col as i64 + dc);
            if r < 0 || c < 0 {
                continue;
            }
            let (r, c) = (r as usize, c as usize);
            if r < self.size && c < self.size {
                self.grid[r][c] = Self::rotate(self.grid[r][c], &adjacent);
            }
        }
    }

    fn monochrome(&self) -> bool {
        ['R', 'Y', 'B'].iter().any(|&color| {
            self.grid
                .iter()
                .all(|row| row.iter().all(|&cell| cell == color))
        })
    }

    fn render(&self) -> String {
        self.grid
            .iter()
            .map(|row| {
                row.iter()
                    .map(char::to_string)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn malformed(question: &Question, field: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "Question {} is malformed: bad '{field}'.",
        question.question_id,
    )
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        let Some(caps) = util::last_match(MOVE, text) else {
            return Exchange::invalid(
                "Invalid format. Use 'My Move: OPERATION POSITION'",
            );
        };
        let (Some(label), Some(position)) =
            (util::group_i64(&caps, 1), util::group_i64(&caps, 2))
        else {
            return Exchange::invalid("Invalid operation or position");
        };
        let cells = (self.size * self.size) as i64;
        if !(1..=3).contains(&label) || position < 1 || position > cells {
            return Exchange::invalid("Invalid operation or position");
        }

        self.cast(label, position);
        let result = format!("My Move: {label} {position}");
        if self.monochrome() {
            return Exchange::win(result, format!("Win\n{}", self.render()));
        }
        Exchange::next(result, self.render())
    }

    fn is_complete(&self, _result: &str) -> bool {
        self.monochrome()
    }
}

/* EVALUATION */

pub struct Evaluator;

impl Evaluate for Evaluator {
    fn evaluate_game(&self, _: &Question, turns: &[Turn]) -> (bool, String) {
        if turns.is_empty() {
            return (false, "No turns played".into());
        }

        let moves = turns
            .iter()
            .filter(|turn| turn.result.contains("Move:"))
            .count();
        let winning = turns
            .iter()
            .find(|turn| turn.feedback.to_lowercase().contains("win"));

        let closing = winning.unwrap_or_else(|| turns.last().unwrap());
        let state: Vec<&str> =
            closing.feedback.lines().rev().take(3).collect();
        let state: Vec<&str> = state.into_iter().rev().collect();
        let detail = format!(
            "Moves used: {moves}, Final state:\n{}",
            state.join("\n"),
        );
        (winning.is_some(), detail)
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;
    use crate::game::Outcome;

    fn session(initial: &str) -> Session {
        let question: Question = serde_json::from_str(&format!(
            r#"{{"question_id": 23, "title": "ColorMagic",
                "graph": {{
                    "size": 2,
                    "initial_state": {initial},
                    "operations": {{
                        "alpha": {{"center": "RBY", "adjacent": "RYB"}},
                        "beta": {{"center": "BYR", "adjacent": "swap"}},
                        "gamma": {{"adjacent": "RBY"}}
                    }}
                }}}}"#,
        ))
        .unwrap();
        Session::new(&question).unwrap()
    }

    #[test]
    fn alpha_rotates_center_and_neighbors() {
        let mut s = session(r#"[["R", "R"], ["R", "R"]]"#);
        // Label 2 casts alpha at cell 1: center R->B, neighbors R->Y.
        let x = s.parse_response("My Move: 2 1");
        assert_eq!(x.outcome, Outcome::Continue);
        assert_eq!(s.grid, vec![vec!['B', 'Y'], vec!['Y', 'R']]);
        assert_eq!(x.feedback, "B Y\nY R");
    }

    #[test]
    fn gamma_leaves_the_center_alone() {
        let mut s = session(r#"[["R", "R"], ["R", "R"]]"#);
        let x = s.parse_response("My Move: 3 1");
        assert_eq!(x.outcome, Outcome::Continue);
        assert_eq!(s.grid, vec![vec!['R', 'B'], vec!['B', 'R']]);
    }

    #[test]
    fn monochrome_grid_wins() {
        let mut s = session(r#"[["R", "B"], ["B", "Y"]]"#);
        // Label 2 at cell 4: center Y->R, neighbors (cells 2, 3) B->R.
        let x = s.parse_response("My Move: 2 4");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(x.feedback.starts_with("Win\n"));
        assert!(s.is_complete(""));
    }

    #[test]
    fn bad_label_or_position_retires() {
        let mut s = session(r#"[["R", "R"], ["R", "R"]]"#);
        let x = s.parse_response("My Move: 4 1");
        assert_eq!(x.outcome, Outcome::Invalid);

        let mut s = session(r#"[["R", "R"], ["R", "R"]]"#);
        let x = s.parse_response("My Move: 1 5");
        assert_eq!(x.outcome, Outcome::Invalid);
    }
}
