//! # Grid Sum Game Module
//!
//! Two players alternately claim grid cells, each claim (after the first)
//! adjacent to some previously claimed cell. When the grid is half
//! exhausted the sums of claimed values are compared; the solver moves
//! first and keeps the tie.

use anyhow::Result;
use rand::seq::IndexedRandom;
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

const CHOICE: &str = r"My Choice:\s*(\d+)\s+(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    rows: i64,
    cols: i64,
    grid: HashMap<(i64, i64), i64>,
    selected: HashSet<(i64, i64)>,
    solver_sum: i64,
    opponent_sum: i64,
    round: u64,
    total_rounds: u64,
    rng: Rng,
}

impl Session {
    pub fn new(question: &Question, rng: Rng) -> Result<Self> {
        let (rows, cols) = question.scale_pair()?;
        let mut grid = HashMap::new();
        if let Some(cells) = question
            .payload
            .get("initial_grid")
            .and_then(Value::as_object)
        {
            for (key, value) in cells {
                let coordinates: Vec<i64> = util::grammar(r"-?\d+")
                    .find_iter(key)
                    .filter_map(|m| m.as_str().parse().ok())
                    .collect();
                if let ([x, y], Some(v)) =
                    (coordinates.as_slice(), value.as_i64())
                {
                    grid.insert((*x, *y), v);
                }
            }
        }

        Ok(Self {
            rows: rows as i64,
            cols: cols as i64,
            grid,
            selected: HashSet::new(),
            solver_sum: 0,
            opponent_sum: 0,
            round: 0,
            total_rounds: rows * cols / 2,
            rng,
        })
    }

    fn adjacent_to_selection(&self, cell: (i64, i64)) -> bool {
        [(0, 1), (0, -1), (1, 0), (-1, 0)]
            .iter()
            .any(|(dx, dy)| {
                self.selected.contains(&(cell.0 + dx, cell.1 + dy))
            })
    }

    fn value(&self, cell: (i64, i64)) -> i64 {
        self.grid.get(&cell).copied().unwrap_or(0)
    }

    fn open_cells(&self) -> Vec<(i64, i64)> {
        (1..=self.rows)
            .flat_map(|x| (1..=self.cols).map(move |y| (x, y)))
            .filter(|cell| !self.selected.contains(cell))
            .filter(|cell| {
                self.selected.is_empty() || self.adjacent_to_selection(*cell)
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
        let cell = (x, y);

        let in_bounds =
            1 <= x && x <= self.rows && 1 <= y && y <= self.cols;
        if !in_bounds || self.selected.contains(&cell) {
            return Exchange::invalid("Invalid cell choice");
        }
        if !self.selected.is_empty() && !self.adjacent_to_selection(cell) {
            return Exchange::invalid(
                "Cell must be adjacent to a previous selection",
            );
        }

        self.selected.insert(cell);
        self.solver_sum += self.value(cell);
        let result = format!("My Choice: {x} {y}");

        let open = self.open_cells();
        let Some(&reply) = open.choose(&mut self.rng) else {
            return Exchange::win(result, "I have no valid moves. You win!");
        };
        self.selected.insert(reply);
        self.opponent_sum += self.value(reply);
        self.round += 1;

        let reply_text = format!("My Choice: {} {}", reply.0, reply.1);
        if self.round == self.total_rounds {
            return if self.solver_sum < self.opponent_sum {
                Exchange::lose(
                    result,
                    format!(
                        "{reply_text}\nYou lose! Your sum ({}) < My sum \
                        ({})",
                        self.solver_sum, self.opponent_sum,
                    ),
                )
            } else {
                Exchange::win(
                    result,
                    format!(
                        "{reply_text}\nYou win! Your sum ({}) >= My sum \
                        ({})",
                        self.solver_sum, self.opponent_sum,
                    ),
                )
            };
        }

        Exchange::next(result, reply_text)
    }

    fn is_complete(&self, _result: &str) -> bool {
        self.round >= self.total_rounds
    }
}

/* EVALUATION */

pub struct Evaluator;

impl Evaluate for Evaluator {
    fn evaluate_game(
        &self,
        question: &Question,
        turns: &[Turn],
    ) -> (bool, String) {
        if turns.is_empty() {
            return (false, "No turns played".into());
        }

        let Ok((rows, cols)) = question.scale_pair() else {
            return (false, "Question has no grid shape".into());
        };
        let (rows, cols) = (rows as i64, cols as i64);
        let mut grid = HashMap::new();
        if let Some(cells) = question
            .payload
            .get("initial_grid")
            .and_then(Value::as_object)
        {
            for (key, value) in cells {
                let coordinates: Vec<i64> = util::grammar(r"-?\d+")
                    .find_iter(key)
                    .filter_map(|m| m.as_str().parse().ok())
                    .collect();
                if let ([x, y], Some(v)) =
                    (coordinates.as_slice(), value.as_i64())
                {
                    grid.insert((*x, *y), v);
                }
            }
        }

        let adjacent = |selected: &HashSet<(i64, i64)>, cell: (i64, i64)| {
            [(0, 1), (0, -1), (1, 0), (-1, 0)]
                .iter()
                .any(|(dx, dy)| selected.contains(&(cell.0 + dx, cell.1 + dy)))
        };

        let mut selected: HashSet<(i64, i64)> = HashSet::new();
        let mut solver_sum = 0;
        let mut opponent_sum = 0;
        let mut moves = Vec::new();
        for (i, turn) in turns.iter().enumerate() {
            let round = i + 1;
            let Some(cell) = turn
                .result
                .strip_prefix("My Choice: ")
                .and_then(util::ints)
                .and_then(|xy| match xy.as_slice() {
                    [x, y] => Some((*x, *y)),
                    _ => None,
                })
            else {
                return (
                    false,
                    format!(
                        "Lost: Invalid format at turn {round}\n{}",
                        moves.join("\n"),
                    ),
                );
            };

            if cell.0 < 1 || cell.0 > rows || cell.1 < 1 || cell.1 > cols {
                return (
                    false,
                    format!(
                        "Lost: Position out of bounds at turn {round}\n{}",
                        moves.join("\n"),
                    ),
                );
            }
            if selected.contains(&cell) {
                return (
                    false,
                    format!(
                        "Lost: Cell already selected at turn {round}\n{}",
                        moves.join("\n"),
                    ),
                );
            }
            if !selected.is_empty() && !adjacent(&selected, cell) {
                return (
                    false,
                    format!(
                        "Lost: Cell must be adjacent to previous selection \
                        at turn {round}\n{}",
                        moves.join("\n"),
                    ),
                );
            }

            selected.insert(cell);
            let value = grid.get(&cell).copied().unwrap_or(0);
            solver_sum += value;
            moves.push(format!(
                "Turn {round} - Solver chooses ({},{}), value: {value}",
                cell.0, cell.1,
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
            if let Some(reply) = util::last_match(CHOICE, &turn.feedback) {
                let (Some(x), Some(y)) =
                    (util::group_i64(&reply, 1), util::group_i64(&reply, 2))
                else {
                    continue;
                };
                selected.insert((x, y));
                let value = grid.get(&(x, y)).copied().unwrap_or(0);
                opponent_sum += value;
                moves.push(format!(
                    "Turn {round} - Opponent chooses ({x},{y}), value: \
                    {value}",
                ));
            }
        }

        if solver_sum < opponent_sum {
            (
                true,
                format!(
                    "Won! Solver sum ({solver_sum}) < Opponent sum \
                    ({opponent_sum})\n{}",
                    moves.join("\n"),
                ),
            )
        } else {
            (
                false,
                format!(
                    "Lost! Solver sum ({solver_sum}) >= Opponent sum \
                    ({opponent_sum})\n{}",
                    moves.join("\n"),
                ),
            )
        }
    }
}

/* TESTS */
