//! # Safe Path Game Module
//!
//! A minefield walk: the solver steps to any of the eight adjacent cells,
//! learning how many traps surround each safe cell. Stepping on a trap
//! loses; reaching the far corner wins.

use anyhow::Result;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

use std::collections::HashSet;

/* GRAMMAR */

const CHOICE: &str = r"My Choice:\s*(\d+)\s+(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    size: i64,
    traps: HashSet<(i64, i64)>,
    position: (i64, i64),
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        Ok(Self {
            size: question.scale_u64()? as i64,
            traps: question
                .pair_list_field("traps")?
                .into_iter()
                .collect(),
            position: (1, 1),
        })
    }

    fn adjacent_traps(&self, x: i64, y: i64) -> usize {
        (-1..=1)
            .flat_map(|dx| (-1..=1).map(move |dy| (dx, dy)))
            .filter(|&(dx, dy)| (dx, dy) != (0, 0))
            .filter(|&(dx, dy)| self.traps.contains(&(x + dx, y + dy)))
            .count()
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        let Some(caps) = util::last_match(CHOICE, text) else {
            return Exchange::invalid("Invalid format. Use 'My Choice: X Y'");
        };
        let (Some(x), Some(y)) =
            (util::group_i64(&caps, 1), util::group_i64(&caps, 2))
        else {
            return Exchange::invalid("INVALID_MOVE");
        };

        let (dx, dy) =
            ((x - self.position.0).abs(), (y - self.position.1).abs());
        let in_bounds =
            1 <= x && x <= self.size && 1 <= y && y <= self.size;
        if !in_bounds || dx > 1 || dy > 1 || (dx == 0 && dy == 0) {
            return Exchange::invalid("INVALID_MOVE");
        }

        let result = format!("My Choice: {x} {y}");
        if self.traps.contains(&(x, y)) {
            return Exchange::lose(result, "Lose");
        }
        if (x, y) == (self.size, self.size) {
            return Exchange::win(result, "Win");
        }

        self.position = (x, y);
        Exchange::next(
            result,
            format!("DANGER_LEVEL {}", self.adjacent_traps(x, y)),
        )
    }

    fn is_complete(&self, _result: &str) -> bool {
        self.position == (self.size, self.size)
    }
}

/* EVALUATION */

pub struct Evaluator;

impl Evaluate for Evaluator {
    fn evaluate_game(&self, _: &Question, turns: &[Turn]) -> (bool, String) {
        let Some(last) = turns.last() else {
            return (false, "No turns played".into());
        };

        let valid = turns
            .iter()
            .filter(|turn| turn.feedback.contains("DANGER_LEVEL"))
            .count();
        let rejected = turns
            .iter()
            .filter(|turn| turn.feedback.contains("INVALID_MOVE"))
            .count();
        let position = turns
            .iter()
            .rev()
            .find_map(|turn| {
                let coordinates =
                    turn.result.strip_prefix("My Choice: ")?;
                let parts = util::ints(coordinates)?;
                match parts.as_slice() {
                    [x, y] => Some(format!("({x},{y})")),
                    _ => None,
                }
            })
            .unwrap_or_else(|| "unknown".into());

        let success = last.feedback.contains("Win");
        let detail = format!(
            "Total moves: {}, Valid moves: {valid}, Invalid moves: \
            {rejected}, Final position: {position}",
            turns.len(),
        );
        (success, detail)
    }
}

/* TESTS */
