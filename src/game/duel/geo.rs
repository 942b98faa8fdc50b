//! # Geometric Point Game Module
//!
//! Players alternately claim unused points from a fixed set, tracing a
//! path from a starting point. The handler only referees claims and
//! answers with its own random claim; the winner is decided post-hoc by
//! the parity of the summed squared distances along the traced path.

use anyhow::Result;
use rand::seq::IndexedRandom;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Outcome;
use crate::game::Rng;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

use std::collections::HashSet;

/* GRAMMAR */

const CHOICE: &str = r"My Choice:\s*(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    points: usize,
    used: HashSet<i64>,
    exchanges: u64,
    total_turns: u64,
    rng: Rng,
}

impl Session {
    pub fn new(question: &Question, rng: Rng) -> Result<Self> {
        let points = question.pair_list_field("available_points")?.len();
        Ok(Self {
            points,
            used: HashSet::new(),
            exchanges: 0,
            total_turns: question.turns.unwrap_or(0),
            rng,
        })
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        let Some(caps) = util::last_match(CHOICE, text) else {
            return Exchange::invalid("Invalid");
        };
        let Some(choice) = util::group_i64(&caps, 1) else {
            return Exchange::invalid("Invalid");
        };
        if choice < 1
            || choice > self.points as i64
            || self.used.contains(&choice)
        {
            return Exchange::invalid("Invalid");
        }

        self.used.insert(choice);
        let open: Vec<i64> = (1..=self.points as i64)
            .filter(|k| !self.used.contains(k))
            .collect();
        let result = format!("Choice: {choice}");
        let Some(&reply) = open.choose(&mut self.rng) else {
            return Exchange::retire(result, "No points remain");
        };
        self.used.insert(reply);
        self.exchanges += 1;

        let outcome = if self.exchanges >= self.total_turns {
            Outcome::Retire
        } else {
            Outcome::Continue
        };
        Exchange::new(result, format!("My Choice: {reply}"), outcome)
    }

    fn is_complete(&self, _result: &str) -> bool {
        self.exchanges >= self.total_turns
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

        let Ok(start) = question.int_list_field("starting_point") else {
            return (false, "Question has no starting point".into());
        };
        let Ok(points) = question.pair_list_field("available_points") else {
            return (false, "Question has no available points".into());
        };
        let [sx, sy] = start.as_slice() else {
            return (false, "Malformed starting point".into());
        };

        let mut path: Vec<(i64, i64)> = vec![(*sx, *sy)];
        let mut completed = 0;
        for turn in turns {
            let Some(choice) = turn
                .result
                .strip_prefix("Choice: ")
                .and_then(|c| c.parse::<usize>().ok())
                .filter(|&c| c >= 1)
                .and_then(|c| points.get(c - 1))
            else {
                return (
                    false,
                    format!("Invalid format after {completed} valid turns"),
                );
            };
            path.push(*choice);
            completed += 1;

            if let Some(caps) = util::last_match(CHOICE, &turn.feedback) {
                if let Some(reply) = util::group_i64(&caps, 1)
                    .filter(|&c| c >= 1)
                    .and_then(|c| points.get(c as usize - 1))
                {
                    path.push(*reply);
                    completed += 1;
                }
            }
        }

        let total: i64 = path
            .windows(2)
            .map(|pair| {
                let (dx, dy) =
                    (pair[1].0 - pair[0].0, pair[1].1 - pair[0].1);
                dx * dx + dy * dy
            })
            .sum();
        let even = total % 2 == 0;

        let mut detail = format!(
            "Completed turns: {completed}\nTotal distance sum: {total}\n\
            Point sequence:\n",
        );
        for (i, point) in path.iter().enumerate() {
            if i == 0 {
                detail.push_str(&format!(
                    "Start: ({},{})\n",
                    point.0, point.1,
                ));
            } else {
                detail.push_str(&format!(
                    "Move {i}: ({},{})\n",
                    point.0, point.1,
                ));
            }
        }
        detail.push_str(&format!(
            "Final sum is {}",
            if even { "even" } else { "odd" },
        ));
        (even, detail)
    }
}

/* TESTS */
