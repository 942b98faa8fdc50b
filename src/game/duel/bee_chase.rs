//! # Bee Chase Game Module
//!
//! Three bees hunt a runner over a graph. The first exchange places the
//! bees; the runner then appears on a free random vertex. Each round every
//! bee stays or crosses one edge; the runner flees to a free neighbor.
//! Catching the runner, or trapping it with no free neighbor, wins.

use anyhow::Result;
use rand::seq::IndexedRandom;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Rng;
use crate::game::util;
use crate::game::util::Graph;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const CHOICE: &str = r"My Choice:\s*(\d+)\s+(\d+)\s+(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    graph: Graph,
    vertices: i64,
    bees: Option<[i64; 3]>,
    runner: i64,
    rng: Rng,
}

impl Session {
    pub fn new(question: &Question, rng: Rng) -> Result<Self> {
        let mut graph = Graph::new();
        for (u, v) in question.pair_list_field("graph")? {
            graph.add_edge(u, v);
        }
        Ok(Self {
            graph,
            vertices: question.scale_u64()? as i64,
            bees: None,
            runner: 0,
            rng,
        })
    }

    fn legal_relocation(&self, from: [i64; 3], to: [i64; 3]) -> bool {
        from.iter().zip(&to).all(|(&old, &new)| {
            old == new || self.graph.neighbors(old).contains(&new)
        })
    }

    fn flee(&mut self) -> Option<i64> {
        let bees = self.bees.unwrap_or([0; 3]);
        let options: Vec<i64> = self
            .graph
            .neighbors(self.runner)
            .iter()
            .copied()
            .filter(|v| !bees.contains(v))
            .collect();
        options.choose(&mut self.rng).copied()
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        let Some(caps) = util::last_match(CHOICE, text) else {
            return Exchange::invalid("Invalid format. Use 'My Choice: X Y Z'");
        };
        let positions: Vec<i64> = (1..=3)
            .filter_map(|i| util::group_i64(&caps, i))
            .collect();
        let [a, b, c] = positions.as_slice() else {
            return Exchange::invalid("Invalid number format");
        };
        let placement = [*a, *b, *c];
        if !placement
            .iter()
            .all(|&p| 1 <= p && p <= self.vertices)
        {
            return Exchange::invalid(match self.bees {
                None => "Invalid initial placement",
                Some(_) => "Invalid bee movement",
            });
        }
        let result = format!("My Choice: {a} {b} {c}");

        let Some(current) = self.bees else {
            let free: Vec<i64> = (1..=self.vertices)
                .filter(|v| !placement.contains(v))
                .collect();
            let Some(&start) = free.choose(&mut self.rng) else {
                return Exchange::invalid("No valid position for the runner");
            };
            self.bees = Some(placement);
            self.runner = start;
            return Exchange::next(result, start.to_string());
        };

        if !self.legal_relocation(current, placement) {
            return Exchange::invalid("Invalid bee movement");
        }
        self.bees = Some(placement);

        if placement.contains(&self.runner) {
            return Exchange::win(result, "You win!");
        }

        let Some(next) = self.flee() else {
            return Exchange::win(result, "You win!");
        };
        self.runner = next;
        Exchange::next(result, next.to_string())
    }

    fn is_complete(&self, _result: &str) -> bool {
        self.bees
            .map(|bees| bees.contains(&self.runner))
            .unwrap_or(false)
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
            let Some(bees) = turn
                .result
                .strip_prefix("My Choice: ")
                .and_then(util::ints)
                .filter(|positions| positions.len() == 3)
            else {
                return (
                    false,
                    format!(
                        "Lost: Invalid format at turn {round}\n{}",
                        moves.join("\n"),
                    ),
                );
            };
            moves.push(format!("Turn {round} - Bees at: {bees:?}"));

            let lowered = turn.feedback.to_lowercase();
            if lowered.contains("invalid") {
                return (
                    false,
                    format!(
                        "Lost: Invalid move at turn {round}\n{}",
                        moves.join("\n"),
                    ),
                );
            }
            if lowered.contains("win") {
                return (true, format!("Win!\n{}", moves.join("\n")));
            }
            if let Ok(runner) = turn.feedback.parse::<i64>() {
                moves.push(format!("Turn {round} - Runner at: {runner}"));
            }
        }

        (false, format!("Game incomplete\n{}", moves.join("\n")))
    }
}

/* TESTS */
