//! # Zigzag Graph Game Module
//!
//! Players walk a weighted bipartite graph without revisiting vertices.
//! The solver must traverse strictly decreasing edge weights while the
//! opponent must increase; an opponent with no legal continuation
//! concedes.

use anyhow::Result;
use rand::seq::IndexedRandom;

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

const CHOICE: &str = r"My Choice:\s*(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    half: i64,
    weights: HashMap<(i64, i64), i64>,
    visited: HashSet<i64>,
    last_vertex: Option<i64>,
    last_weight: Option<i64>,
    rng: Rng,
}

impl Session {
    pub fn new(question: &Question, rng: Rng) -> Result<Self> {
        let mut weights = HashMap::new();
        let edges = question
            .field("edge_weights")?
            .as_object()
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Question {} is malformed: 'edge_weights' is not a map.",
                    question.question_id,
                )
            })?;
        for (key, weight) in edges {
            let Some((u, v)) = key.split_once('-').and_then(|(u, v)| {
                Some((
                    u.trim().parse::<i64>().ok()?,
                    v.trim().parse::<i64>().ok()?,
                ))
            }) else {
                continue;
            };
            if let Some(w) = weight.as_i64() {
                weights.insert((u.min(v), u.max(v)), w);
            }
        }

        Ok(Self {
            half: question.scale_u64()? as i64,
            weights,
            visited: HashSet::new(),
            last_vertex: None,
            last_weight: None,
            rng,
        })
    }

    fn weight(&self, u: i64, v: i64) -> Option<i64> {
        self.weights.get(&(u.min(v), u.max(v))).copied()
    }

    fn replies_from(&self, vertex: i64) -> Vec<i64> {
        (1..=2 * self.half)
            .filter(|v| !self.visited.contains(v))
            .filter(|&v| {
                self.weight(vertex, v)
                    .map(|w| {
                        self.last_weight.map(|lw| w > lw).unwrap_or(true)
                    })
                    .unwrap_or(false)
            })
            .collect()
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        let Some(caps) = util::last_match(CHOICE, text) else {
            return Exchange::invalid("Invalid format. Use 'My Choice: X'");
        };
        let Some(vertex) = util::group_i64(&caps, 1) else {
            return Exchange::invalid("Invalid number format");
        };

        let known_edge = self
            .last_vertex
            .map(|last| self.weight(last, vertex).is_some())
            .unwrap_or(true);
        if self.visited.contains(&vertex)
            || vertex < 1
            || vertex > 2 * self.half
            || !known_edge
        {
            return Exchange::invalid("Invalid move");
        }

        self.visited.insert(vertex);
        if let Some(last) = self.last_vertex {
            let weight = self
                .weight(last, vertex)
                .expect("Edge existence was checked above.");
            if let Some(lw) = self.last_weight {
                if weight >= lw {
                    return Exchange::invalid("Invalid weight sequence");
                }
            }
            self.last_weight = Some(weight);
        }

        let result = format!("My Choice: {vertex}");
        let replies = self.replies_from(vertex);
        let Some(&reply) = replies.choose(&mut self.rng) else {
            return Exchange::win(result, "You win!");
        };

        self.visited.insert(reply);
        self.last_vertex = Some(reply);
        self.last_weight = self.weight(vertex, reply);
        Exchange::next(result, format!("My Choice: {reply}"))
    }

    fn is_complete(&self, _result: &str) -> bool {
        self.last_vertex
            .map(|last| self.replies_from(last).is_empty())
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
            let Some(vertex) = turn.result.strip_prefix("My Choice: ")
            else {
                return (
                    false,
                    format!(
                        "Lost: Invalid format at turn {round}\n{}",
                        moves.join("\n"),
                    ),
                );
            };
            moves.push(format!("Turn {round} - Solver chose: {vertex}"));

            let lowered = turn.feedback.to_lowercase();
            if lowered.contains("win") {
                return (true, format!("Win!\n{}", moves.join("\n")));
            }
            if lowered.contains("invalid") {
                return (
                    false,
                    format!(
                        "Lost: {}\n{}",
                        turn.feedback,
                        moves.join("\n"),
                    ),
                );
            }
            if let Some(reply) = util::last_match(CHOICE, &turn.feedback) {
                moves.push(format!(
                    "Turn {round} - Opponent chose: {}",
                    &reply[1],
                ));
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
        // K2,2 with vertices {1,2} and {3,4}.
        let question: Question = serde_json::from_str(
            r#"{"question_id": 38, "title": "ZigzagGraph", "scale": 2,
                "edge_weights": {
                    "1-3": 5, "1-4": 1, "2-3": 7, "2-4": 3
                }}"#,
        )
        .unwrap();
        Session::new(&question, util::session_rng(38)).unwrap()
    }

    #[test]
    fn the_opponent_must_increase_weights() {
        let mut s = session();
        let x = s.parse_response("My Choice: 1");
        assert_eq!(x.outcome, Outcome::Continue);
        // From vertex 1 the opponent takes an edge and its weight becomes
        // the bar the solver must next go under.
        let reply: i64 = x
            .feedback
            .strip_prefix("My Choice: ")
            .unwrap()
            .parse()
            .unwrap();
        assert!(reply == 3 || reply == 4);
        assert_eq!(s.last_weight, s.weight(1, reply));
    }

    #[test]
    fn revisiting_a_vertex_is_illegal() {
        let mut s = session();
        s.parse_response("My Choice: 1");
        let x = s.parse_response("My Choice: 1");
        assert_eq!(x.outcome, Outcome::Invalid);
    }

    #[test]
    fn a_stuck_opponent_concedes() {
        let mut s = session();
        // Only vertex 2 is unvisited: after the solver takes it, every
        // remaining edge is exhausted and the opponent is stuck.
        s.visited = HashSet::from([1, 3, 4]);
        s.last_vertex = Some(4);
        s.last_weight = Some(7);
        let x = s.parse_response("My Choice: 2");
        assert_eq!(x.feedback, "You win!");
        assert_eq!(x.outcome, Outcome::Win);
    }

    #[test]
    fn non_decreasing_solver_moves_are_illegal() {
        let mut s = session();
        s.visited = HashSet::from([1, 3]);
        s.last_vertex = Some(4);
        s.last_weight = Some(1);
        // 4 -> 2 weighs 3, which does not decrease from 1.
        let x = s.parse_response("My Choice: 2");
        assert_eq!(x.feedback, "Invalid weight sequence");
        assert_eq!(x.outcome, Outcome::Invalid);
    }
}
