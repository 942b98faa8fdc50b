//! # Pizza Slice Game Module
//!
//! Players alternately eat "ear" triangles off a convex polygon: choosing a
//! vertex consumes the triangle it forms with its current neighbors. When
//! two vertices remain the eaten areas are compared, and the smaller eater
//! wins.

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

/* GRAMMAR */

const CHOICE: &str = r"My Choice:\s*(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    points: HashMap<i64, (i64, i64)>,
    remaining: Vec<i64>,
    solver_area: f64,
    opponent_area: f64,
    rng: Rng,
}

impl Session {
    pub fn new(question: &Question, rng: Rng) -> Result<Self> {
        let n = question.scale_u64()? as i64;
        let spec = question
            .field("points")?
            .as_object()
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Question {} is malformed: 'points' is not a map.",
                    question.question_id,
                )
            })?;

        let mut points = HashMap::new();
        for (key, value) in spec {
            let (Ok(vertex), Some(point)) =
                (key.trim().parse::<i64>(), crate::model::pair_of(value))
            else {
                continue;
            };
            points.insert(vertex, point);
        }

        Ok(Self {
            points,
            remaining: (1..=n).collect(),
            solver_area: 0.0,
            opponent_area: 0.0,
            rng,
        })
    }

    /// Area of the triangle formed by `vertex` and its two neighbors on
    /// the current polygon boundary.
    fn ear_area(&self, vertex: i64) -> f64 {
        let slot = self
            .remaining
            .iter()
            .position(|&v| v == vertex)
            .expect("Vertex membership was checked by the caller.");
        let next = self.remaining[(slot + 1) % self.remaining.len()];
        let prev = self.remaining
            [(slot + self.remaining.len() - 1) % self.remaining.len()];

        let origin = self.point(vertex);
        let (x2, y2) = self.point(next);
        let (x3, y3) = self.point(prev);
        let cross = (x2 - origin.0) * (y3 - origin.1)
            - (x3 - origin.0) * (y2 - origin.1);
        cross.abs() as f64 / 2.0
    }

    fn point(&self, vertex: i64) -> (i64, i64) {
        self.points.get(&vertex).copied().unwrap_or((0, 0))
    }

    fn verdict(&self, result: String, prefix: &str) -> Exchange {
        if self.solver_area < self.opponent_area {
            Exchange::win(result, format!("{prefix}You win!"))
        } else {
            Exchange::lose(result, format!("{prefix}You lose!"))
        }
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
        if !self.remaining.contains(&vertex) {
            return Exchange::invalid("Invalid vertex choice");
        }

        self.solver_area += self.ear_area(vertex);
        self.remaining.retain(|&v| v != vertex);
        let result = format!("My Choice: {vertex}");

        if self.remaining.len() == 2 {
            return self.verdict(result, "");
        }

        let Some(&reply) = self.remaining.choose(&mut self.rng) else {
            return self.verdict(result, "");
        };
        self.opponent_area += self.ear_area(reply);
        self.remaining.retain(|&v| v != reply);

        if self.remaining.len() == 2 {
            return self.verdict(result, &format!("My Choice: {reply} "));
        }
        Exchange::next(result, reply.to_string())
    }

    fn is_complete(&self, _result: &str) -> bool {
        self.remaining.len() <= 2
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

        let n = question.scale_u64().unwrap_or(0) as i64;
        let mut remaining: Vec<i64> = (1..=n).collect();
        let mut moves = Vec::new();
        for (i, turn) in turns.iter().enumerate() {
            let round = i + 1;
            let Some(vertex) = turn
                .result
                .strip_prefix("My Choice: ")
                .and_then(|v| v.parse::<i64>().ok())
            else {
                return (
                    false,
                    format!(
                        "Lost: Invalid format at turn {round}\n{}",
                        moves.join("\n"),
                    ),
                );
            };
            if !remaining.contains(&vertex) {
                return (
                    false,
                    format!(
                        "Lost: Invalid vertex choice at turn {round}\n{}",
                        moves.join("\n"),
                    ),
                );
            }
            remaining.retain(|&v| v != vertex);
            moves.push(format!("Turn {round} - Solver chose vertex {vertex}"));

            let lowered = turn.feedback.to_lowercase();
            if turn.feedback.contains("Invalid") {
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
            if lowered.contains("lose") {
                return (
                    false,
                    format!("Lost: Ate more area\n{}", moves.join("\n")),
                );
            }
            if let Ok(reply) = turn.feedback.parse::<i64>() {
                remaining.retain(|&v| v != reply);
                moves.push(format!(
                    "Turn {round} - Opponent chose vertex {reply}",
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
        // A 2x2 square with vertices in convex order.
        let question: Question = serde_json::from_str(
            r#"{"question_id": 40, "title": "PizzaSlice", "scale": 4,
                "points": {
                    "1": [0, 0], "2": [2, 0], "3": [2, 2], "4": [0, 2]
                }}"#,
        )
        .unwrap();
        Session::new(&question, util::session_rng(40)).unwrap()
    }

    #[test]
    fn ear_areas_use_the_current_neighbors() {
        let s = session();
        // Each corner of the square cuts off half of it.
        assert_eq!(s.ear_area(1), 2.0);
        assert_eq!(s.ear_area(3), 2.0);
    }

    #[test]
    fn one_exchange_ends_a_square() {
        let mut s = session();
        let x = s.parse_response("My Choice: 1");
        // Two vertices remain after both eat, so a verdict is issued.
        assert!(matches!(x.outcome, Outcome::Win | Outcome::Lose));
        assert!(
            x.feedback.contains("You win!")
                || x.feedback.contains("You lose!"),
        );
        assert!(s.is_complete(""));
    }

    #[test]
    fn the_smaller_eater_wins() {
        let mut s = session();
        s.solver_area = 1.0;
        s.opponent_area = 3.0;
        s.remaining = vec![1, 2, 3];
        let x = s.parse_response("My Choice: 1");
        assert_eq!(x.outcome, Outcome::Lose);
    }

    #[test]
    fn eaten_vertices_cannot_be_chosen_again() {
        let mut s = session();
        s.remaining = vec![1, 2, 3];
        s.parse_response("My Choice: 1");
        let x = s.parse_response("My Choice: 1");
        assert_eq!(x.outcome, Outcome::Invalid);
    }
}
