//! # Rotary Laser Lock Game Module
//!
//! N concentric rings of N*M sections each carry one metal arc covering M
//! consecutive sections. Unit rotations shift one ring; after each rotation
//! the handler reports how many of the N*M center lasers escape every arc.
//! The answer states the final arc positions of rings 1..N-1 relative to
//! ring 0.

use anyhow::Result;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Outcome;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const QUERY: &str = r"My Query:\s*(\d+)\s+(-?\d+)";
const ANSWER: &str = r"My Answer:\s*(\d+(?:\s+\d+)*)";

/* GAME IMPLEMENTATION */

pub struct Session {
    positions: Vec<i64>,
    rings: i64,
    arc: i64,
    sections: i64,
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        let positions = question.int_list_field("answer")?;
        let rings = question.i64_field("n")?;
        let arc = question.i64_field("m")?;
        if positions.len() as i64 != rings {
            anyhow::bail!(
                "Question {} is malformed: expected {rings} arc positions.",
                question.question_id,
            );
        }
        Ok(Self {
            positions,
            rings,
            arc,
            sections: rings * arc,
        })
    }

    /// Section `s` is covered by a ring iff `(s - offset) mod N*M < M`.
    fn unblocked(&self) -> i64 {
        (0..self.sections)
            .filter(|&section| {
                self.positions.iter().all(|&offset| {
                    (section - offset).rem_euclid(self.sections) >= self.arc
                })
            })
            .count() as i64
    }

    fn relative(&self) -> Vec<i64> {
        self.positions[1..]
            .iter()
            .map(|&p| p.rem_euclid(self.sections))
            .collect()
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if let Some(caps) = util::last_match(QUERY, text) {
            let (Some(ring), Some(direction)) =
                (util::group_i64(&caps, 1), util::group_i64(&caps, 2))
            else {
                return Exchange::invalid("Invalid number format in query");
            };
            if !(0 <= ring && ring < self.rings)
                || (direction != -1 && direction != 1)
            {
                return Exchange::invalid("Invalid ring number or direction");
            }

            let slot = ring as usize;
            self.positions[slot] =
                (self.positions[slot] + direction).rem_euclid(self.sections);
            return Exchange::next(
                format!("Rotation:{ring},{direction}"),
                self.unblocked().to_string(),
            );
        }

        if let Some(caps) = util::last_match(ANSWER, text) {
            let Some(claimed) = util::ints(&caps[1]) else {
                return Exchange::invalid("Invalid number format in answer");
            };
            if claimed.len() as i64 != self.rings - 1 {
                return Exchange::next("Invalid", "Wrong number of positions");
            }
            if !claimed.iter().all(|&p| 0 <= p && p < self.sections) {
                return Exchange::next("Invalid", "Position out of range");
            }

            let listed = claimed
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(",");
            let correct = claimed == self.relative();
            let outcome = if correct { Outcome::Win } else { Outcome::Continue };
            let verdict = if correct { "Correct" } else { "Incorrect" };
            return Exchange::new(format!("Answer:{listed}"), verdict, outcome);
        }

        Exchange::invalid(
            "Invalid format. Use 'My Query: x d' or 'My Answer: p1 p2...'",
        )
    }

    fn is_complete(&self, result: &str) -> bool {
        result
            .strip_prefix("Answer:")
            .and_then(util::csv_ints)
            .map(|claimed| claimed == self.relative())
            .unwrap_or(false)
    }
}

/* EVALUATION */

pub struct Evaluator;

impl Evaluate for Evaluator {
    fn evaluate_game(&self, _: &Question, turns: &[Turn]) -> (bool, String) {
        let Some(last) = turns.last() else {
            return (false, "No turns played".into());
        };

        let rotations = turns
            .iter()
            .filter(|turn| turn.result.contains("Rotation:"))
            .count();
        let answers = turns
            .iter()
            .filter(|turn| turn.result.contains("Answer:"))
            .count();
        let success = last.feedback == "Correct";
        let detail =
            format!("Queries used: {rotations}, Answer found: {answers}");
        (success, detail)
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;

    fn session() -> Session {
        // Three rings of 18 sections; arcs of 6 at offsets 0, 2, 4.
        let question: Question = serde_json::from_str(
            r#"{"question_id": 6, "title": "RotaryLock",
                "answer": [0, 2, 4], "n": 3, "m": 6}"#,
        )
        .unwrap();
        Session::new(&question).unwrap()
    }

    #[test]
    fn unblocked_count_reflects_arc_union() {
        let mut s = session();
        // Arcs cover 0..6, 2..8, 4..10: union 0..10, so 8 lasers escape.
        // Rotating ring 2 clockwise moves its arc to 5..11.
        let x = s.parse_response("My Query: 2 1");
        assert_eq!(x.result, "Rotation:2,1");
        assert_eq!(x.feedback, "7");
    }

    #[test]
    fn rotations_wrap_modulo_the_section_count() {
        let mut s = session();
        for _ in 0..18 {
            s.parse_response("My Query: 1 -1");
        }
        assert_eq!(s.positions[1], 2);
    }

    #[test]
    fn relative_positions_are_the_accepted_answer() {
        let mut s = session();
        s.parse_response("My Query: 2 1");
        let x = s.parse_response("My Answer: 2 5");
        assert_eq!(x.feedback, "Correct");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(s.is_complete("Answer:2,5"));
    }

    #[test]
    fn wrong_count_burns_the_turn() {
        let mut s = session();
        let x = s.parse_response("My Answer: 2");
        assert_eq!(x.feedback, "Wrong number of positions");
        assert_eq!(x.outcome, Outcome::Continue);
    }

    #[test]
    fn bad_direction_retires() {
        let mut s = session();
        let x = s.parse_response("My Query: 1 2");
        assert_eq!(x.outcome, Outcome::Invalid);
    }
}
