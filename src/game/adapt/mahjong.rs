//! # Mahjong Detective Game Module
//!
//! A hidden multiset of tiles valued 1..=n grows as the solver adds tiles.
//! After each addition the handler reports the number of triplet
//! combinations and straight products in the current set; the answer must
//! state the exact per-value counts.

use anyhow::Result;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Outcome;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const ADD: &str = r"My Query:\s*\+\s*(\d+)";
const ANSWER: &str = r"My Answer:\s*([\d\s]+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    tiles: Vec<i64>,
    limit: i64,
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        Ok(Self {
            tiles: question.int_list_field("answer")?,
            limit: question.scale_u64()? as i64,
        })
    }

    fn count(&self, value: i64) -> i64 {
        self.tiles.iter().filter(|&&t| t == value).count() as i64
    }

    /// Number of ways to pick three identical tiles, summed over values.
    fn triplets(&self) -> i64 {
        (1..=self.limit)
            .map(|value| {
                let c = self.count(value);
                c * (c - 1) * (c - 2) / 6
            })
            .sum()
    }

    /// Number of (a, a+1, a+2) combinations, as a product of counts.
    fn straights(&self) -> i64 {
        (1..=self.limit - 2)
            .map(|start| {
                self.count(start)
                    * self.count(start + 1)
                    * self.count(start + 2)
            })
            .sum()
    }

    fn counts(&self) -> Vec<i64> {
        (1..=self.limit).map(|value| self.count(value)).collect()
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if let Some(caps) = util::last_match(ADD, text) {
            let Some(value) = util::group_i64(&caps, 1) else {
                return Exchange::invalid("Invalid");
            };
            if !(1 <= value && value <= self.limit) {
                return Exchange::invalid("Invalid");
            }

            self.tiles.push(value);
            return Exchange::next(
                format!("Add: {value}"),
                format!("{} {}", self.triplets(), self.straights()),
            );
        }

        if let Some(caps) = util::last_match(ANSWER, text) {
            let Some(claimed) = util::ints(&caps[1]) else {
                return Exchange::invalid("Invalid");
            };
            if claimed.len() as i64 != self.limit {
                return Exchange::invalid("Invalid");
            }
            if !claimed.iter().all(|&c| 0 <= c && c <= self.limit) {
                return Exchange::invalid("Invalid");
            }

            let correct = claimed == self.counts();
            let outcome = if correct { Outcome::Win } else { Outcome::Continue };
            let verdict = if correct { "Correct" } else { "Incorrect" };
            return Exchange::new(
                format!("Answer: {}", util::join(&claimed)),
                verdict,
                outcome,
            );
        }

        Exchange::invalid("Invalid")
    }

    fn is_complete(&self, result: &str) -> bool {
        result
            .strip_prefix("Answer: ")
            .and_then(util::ints)
            .map(|claimed| claimed == self.counts())
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

        let additions = turns
            .iter()
            .filter(|turn| turn.result.contains("Add:"))
            .count();
        let answers = turns
            .iter()
            .filter(|turn| turn.result.contains("Answer:"))
            .count();
        let success = last.feedback == "Correct";
        let detail =
            format!("Queries used: {additions}, Answer found: {answers}");
        (success, detail)
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;

    fn session() -> Session {
        let question: Question = serde_json::from_str(
            r#"{"question_id": 18, "title": "MahjongDetective",
                "scale": 4, "answer": [1, 1, 2, 3, 3]}"#,
        )
        .unwrap();
        Session::new(&question).unwrap()
    }

    #[test]
    fn additions_report_triplets_and_straights() {
        let mut s = session();
        // Tiles become {1: 3, 2: 1, 3: 2}: one triplet of 1s, straights
        // 1-2-3 contribute 3 * 1 * 2 = 6, 2-3-4 contribute 0.
        let x = s.parse_response("My Query: + 1");
        assert_eq!(x.result, "Add: 1");
        assert_eq!(x.feedback, "1 6");
    }

    #[test]
    fn triplet_count_uses_combinations() {
        let mut s = session();
        s.parse_response("My Query: + 1");
        s.parse_response("My Query: + 1");
        // Four 1s yield C(4,3) = 4 triplets.
        let x = s.parse_response("My Query: + 2");
        assert_eq!(x.feedback.split(' ').next().unwrap(), "4");
    }

    #[test]
    fn answer_must_match_the_current_counts() {
        let mut s = session();
        s.parse_response("My Query: + 4");
        let x = s.parse_response("My Answer: 2 1 2 1");
        assert_eq!(x.feedback, "Correct");
        assert_eq!(x.outcome, Outcome::Win);

        let mut s = session();
        let x = s.parse_response("My Answer: 2 1 2 1");
        assert_eq!(x.feedback, "Incorrect");
        assert_eq!(x.outcome, Outcome::Continue);
    }

    #[test]
    fn out_of_range_addition_retires() {
        let mut s = session();
        let x = s.parse_response("My Query: + 5");
        assert_eq!(x.outcome, Outcome::Invalid);
    }
}
