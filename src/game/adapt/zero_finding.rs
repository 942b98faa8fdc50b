//! # Zero-Finding Game Module
//!
//! A hidden binary array answers range-sum queries. The solver may claim
//! non-target zeros (each verified claim flips that zero to one) and must
//! finally name the position that was originally the k-th zero.

use anyhow::Result;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Outcome;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

use std::collections::HashSet;

/* GRAMMAR */

const QUERY: &str = r"My Query:\s*(\d+)\s+(\d+)";
const ANSWER: &str = r"My Answer:\s*(\d+)";
const FINAL: &str = r"My Final Answer:\s*(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    array: Vec<i64>,
    target: i64,
    claimed: HashSet<i64>,
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        Ok(Self {
            array: question.int_list_field("list")?,
            target: question.i64_field("answer")?,
            claimed: HashSet::new(),
        })
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if let Some(caps) = util::last_match(QUERY, text) {
            let (Some(l), Some(r)) =
                (util::group_i64(&caps, 1), util::group_i64(&caps, 2))
            else {
                return Exchange::invalid("Invalid");
            };
            if !(1 <= l && l <= r && r <= self.array.len() as i64) {
                return Exchange::invalid("Invalid");
            }

            let sum: i64 =
                self.array[l as usize - 1..r as usize].iter().sum();
            return Exchange::next(
                format!("Query: {l} {r}"),
                sum.to_string(),
            );
        }

        if let Some(caps) = util::last_match(ANSWER, text) {
            let Some(position) = util::group_i64(&caps, 1) else {
                return Exchange::invalid("Invalid");
            };
            if !(1 <= position && position <= self.array.len() as i64) {
                return Exchange::invalid("Invalid");
            }
            if self.claimed.contains(&position) || position == self.target {
                return Exchange::next(
                    format!("Answer: {position}"),
                    "Incorrect",
                );
            }

            if self.array[position as usize - 1] == 0 {
                self.array[position as usize - 1] = 1;
                self.claimed.insert(position);
                return Exchange::next(
                    format!("Answer: {position}"),
                    "Correct",
                );
            }
            return Exchange::next(format!("Answer: {position}"), "Incorrect");
        }

        if let Some(caps) = util::last_match(FINAL, text) {
            let Some(position) = util::group_i64(&caps, 1) else {
                return Exchange::invalid("Invalid");
            };
            if !(1 <= position && position <= self.array.len() as i64) {
                return Exchange::invalid("Invalid");
            }

            let correct = position == self.target;
            let outcome = if correct { Outcome::Win } else { Outcome::Continue };
            let verdict = if correct { "Correct" } else { "Incorrect" };
            return Exchange::new(format!("Final: {position}"), verdict, outcome);
        }

        Exchange::invalid("Invalid")
    }

    fn is_complete(&self, result: &str) -> bool {
        result
            .strip_prefix("Final: ")
            .and_then(|p| p.parse::<i64>().ok())
            .map(|position| position == self.target)
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

        let queries = turns
            .iter()
            .filter(|turn| turn.result.contains("Query:"))
            .count();
        let claims = turns
            .iter()
            .filter(|turn| turn.result.contains("Answer:"))
            .count();
        let success = last.feedback == "Correct"
            && last.result.starts_with("Final:");
        let detail = format!(
            "Queries used: {queries}, Non-target zeros found: {claims}",
        );
        (success, detail)
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;

    fn session() -> Session {
        // Zeros at positions 2, 4, 5; the target is position 4.
        let question: Question = serde_json::from_str(
            r#"{"question_id": 16, "title": "ZeroFinding",
                "list": [1, 0, 1, 0, 0], "k": 2, "answer": 4}"#,
        )
        .unwrap();
        Session::new(&question).unwrap()
    }

    #[test]
    fn range_sums_reflect_claimed_zeros() {
        let mut s = session();
        let x = s.parse_response("My Query: 1 5");
        assert_eq!(x.feedback, "2");

        let x = s.parse_response("My Answer: 2");
        assert_eq!(x.feedback, "Correct");
        assert_eq!(x.outcome, Outcome::Continue);

        // The claimed zero now counts as a one.
        let x = s.parse_response("My Query: 1 5");
        assert_eq!(x.feedback, "3");
    }

    #[test]
    fn claiming_the_target_is_incorrect() {
        let mut s = session();
        let x = s.parse_response("My Answer: 4");
        assert_eq!(x.feedback, "Incorrect");
        assert_eq!(x.outcome, Outcome::Continue);
    }

    #[test]
    fn repeated_claims_are_incorrect() {
        let mut s = session();
        s.parse_response("My Answer: 2");
        let x = s.parse_response("My Answer: 2");
        assert_eq!(x.feedback, "Incorrect");
    }

    #[test]
    fn final_answer_wins_on_the_target() {
        let mut s = session();
        let x = s.parse_response("My Final Answer: 4");
        assert_eq!(x.result, "Final: 4");
        assert_eq!(x.feedback, "Correct");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(s.is_complete("Final: 4"));

        let mut s = session();
        let x = s.parse_response("My Final Answer: 5");
        assert_eq!(x.feedback, "Incorrect");
        assert_eq!(x.outcome, Outcome::Continue);
    }

    #[test]
    fn out_of_range_query_retires() {
        let mut s = session();
        let x = s.parse_response("My Query: 0 5");
        assert_eq!(x.outcome, Outcome::Invalid);
    }
}
