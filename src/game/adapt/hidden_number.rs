//! # Hidden Number Game Module
//!
//! A set-membership oracle guards a hidden number and may lie: the first
//! query is always answered truthfully, the query after a lie is truthful
//! again, and otherwise honesty is a coin flip. Direct guesses are always
//! judged truthfully.

use anyhow::Result;
use rand::Rng as _;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Outcome;
use crate::game::Rng;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const QUERY: &str = r"My Query:\s*(\d+(?:\s+\d+)+)";
const ANSWER: &str = r"My Answer:\s*(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    answer: i64,
    last_was_lie: Option<bool>,
    rng: Rng,
}

impl Session {
    pub fn new(question: &Question, rng: Rng) -> Result<Self> {
        Ok(Self {
            answer: question.i64_field("answer")?,
            last_was_lie: None,
            rng,
        })
    }

    fn oracle(&mut self, members: &[i64]) -> &'static str {
        let truth = if members.contains(&self.answer) { "YES" } else { "NO" };
        let lie = if truth == "YES" { "NO" } else { "YES" };

        // Truthful on the first query and immediately after a lie.
        if self.last_was_lie.unwrap_or(true) {
            self.last_was_lie = Some(false);
            return truth;
        }

        if self.rng.random_bool(0.5) {
            self.last_was_lie = Some(false);
            truth
        } else {
            self.last_was_lie = Some(true);
            lie
        }
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if let Some(caps) = util::last_match(QUERY, text) {
            let Some(numbers) = util::ints(&caps[1]) else {
                return Exchange::next(
                    "Invalid",
                    "Invalid number format in query",
                );
            };
            let (k, members) = (numbers[0], &numbers[1..]);
            if members.len() as i64 != k {
                return Exchange::next(
                    "Invalid",
                    "Number of elements doesn't match the specified size",
                );
            }

            let listed = members
                .iter()
                .map(|x| x.to_string())
                .collect::<Vec<_>>()
                .join(",");
            let response = self.oracle(members);
            return Exchange::next(format!("Query:{listed}"), response);
        }

        if let Some(caps) = util::last_match(ANSWER, text) {
            let Some(guess) = util::group_i64(&caps, 1) else {
                return Exchange::next("Invalid", "Invalid number in guess");
            };
            let correct = guess == self.answer;
            let outcome = if correct { Outcome::Win } else { Outcome::Continue };
            let verdict = if correct { "Correct" } else { "Incorrect" };
            return Exchange::new(guess.to_string(), verdict, outcome);
        }

        Exchange::invalid(
            "Invalid format. Use 'My Query: k n1 n2...' or 'My Answer: x'",
        )
    }

    fn is_complete(&self, result: &str) -> bool {
        result
            .parse::<i64>()
            .map(|guess| guess == self.answer)
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
        let answers = turns
            .iter()
            .filter(|turn| turn.result.parse::<i64>().is_ok())
            .count();
        let success = last.feedback == "Correct";
        let detail =
            format!("Queries used: {queries}, Answer found: {answers}");
        (success, detail)
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;

    fn session() -> Session {
        let question: Question = serde_json::from_str(
            r#"{"question_id": 19, "title": "FindHidden", "answer": 7}"#,
        )
        .unwrap();
        Session::new(&question, util::session_rng(19)).unwrap()
    }

    #[test]
    fn first_query_is_always_truthful() {
        let mut s = session();
        let x = s.parse_response("My Query: 3 7 8 9");
        assert_eq!(x.result, "Query:7,8,9");
        assert_eq!(x.feedback, "YES");

        let mut s = session();
        let x = s.parse_response("My Query: 2 1 2");
        assert_eq!(x.feedback, "NO");
    }

    #[test]
    fn the_turn_after_a_lie_is_truthful() {
        let mut s = session();
        s.parse_response("My Query: 1 7");
        for _ in 0..50 {
            let was_lie = {
                let x = s.parse_response("My Query: 1 7");
                x.feedback == "NO"
            };
            if was_lie {
                let x = s.parse_response("My Query: 1 7");
                assert_eq!(x.feedback, "YES");
            }
        }
    }

    #[test]
    fn size_mismatch_burns_the_turn() {
        let mut s = session();
        let x = s.parse_response("My Query: 3 7 8");
        assert_eq!(x.result, "Invalid");
        assert_eq!(x.outcome, Outcome::Continue);
    }

    #[test]
    fn direct_guess_is_judged_truthfully() {
        let mut s = session();
        let x = s.parse_response("My Answer: 7");
        assert_eq!(x.feedback, "Correct");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(s.is_complete("7"));

        let mut s = session();
        let x = s.parse_response("My Answer: 8");
        assert_eq!(x.feedback, "Incorrect");
        assert_eq!(x.outcome, Outcome::Continue);
    }
}
