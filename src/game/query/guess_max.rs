//! # Subset-Maximum Game Module
//!
//! A hidden integer array answers maximum queries over arbitrary position
//! sets. The final answer is a fixed list of values (one per interrogated
//! subset) that must be matched exactly.

use anyhow::Result;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Outcome;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const QUERY: &str = r"My Query:\s*([\d\s]+)";
const ANSWER: &str = r"My Answer:\s*([\d\s]+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    array: Vec<i64>,
    answer: Vec<i64>,
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        Ok(Self {
            array: question.int_list_field("array")?,
            answer: question.int_list_field("answer")?,
        })
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if let Some(caps) = util::last_match(QUERY, text) {
            let Some(positions) = util::ints(&caps[1]) else {
                return Exchange::next(
                    "Invalid",
                    "Invalid number format in query",
                );
            };
            if positions.is_empty() {
                return Exchange::next(
                    "Invalid",
                    "Query must include at least one position",
                );
            }
            let bound = self.array.len() as i64;
            if positions.iter().any(|&p| p < 1 || p > bound) {
                return Exchange::next(
                    "Invalid",
                    format!("Positions must be between 1 and {bound}"),
                );
            }

            let max = positions
                .iter()
                .map(|&p| self.array[p as usize - 1])
                .max()
                .unwrap_or(i64::MIN);
            return Exchange::next(
                format!("Query: {}", util::join(&positions)),
                max.to_string(),
            );
        }

        if let Some(caps) = util::last_match(ANSWER, text) {
            let Some(guess) = util::ints(&caps[1]) else {
                return Exchange::invalid("Invalid number format in answer");
            };
            if guess.len() != self.answer.len() {
                return Exchange::next(
                    "Invalid",
                    format!(
                        "Your answer must contain {} numbers",
                        self.answer.len()
                    ),
                );
            }

            let outcome = if guess == self.answer {
                Outcome::Win
            } else {
                Outcome::Continue
            };
            let verdict =
                if guess == self.answer { "Correct" } else { "Incorrect" };
            return Exchange::new(
                format!("Answer: {}", util::join(&guess)),
                verdict,
                outcome,
            );
        }

        Exchange::new(
            "Invalid",
            "Response must be either 'My Query: ...' or 'My Answer: ...'",
            Outcome::Continue,
        )
    }

    fn is_complete(&self, result: &str) -> bool {
        result
            .strip_prefix("Answer: ")
            .and_then(util::ints)
            .map(|guess| guess == self.answer)
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

        let queries = turns
            .iter()
            .filter(|turn| turn.result.starts_with("Query"))
            .count();
        let Some(last) = turns
            .iter()
            .rev()
            .find(|turn| turn.result.starts_with("Answer:"))
        else {
            return (false, "No answer attempted".into());
        };

        let success = last.feedback == "Correct";
        let detail = format!(
            "Queries made: {queries}, Final answer: {}, Result: {}",
            last.result, last.feedback,
        );
        (success, detail)
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;

    fn session() -> Session {
        let question: Question = serde_json::from_str(
            r#"{"question_id": 5, "title": "GuessMax",
                "array": [7, 2, 9, 4], "answer": [9, 7]}"#,
        )
        .unwrap();
        Session::new(&question).unwrap()
    }

    #[test]
    fn queries_report_the_subset_maximum() {
        let mut s = session();
        let x = s.parse_response("My Query: 2 4 1");
        assert_eq!(x.result, "Query: 2 4 1");
        assert_eq!(x.feedback, "7");
        assert_eq!(x.outcome, Outcome::Continue);
    }

    #[test]
    fn out_of_range_positions_burn_the_turn() {
        let mut s = session();
        let x = s.parse_response("My Query: 1 5");
        assert_eq!(x.result, "Invalid");
        assert_eq!(x.outcome, Outcome::Continue);
    }

    #[test]
    fn exact_answer_wins() {
        let mut s = session();
        let x = s.parse_response("My Answer: 9 7");
        assert_eq!(x.feedback, "Correct");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(s.is_complete("Answer: 9 7"));
        assert!(!s.is_complete("Answer: 7 9"));
    }

    #[test]
    fn wrong_length_answer_burns_the_turn() {
        let mut s = session();
        let x = s.parse_response("My Answer: 9");
        assert_eq!(x.outcome, Outcome::Continue);
        assert!(x.feedback.contains("2 numbers"));
    }
}
