//! # Linked-List Query Game Module
//!
//! The solver explores a hidden singly linked list one node at a time. Each
//! query reveals a node's value and successor position; the final answer is
//! judged against a hidden target value.

use anyhow::Result;
use serde_json::Value;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Outcome;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

use std::collections::HashMap;

/* GRAMMAR */

const QUERY: &str = r"My Query:\s*(\d+)";
const ANSWER: &str = r"My Answer:\s*(\d+)";

/* DEFINITIONS */

struct Node {
    value: i64,
    next: Option<i64>,
}

/* GAME IMPLEMENTATION */

pub struct Session {
    nodes: HashMap<String, Node>,
    answer: i64,
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        let raw = question.field("list")?;
        let entries = raw.as_object().ok_or_else(|| {
            anyhow::anyhow!(
                "Question {} is malformed: 'list' is not an object.",
                question.question_id,
            )
        })?;

        let mut nodes = HashMap::new();
        for (position, node) in entries {
            let value = node
                .get("value")
                .and_then(Value::as_i64)
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "Question {} is malformed: node '{position}' has no \
                        integer value.",
                        question.question_id,
                    )
                })?;
            let next = node.get("next").and_then(Value::as_i64);
            nodes.insert(position.clone(), Node { value, next });
        }

        Ok(Self {
            nodes,
            answer: question.i64_field("answer")?,
        })
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if let Some(caps) = util::last_match(QUERY, text) {
            let position = &caps[1];
            let Some(node) = self.nodes.get(position) else {
                return Exchange::next(
                    "Invalid",
                    format!("Position {position} is not valid"),
                );
            };

            let next = node
                .next
                .map(|n| n.to_string())
                .unwrap_or_else(|| "None".into());
            return Exchange::next(
                "Query",
                format!("value={}, next={next}", node.value),
            );
        }

        if let Some(caps) = util::last_match(ANSWER, text) {
            let Some(guess) = util::group_i64(&caps, 1) else {
                return Exchange::next("Invalid", "Invalid number in answer");
            };
            let outcome = if guess == self.answer {
                Outcome::Win
            } else {
                Outcome::Continue
            };
            let verdict =
                if guess == self.answer { "Correct" } else { "Incorrect" };
            return Exchange::new(guess.to_string(), verdict, outcome);
        }

        Exchange::new(
            "Invalid",
            "Your response must be either 'My Query: [POSITION]' or \
            'My Answer: [VALUE]'",
            Outcome::Continue,
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
    fn evaluate_game(
        &self,
        question: &Question,
        turns: &[Turn],
    ) -> (bool, String) {
        let Some(last) = turns.last() else {
            return (false, "No turns played".into());
        };
        if last.result.parse::<i64>().is_err() {
            return (
                false,
                "Game did not end with an answer submission".into(),
            );
        }

        let success = last.feedback == "Correct";
        let expected = question
            .i64_field("answer")
            .map(|v| v.to_string())
            .unwrap_or_else(|_| "?".into());
        let detail = format!(
            "Final answer: {}, Expected: {expected}",
            last.result,
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
            r#"{"question_id": 6, "title": "ListQuery", "answer": 42,
                "list": {
                    "1": {"value": 10, "next": 3},
                    "2": {"value": 42, "next": null},
                    "3": {"value": 5, "next": 2}
                }}"#,
        )
        .unwrap();
        Session::new(&question).unwrap()
    }

    #[test]
    fn queries_reveal_value_and_successor() {
        let mut s = session();
        let x = s.parse_response("My Query: 1");
        assert_eq!(x.result, "Query");
        assert_eq!(x.feedback, "value=10, next=3");

        let x = s.parse_response("My Query: 2");
        assert_eq!(x.feedback, "value=42, next=None");
    }

    #[test]
    fn unknown_position_burns_the_turn() {
        let mut s = session();
        let x = s.parse_response("My Query: 9");
        assert_eq!(x.result, "Invalid");
        assert_eq!(x.outcome, Outcome::Continue);
    }

    #[test]
    fn correct_value_wins() {
        let mut s = session();
        let x = s.parse_response("My Answer: 42");
        assert_eq!(x.feedback, "Correct");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(s.is_complete("42"));

        let x = s.parse_response("My Answer: 10");
        assert_eq!(x.feedback, "Incorrect");
        assert_eq!(x.outcome, Outcome::Continue);
    }
}
