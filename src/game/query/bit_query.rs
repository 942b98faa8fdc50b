//! # Bitwise Query Game Module
//!
//! A hidden digit array answers AND/OR/XOR queries over pairs of distinct
//! positions; the final answer must reproduce the array elementwise.

use anyhow::Result;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Outcome;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const QUERY: &str = r"My Query:\s*(AND|OR|XOR)\s*(\d+)\s*(\d+)";
const ANSWER: &str = r"My Answer:\s*([\d\s]+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    array: Vec<i64>,
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        let digits = question.str_field("answer")?;
        let array = digits
            .chars()
            .map(|c| c.to_digit(10).map(i64::from))
            .collect::<Option<Vec<i64>>>()
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Question {} is malformed: 'answer' is not a digit \
                    string.",
                    question.question_id,
                )
            })?;
        Ok(Self { array })
    }

    fn in_range(&self, position: i64) -> bool {
        1 <= position && position <= self.array.len() as i64
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if let Some(caps) = util::last_match(QUERY, text) {
            let operation = caps[1].to_owned();
            let (Some(i), Some(j)) =
                (util::group_i64(&caps, 2), util::group_i64(&caps, 3))
            else {
                return Exchange::invalid("Invalid query format");
            };
            if !self.in_range(i) || !self.in_range(j) {
                return Exchange::invalid("Invalid position");
            }
            if i == j {
                return Exchange::next(
                    "Invalid",
                    "Cannot query same position",
                );
            }

            let (a, b) =
                (self.array[i as usize - 1], self.array[j as usize - 1]);
            let value = match operation.as_str() {
                "AND" => a & b,
                "OR" => a | b,
                _ => a ^ b,
            };
            return Exchange::next(
                format!("Query: {operation} {i} {j}"),
                value.to_string(),
            );
        }

        if let Some(caps) = util::last_match(ANSWER, text) {
            let Some(guess) = util::ints(&caps[1]) else {
                return Exchange::next("Invalid", "Invalid answer format");
            };
            let n = self.array.len();
            if guess.len() != n {
                return Exchange::next(
                    "Invalid",
                    format!("Answer must contain {n} numbers"),
                );
            }
            if guess.iter().any(|&x| x < 0 || x >= n as i64) {
                return Exchange::next(
                    "Invalid",
                    format!("Numbers must be between 0 and {}", n - 1),
                );
            }

            let correct = guess == self.array;
            let outcome = if correct { Outcome::Win } else { Outcome::Continue };
            let verdict = if correct { "Correct" } else { "Incorrect" };
            return Exchange::new(
                format!("Answer: {}", util::join(&guess)),
                verdict,
                outcome,
            );
        }

        Exchange::invalid(
            "Invalid format. Use 'My Query: OPERATION i j' or \
            'My Answer: a1 a2 ... an'",
        )
    }

    fn is_complete(&self, result: &str) -> bool {
        result
            .strip_prefix("Answer: ")
            .and_then(util::ints)
            .map(|guess| guess == self.array)
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

        let queries: Vec<String> = turns
            .iter()
            .filter(|turn| turn.result.starts_with("Query:"))
            .map(|turn| {
                let spec = turn.result.split(": ").nth(1).unwrap_or_default();
                format!("{spec} -> {}", turn.feedback)
            })
            .collect();
        let mut detail =
            format!("Queries made {}:\n{}", queries.len(), queries.join("\n"));

        let Some(answer) = turns
            .iter()
            .rev()
            .find(|turn| turn.result.starts_with("Answer:"))
        else {
            detail.push_str("\nNo final answer submitted");
            return (false, detail);
        };

        let success = answer.feedback == "Correct";
        let submitted = answer.result.split(": ").nth(1).unwrap_or_default();
        detail.push_str(&format!(
            "\nFinal answer: {submitted}\nResult: {}",
            if success { "Correct" } else { "Incorrect" },
        ));
        (success, detail)
    }
}

/* TESTS */
