//! # Popcount Guessing Game Module
//!
//! The solver whittles down a hidden integer by subtracting amounts of its
//! choosing; after each subtraction it learns the number of set bits in the
//! new value. The final answer must equal the current value.

use anyhow::Result;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Outcome;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const OPERATION: &str = r"My Operation:\s*(\d+)";
const ANSWER: &str = r"My Answer:\s*(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    current: u64,
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        Ok(Self {
            current: question.u64_field("answer")?,
        })
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if let Some(caps) = util::last_match(OPERATION, text) {
            let Ok(amount) = caps[1].parse::<u64>() else {
                return Exchange::invalid("Invalid");
            };
            if amount > self.current {
                // An oversized subtraction is rejected but not terminal.
                return Exchange::next(
                    format!("Operation: {amount}"),
                    "Invalid",
                );
            }

            self.current -= amount;
            return Exchange::next(
                format!("Operation: {amount}"),
                self.current.count_ones().to_string(),
            );
        }

        if let Some(caps) = util::last_match(ANSWER, text) {
            let Ok(guess) = caps[1].parse::<u64>() else {
                return Exchange::invalid("Invalid");
            };
            let correct = guess == self.current;
            let outcome = if correct { Outcome::Win } else { Outcome::Continue };
            let verdict = if correct { "Correct" } else { "Incorrect" };
            return Exchange::new(format!("Answer: {guess}"), verdict, outcome);
        }

        Exchange::invalid("Invalid")
    }

    fn is_complete(&self, result: &str) -> bool {
        result
            .strip_prefix("Answer: ")
            .and_then(|g| g.parse::<u64>().ok())
            .map(|guess| guess == self.current)
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

        let mut operations = Vec::new();
        for turn in turns {
            if let Some(amount) = turn.result.strip_prefix("Operation: ") {
                operations.push(format!(
                    "Operation {amount} -> Response {}",
                    turn.feedback,
                ));
            } else if let Some(guess) = turn.result.strip_prefix("Answer: ") {
                operations
                    .push(format!("Answer {guess} -> {}", turn.feedback));
                if turn.feedback == "Correct" {
                    let detail = format!(
                        "Successfully guessed the number: {guess}\n\
                        Total operations: {}\n\
                        Operation sequence:\n{}",
                        operations.len(),
                        operations.join("\n"),
                    );
                    return (true, detail);
                }
            }
        }

        let detail = format!(
            "Failed to guess the number after {} operations\n\
            Operation sequence:\n{}",
            operations.len(),
            operations.join("\n"),
        );
        (false, detail)
    }
}

/* TESTS */
