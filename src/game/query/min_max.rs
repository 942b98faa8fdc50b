//! # Min/Max Position Game Module
//!
//! A hidden digit array answers pairwise comparisons; the final answer
//! names the positions of the minimum and maximum elements.

use anyhow::Result;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Outcome;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const QUERY: &str = r"My Query:\s*(\d+)\s+(\d+)";
const ANSWER: &str = r"My Answer:\s*(\d+)\s+(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    array: Vec<u32>,
    min_pos: i64,
    max_pos: i64,
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        let digits = question.str_field("answer")?;
        let array = digits
            .chars()
            .map(|c| c.to_digit(10))
            .collect::<Option<Vec<u32>>>()
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Question {} is malformed: 'answer' is not a digit \
                    string.",
                    question.question_id,
                )
            })?;
        Ok(Self {
            array,
            min_pos: question.i64_field("min_pos")?,
            max_pos: question.i64_field("max_pos")?,
        })
    }

    fn in_range(&self, position: i64) -> bool {
        1 <= position && position <= self.array.len() as i64
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if let Some(caps) = util::last_match(QUERY, text) {
            let (Some(i), Some(j)) =
                (util::group_i64(&caps, 1), util::group_i64(&caps, 2))
            else {
                return Exchange::invalid("Invalid position format");
            };
            let n = self.array.len();
            if !self.in_range(i) || !self.in_range(j) {
                return Exchange::next(
                    "Invalid",
                    format!("Positions must be between 1 and {n}"),
                );
            }
            if i == j {
                return Exchange::next(
                    "Invalid",
                    "Cannot compare same positions",
                );
            }

            let (a, b) =
                (self.array[i as usize - 1], self.array[j as usize - 1]);
            let comparison = match a.cmp(&b) {
                std::cmp::Ordering::Less => "<",
                std::cmp::Ordering::Equal => "=",
                std::cmp::Ordering::Greater => ">",
            };
            return Exchange::next(format!("Query: {i} {j}"), comparison);
        }

        if let Some(caps) = util::last_match(ANSWER, text) {
            let (Some(min_guess), Some(max_guess)) =
                (util::group_i64(&caps, 1), util::group_i64(&caps, 2))
            else {
                return Exchange::invalid("Invalid position format");
            };
            let n = self.array.len();
            if !self.in_range(min_guess) || !self.in_range(max_guess) {
                return Exchange::next(
                    "Invalid",
                    format!("Positions must be between 1 and {n}"),
                );
            }

            let correct =
                min_guess == self.min_pos && max_guess == self.max_pos;
            let outcome = if correct { Outcome::Win } else { Outcome::Continue };
            let verdict = if correct { "1" } else { "0" };
            return Exchange::new(
                format!("Answer: {min_guess} {max_guess}"),
                verdict,
                outcome,
            );
        }

        Exchange::invalid(
            "Invalid format. Use 'My Query: i j' or 'My Answer: i j'",
        )
    }

    fn is_complete(&self, result: &str) -> bool {
        result
            .strip_prefix("Answer: ")
            .and_then(util::ints)
            .map(|pair| match pair.as_slice() {
                [min_guess, max_guess] => {
                    *min_guess == self.min_pos && *max_guess == self.max_pos
                },
                _ => false,
            })
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
            .filter(|turn| turn.result.contains("Query"))
            .map(|turn| {
                let positions =
                    turn.result.split(": ").nth(1).unwrap_or_default();
                format!("Compare {positions} -> {}", turn.feedback)
            })
            .collect();
        let mut detail = format!("Queries made:\n{}", queries.join("\n"));

        let Some(answer) = turns
            .iter()
            .rev()
            .find(|turn| turn.result.contains("Answer"))
        else {
            detail.push_str("\nNo final answer submitted");
            return (false, detail);
        };

        let success = answer.feedback == "1";
        let positions = answer.result.split(": ").nth(1).unwrap_or_default();
        detail.push_str(&format!(
            "\nFinal answer: {positions}\nResult: {}\nTotal queries: {}",
            if success { "Correct" } else { "Incorrect" },
            queries.len(),
        ));
        (success, detail)
    }
}

/* TESTS */
