//! # Drifting Password Game Module
//!
//! The solver guesses a password that mutates on every wrong guess: the old
//! password and the guess are combined digitwise in base k (sum mod k per
//! digit, left-padded to equal length), and the combined value is remapped
//! into the legal range. Correctness is judged against the password as it
//! was before the update.

use anyhow::Result;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const GUESS: &str = r"My guess:\s*(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    current: i64,
    previous: i64,
    base: i64,
    min_value: i64,
    max_value: i64,
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        let answer = question.i64_field("answer")?;
        let base = question.i64_field("k")?;
        if base < 2 {
            anyhow::bail!(
                "Question {} is malformed: base 'k' must be at least 2.",
                question.question_id,
            );
        }
        Ok(Self {
            current: answer,
            previous: answer,
            base,
            min_value: question.i64_field("min_value")?,
            max_value: question.i64_field("max_value")?,
        })
    }

    /// Digitwise base-k combination of the current password and the guess,
    /// remapped into `[min_value, max_value]`.
    fn drift(&self, x: i64, y: i64) -> i64 {
        let mut xs = to_base(x, self.base);
        let mut ys = to_base(y, self.base);
        while xs.len() < ys.len() {
            xs.insert(0, 0);
        }
        while ys.len() < xs.len() {
            ys.insert(0, 0);
        }

        let combined: Vec<i64> = xs
            .iter()
            .zip(&ys)
            .map(|(a, b)| (a + b) % self.base)
            .collect();
        let value = from_base(&combined, self.base);

        let range = self.max_value - self.min_value + 1;
        value.rem_euclid(range) + self.min_value
    }
}

fn to_base(mut value: i64, base: i64) -> Vec<i64> {
    if value == 0 {
        return vec![0];
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.insert(0, value % base);
        value /= base;
    }
    digits
}

fn from_base(digits: &[i64], base: i64) -> i64 {
    digits.iter().fold(0, |acc, d| acc * base + d)
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        let Some(caps) = util::last_match(GUESS, text) else {
            return Exchange::invalid("Invalid");
        };
        let Some(guess) = util::group_i64(&caps, 1) else {
            return Exchange::invalid("Invalid");
        };
        if guess < self.min_value || guess > self.max_value {
            return Exchange::invalid("Invalid");
        }

        self.previous = self.current;
        if guess == self.current {
            return Exchange::win(format!("Guess: {guess}"), "Correct");
        }

        self.current = self.drift(self.current, guess);
        Exchange::next(format!("Guess: {guess}"), "Incorrect")
    }

    fn is_complete(&self, result: &str) -> bool {
        result
            .strip_prefix("Guess: ")
            .and_then(|g| g.parse::<i64>().ok())
            .map(|guess| guess == self.previous)
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

        // The password drifts during play, so the recorded feedback is the
        // source of truth rather than any re-simulation.
        let mut attempts = Vec::new();
        for turn in turns {
            let Some(guess) = turn.result.strip_prefix("Guess: ") else {
                continue;
            };
            attempts
                .push(format!("Guess {guess} -> Response {}", turn.feedback));
            if turn.feedback == "Correct" {
                let detail = format!(
                    "Successfully broke in with password: {guess}\n\
                    Total attempts: {}\n\
                    Password change sequence:\n{}",
                    attempts.len(),
                    attempts.join("\n"),
                );
                return (true, detail);
            }
        }

        let detail = format!(
            "Failed to break in after {} attempts\n\
            Password change sequence:\n{}",
            turns.len(),
            attempts.join("\n"),
        );
        (false, detail)
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;
    use crate::game::Outcome;

    fn session(answer: i64, k: i64, min: i64, max: i64) -> Session {
        let question: Question = serde_json::from_str(&format!(
            r#"{{"question_id": 2, "title": "RPD", "answer": {answer},
                "k": {k}, "min_value": {min}, "max_value": {max}}}"#,
        ))
        .unwrap();
        Session::new(&question).unwrap()
    }

    #[test]
    fn base_two_update_reduces_to_xor_mod_range() {
        let mut s = session(5, 2, 1, 5);
        let x = s.parse_response("My guess: 3");
        assert_eq!(x.feedback, "Incorrect");
        assert_eq!(x.outcome, Outcome::Continue);
        // (3 xor 5) mod 5 + 1 = 6 mod 5 + 1 = 2.
        assert_eq!(s.current, 2);

        let x = s.parse_response("My guess: 2");
        assert_eq!(x.feedback, "Correct");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(s.is_complete("Guess: 2"));
    }

    #[test]
    fn base_three_digits_combine_without_carry() {
        let mut s = session(7, 3, 1, 30);
        // 7 = 21_3, 5 = 12_3; digitwise sums mod 3 are 0 and 0.
        let x = s.parse_response("My guess: 5");
        assert_eq!(x.feedback, "Incorrect");
        assert_eq!(s.current, 1);
    }

    #[test]
    fn drifted_password_stays_in_range() {
        for guess in [1, 2, 4, 9, 10] {
            let mut s = session(7, 4, 1, 10);
            s.parse_response(&format!("My guess: {guess}"));
            assert!(s.current >= 1 && s.current <= 10);
        }
    }

    #[test]
    fn out_of_range_guess_retires() {
        let mut s = session(5, 2, 1, 5);
        let x = s.parse_response("My guess: 6");
        assert_eq!(x.outcome, Outcome::Invalid);
    }

    #[test]
    fn any_correct_feedback_satisfies_the_evaluator() {
        let question: Question = serde_json::from_str(
            r#"{"question_id": 2, "title": "RPD", "answer": 5,
                "k": 2, "min_value": 1, "max_value": 5}"#,
        )
        .unwrap();
        let turn = |result: &str, feedback: &str| Turn {
            round: 1,
            raw_output: String::new(),
            output: String::new(),
            result: result.into(),
            feedback: feedback.into(),
        };

        let (ok, _) = Evaluator.evaluate_game(
            &question,
            &[
                turn("Guess: 3", "Incorrect"),
                turn("Guess: 2", "Correct"),
            ],
        );
        assert!(ok);

        let (ok, _) = Evaluator
            .evaluate_game(&question, &[turn("Guess: 3", "Incorrect")]);
        assert!(!ok);
    }
}
