//! # Train Pursuit Game Module
//!
//! A train hides among n circular stations. Range queries reveal whether it
//! is currently inside `[l, r]`, after which it advances k stations; a
//! wrong station guess also lets it move.

use anyhow::Result;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const QUERY: &str = r"My Query:\s*(\d+)\s+(\d+)";
const ANSWER: &str = r"My Answer:\s*(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    position: i64,
    stations: i64,
    step: i64,
    answered: bool,
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        Ok(Self {
            position: question.i64_field("answer")?,
            stations: question.i64_field("n")?,
            step: question.i64_field("k")?,
            answered: false,
        })
    }

    fn advance(&mut self) {
        self.position =
            (self.position + self.step - 1).rem_euclid(self.stations) + 1;
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
            if !(1 <= l && l <= r && r <= self.stations) {
                return Exchange::invalid("Invalid");
            }

            let inside = l <= self.position && self.position <= r;
            self.answered = false;
            self.advance();
            return Exchange::next(
                format!("Query: {l} {r}"),
                if inside { "Yes" } else { "No" },
            );
        }

        if let Some(caps) = util::last_match(ANSWER, text) {
            let Some(guess) = util::group_i64(&caps, 1) else {
                return Exchange::invalid("Invalid");
            };
            if !(1 <= guess && guess <= self.stations) {
                return Exchange::invalid("Invalid");
            }

            self.answered = true;
            if guess == self.position {
                return Exchange::win(format!("Answer: {guess}"), "Correct");
            }
            self.advance();
            return Exchange::next(format!("Answer: {guess}"), "Incorrect");
        }

        Exchange::invalid("Invalid")
    }

    fn is_complete(&self, result: &str) -> bool {
        self.answered
            && result
                .strip_prefix("Answer: ")
                .and_then(|g| g.parse::<i64>().ok())
                .map(|guess| guess == self.position)
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
        if !last.result.contains("Answer:") {
            return (
                false,
                "Game did not end with an answer submission".into(),
            );
        }

        let queries = turns
            .iter()
            .filter(|turn| turn.result.contains("Query:"))
            .count();
        let answers = turns
            .iter()
            .filter(|turn| turn.result.contains("Answer:"))
            .count();
        let success = last.feedback == "Correct";
        let submitted = last.result.split(": ").nth(1).unwrap_or_default();
        let detail = format!(
            "Queries used: {queries}, Answer attempts: {answers}, \
            Final answer: {submitted}",
        );
        (success, detail)
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;
    use crate::game::Outcome;

    fn session(start: i64, n: i64, k: i64) -> Session {
        let question: Question = serde_json::from_str(&format!(
            r#"{{"question_id": 14, "title": "TrainPursuit",
                "answer": {start}, "n": {n}, "k": {k}}}"#,
        ))
        .unwrap();
        Session::new(&question).unwrap()
    }

    #[test]
    fn queries_answer_then_move_the_train() {
        let mut s = session(3, 10, 4);
        let x = s.parse_response("My Query: 1 5");
        assert_eq!(x.feedback, "Yes");
        assert_eq!(s.position, 7);

        let x = s.parse_response("My Query: 1 5");
        assert_eq!(x.feedback, "No");
        assert_eq!(s.position, 1);
    }

    #[test]
    fn movement_wraps_around_the_circle() {
        let mut s = session(9, 10, 4);
        s.parse_response("My Query: 1 1");
        assert_eq!(s.position, 3);
    }

    #[test]
    fn correct_guess_ends_the_pursuit() {
        let mut s = session(3, 10, 4);
        let x = s.parse_response("My Answer: 3");
        assert_eq!(x.feedback, "Correct");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(s.is_complete("Answer: 3"));
    }

    #[test]
    fn wrong_guess_lets_the_train_move() {
        let mut s = session(3, 10, 4);
        let x = s.parse_response("My Answer: 4");
        assert_eq!(x.feedback, "Incorrect");
        assert_eq!(x.outcome, Outcome::Continue);
        assert_eq!(s.position, 7);
    }

    #[test]
    fn malformed_range_retires() {
        let mut s = session(3, 10, 4);
        let x = s.parse_response("My Query: 5 2");
        assert_eq!(x.outcome, Outcome::Invalid);
    }
}
