//! # Permutation Discovery Game Module
//!
//! A hidden permutation `p` repeatedly rewrites a visible sequence `q`
//! through `q'[i] = q[p[i]]`. Each query reveals one entry of the current
//! `q` and then advances it one application; the answer must equal `p`.

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

const QUERY: &str = r"My Query:\s*(\d+)";
const ANSWER: &str = r"My Answer:\s*([\d\s]+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    hidden: Vec<i64>,
    visible: Vec<i64>,
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        let hidden = question.int_list_field("p")?;
        let visible = question.int_list_field("q")?;
        if hidden.len() != visible.len() {
            anyhow::bail!(
                "Question {} is malformed: 'p' and 'q' differ in length.",
                question.question_id,
            );
        }
        Ok(Self { hidden, visible })
    }

    fn advance(&mut self) {
        let next: Vec<i64> = self
            .hidden
            .iter()
            .map(|&p| self.visible[p as usize - 1])
            .collect();
        self.visible = next;
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if let Some(caps) = util::last_match(QUERY, text) {
            let Some(position) = util::group_i64(&caps, 1) else {
                return Exchange::invalid("Invalid");
            };
            if !(1 <= position && position <= self.hidden.len() as i64) {
                return Exchange::invalid("Invalid");
            }

            let value = self.visible[position as usize - 1];
            self.advance();
            return Exchange::next(
                format!("Query: {position}"),
                value.to_string(),
            );
        }

        if let Some(caps) = util::last_match(ANSWER, text) {
            let Some(guess) = util::ints(&caps[1]) else {
                return Exchange::invalid("Invalid");
            };
            let n = self.hidden.len() as i64;
            if guess.len() as i64 != n {
                return Exchange::invalid("Invalid");
            }
            if !guess.iter().all(|&x| 1 <= x && x <= n) {
                return Exchange::invalid("Invalid");
            }
            let distinct: HashSet<i64> = guess.iter().copied().collect();
            if distinct.len() as i64 != n {
                return Exchange::invalid("Invalid");
            }

            let correct = guess == self.hidden;
            let outcome = if correct { Outcome::Win } else { Outcome::Continue };
            let verdict = if correct { "Correct" } else { "Incorrect" };
            return Exchange::new(
                format!("Answer: {}", util::join(&guess)),
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
            .map(|guess| guess == self.hidden)
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
        let success = last.feedback == "Correct";
        let submitted = last.result.split(": ").nth(1).unwrap_or_default();
        let detail = format!(
            "Queries used: {queries}, Final permutation: {submitted}",
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
            r#"{"question_id": 17, "title": "PermutationDiscovery",
                "p": [2, 3, 1], "q": [10, 20, 30]}"#,
        )
        .unwrap();
        Session::new(&question).unwrap()
    }

    #[test]
    fn queries_reveal_then_advance_the_sequence() {
        let mut s = session();
        let x = s.parse_response("My Query: 1");
        assert_eq!(x.feedback, "10");
        // q' = [q[2], q[3], q[1]] = [20, 30, 10].
        assert_eq!(s.visible, vec![20, 30, 10]);

        let x = s.parse_response("My Query: 2");
        assert_eq!(x.feedback, "30");
        assert_eq!(s.visible, vec![30, 10, 20]);
    }

    #[test]
    fn the_hidden_permutation_is_the_accepted_answer() {
        let mut s = session();
        let x = s.parse_response("My Answer: 2 3 1");
        assert_eq!(x.feedback, "Correct");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(s.is_complete("Answer: 2 3 1"));
    }

    #[test]
    fn non_permutation_answers_retire() {
        let mut s = session();
        let x = s.parse_response("My Answer: 2 2 1");
        assert_eq!(x.outcome, Outcome::Invalid);

        let mut s = session();
        let x = s.parse_response("My Answer: 2 3");
        assert_eq!(x.outcome, Outcome::Invalid);
    }
}
