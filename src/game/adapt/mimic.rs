//! # Mimic Hunt Game Module
//!
//! One object in a lineup is a mimic wearing a digit disguise. Each removal
//! query reports the shuffled survivors with the mimic rendered as its
//! current disguise; a disguise that has persisted two undisturbed turns
//! must change before the next report. The answer names the mimic's
//! original position.

use anyhow::Result;
use rand::Rng as _;
use rand::seq::SliceRandom;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Outcome;
use crate::game::Rng;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

use std::collections::HashSet;

/* GRAMMAR */

const REMOVE: &str = r"My Query:\s*-\s*(\d+)((?:\s+\d+)*)";
const ANSWER: &str = r"My Answer:\s*(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    objects: Vec<i64>,
    mimic_pos: i64,
    disguise: i64,
    disguise_age: u32,
    rng: Rng,
}

impl Session {
    pub fn new(question: &Question, rng: Rng) -> Result<Self> {
        let objects = question.int_list_field("list")?;
        let mimic_pos = question.i64_field("answer")?;
        let disguise = objects
            .get(mimic_pos as usize - 1)
            .copied()
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Question {} is malformed: mimic position out of range.",
                    question.question_id,
                )
            })?;
        Ok(Self {
            objects,
            mimic_pos,
            disguise,
            disguise_age: 1,
            rng,
        })
    }

    /// The disguise may persist one extra turn at most; after two
    /// undisturbed turns it must become a different digit.
    fn transform(&mut self) {
        if self.disguise_age >= 2 {
            let mut next = self.rng.random_range(1..=9);
            while next == self.disguise {
                next = self.rng.random_range(1..=9);
            }
            self.disguise = next;
            self.disguise_age = 1;
        } else {
            self.disguise_age += 1;
        }
    }

    fn removal(&mut self, positions: Vec<i64>) -> Exchange {
        let removed: HashSet<i64> = positions.iter().copied().collect();
        let mut survivors = Vec::new();
        for (i, &object) in self.objects.iter().enumerate() {
            let position = i as i64 + 1;
            if removed.contains(&position) {
                continue;
            }
            if position == self.mimic_pos {
                survivors.push(self.disguise);
            } else {
                survivors.push(object);
            }
        }
        survivors.shuffle(&mut self.rng);

        if !removed.contains(&self.mimic_pos) {
            self.transform();
        }

        Exchange::next(
            format!("Remove: {}", util::join(&positions)),
            format!("{survivors:?}"),
        )
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if let Some(caps) = util::last_match(REMOVE, text) {
            let (Some(k), Some(positions)) =
                (util::group_i64(&caps, 1), util::ints(&caps[2]))
            else {
                return Exchange::invalid("Invalid");
            };
            if k > 0 {
                if positions.len() as i64 != k {
                    return Exchange::invalid("Invalid");
                }
                let bound = self.objects.len() as i64;
                if !positions.iter().all(|&p| 1 <= p && p <= bound) {
                    return Exchange::invalid("Invalid");
                }
                let distinct: HashSet<i64> =
                    positions.iter().copied().collect();
                if distinct.len() != positions.len() {
                    return Exchange::invalid("Invalid");
                }

                return self.removal(positions);
            }
        }

        if let Some(caps) = util::last_match(ANSWER, text) {
            let Some(guess) = util::group_i64(&caps, 1) else {
                return Exchange::invalid("Invalid");
            };
            if !(1 <= guess && guess <= self.objects.len() as i64) {
                return Exchange::invalid("Invalid");
            }

            let correct = guess == self.mimic_pos;
            let outcome = if correct { Outcome::Win } else { Outcome::Continue };
            let verdict = if correct { "Correct" } else { "Incorrect" };
            return Exchange::new(format!("Answer: {guess}"), verdict, outcome);
        }

        Exchange::invalid("Invalid")
    }

    fn is_complete(&self, result: &str) -> bool {
        result
            .strip_prefix("Answer: ")
            .and_then(|g| g.parse::<i64>().ok())
            .map(|guess| guess == self.mimic_pos)
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

        let removals = turns
            .iter()
            .filter(|turn| turn.result.contains("Remove:"))
            .count();
        let answers = turns
            .iter()
            .filter(|turn| turn.result.contains("Answer:"))
            .count();
        let success = last.feedback == "Correct";
        let guessed = last.result.split(": ").nth(1).unwrap_or_default();
        let detail = format!(
            "Removals: {removals}, Answer attempts: {answers}, \
            Final position guess: {guessed}",
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
            r#"{"question_id": 15, "title": "MimicHunt",
                "list": [3, 1, 4, 1, 5], "answer": 3}"#,
        )
        .unwrap();
        Session::new(&question, util::session_rng(15)).unwrap()
    }

    #[test]
    fn removal_reports_the_shuffled_survivors() {
        let mut s = session();
        let x = s.parse_response("My Query: - 2 1 4");
        assert_eq!(x.result, "Remove: 1 4");
        assert_eq!(x.outcome, Outcome::Continue);

        let survivors = util::csv_ints(
            x.feedback.trim_start_matches('[').trim_end_matches(']'),
        )
        .unwrap();
        let mut sorted = survivors.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, vec![1, 4, 5]);
    }

    #[test]
    fn disguise_never_persists_three_undisturbed_turns() {
        let mut s = session();
        let mut ages_seen = Vec::new();
        let mut previous = s.disguise;
        for _ in 0..20 {
            s.parse_response("My Query: - 1 2");
            ages_seen.push(s.disguise_age);
            if s.disguise != previous {
                previous = s.disguise;
            }
        }
        assert!(ages_seen.iter().all(|&age| age <= 2));
    }

    #[test]
    fn count_mismatch_retires() {
        let mut s = session();
        let x = s.parse_response("My Query: - 3 1 4");
        assert_eq!(x.outcome, Outcome::Invalid);
    }

    #[test]
    fn duplicate_positions_retire() {
        let mut s = session();
        let x = s.parse_response("My Query: - 2 1 1");
        assert_eq!(x.outcome, Outcome::Invalid);
    }

    #[test]
    fn original_position_is_the_accepted_answer() {
        let mut s = session();
        s.parse_response("My Query: - 1 1");
        let x = s.parse_response("My Answer: 3");
        assert_eq!(x.feedback, "Correct");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(s.is_complete("Answer: 3"));
    }
}
