//! # Impostor-Finding Game Module
//!
//! A hidden crew mask marks each player as impostor or crewmate. Querying
//! any three players reveals only which faction holds the majority among
//! them; the final answer must name the impostor set exactly.

use anyhow::Result;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Outcome;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

use std::collections::BTreeSet;

/* GRAMMAR */

const QUERY: &str = r"My Query:\s*(\d+),(\d+),(\d+)";
const ANSWER: &str = r"My Answer:\s*((?:\d+,)*\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    impostors: BTreeSet<i64>,
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        let mask = question.str_field("answer")?;
        let impostors = mask
            .chars()
            .enumerate()
            .filter(|&(_, c)| c == '0')
            .map(|(i, _)| i as i64 + 1)
            .collect();
        Ok(Self { impostors })
    }

    fn majority(&self, players: &[i64]) -> &'static str {
        let impostors = players
            .iter()
            .filter(|p| self.impostors.contains(p))
            .count();
        let crew = players.len() - impostors;
        if impostors > crew { "0" } else { "1" }
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if let Some(caps) = util::last_match(QUERY, text) {
            let mut players: Vec<i64> = (1..=3)
                .filter_map(|i| util::group_i64(&caps, i))
                .collect();
            players.sort_unstable();
            if players.len() != 3
                || players.windows(2).any(|w| w[0] == w[1])
            {
                return Exchange::new("Invalid", "-1", Outcome::Continue);
            }

            let listed = players
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(",");
            return Exchange::next(
                format!("Query:{listed}"),
                self.majority(&players),
            );
        }

        if let Some(caps) = util::last_match(ANSWER, text) {
            let Some(mut indices) = util::csv_ints(&caps[1]) else {
                return Exchange::new("Invalid", "-1", Outcome::Continue);
            };
            indices.sort_unstable();

            let listed = indices
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(",");
            let submitted: BTreeSet<i64> = indices.into_iter().collect();
            let verdict = if submitted == self.impostors { "1" } else { "0" };
            let outcome = if submitted == self.impostors {
                Outcome::Win
            } else {
                Outcome::Continue
            };
            return Exchange::new(format!("Answer:{listed}"), verdict, outcome);
        }

        Exchange::invalid("Invalid format")
    }

    fn is_complete(&self, result: &str) -> bool {
        let Some(listed) = result.strip_prefix("Answer:") else {
            return false;
        };
        util::csv_ints(listed)
            .map(|indices| {
                indices.into_iter().collect::<BTreeSet<i64>>()
                    == self.impostors
            })
            .unwrap_or(false)
    }
}

/* EVALUATION */

pub struct Evaluator;

impl Evaluate for Evaluator {
    fn evaluate_game(&self, _: &Question, turns: &[Turn]) -> (bool, String) {
        let Some(last) = turns
            .iter()
            .rev()
            .find(|turn| turn.result.starts_with("Answer:"))
        else {
            return (false, "No answer submitted".into());
        };

        let success = last.feedback == "1";
        (success, format!("Final answer: {}", last.result))
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;

    fn session(mask: &str) -> Session {
        let question: Question = serde_json::from_str(&format!(
            r#"{{"question_id": 4, "title": "FindTheImpostors",
                "answer": "{mask}"}}"#,
        ))
        .unwrap();
        Session::new(&question).unwrap()
    }

    #[test]
    fn impostor_majority_reports_zero() {
        // Impostors at 1, 3, 5.
        let mut s = session("010101");
        let x = s.parse_response("My Query: 3,5,1");
        assert_eq!(x.result, "Query:1,3,5");
        assert_eq!(x.feedback, "0");
        assert_eq!(x.outcome, Outcome::Continue);

        let x = s.parse_response("My Query: 2,4,1");
        assert_eq!(x.feedback, "1");
    }

    #[test]
    fn exact_answer_wins_in_any_order() {
        let mut s = session("010101");
        let x = s.parse_response("My Answer: 5,3,1");
        assert_eq!(x.result, "Answer:1,3,5");
        assert_eq!(x.feedback, "1");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(s.is_complete(&x.result));
    }

    #[test]
    fn wrong_answer_continues_with_zero() {
        let mut s = session("010101");
        let x = s.parse_response("My Answer: 1,3");
        assert_eq!(x.feedback, "0");
        assert_eq!(x.outcome, Outcome::Continue);
    }

    #[test]
    fn duplicate_query_players_burn_the_turn() {
        let mut s = session("010101");
        let x = s.parse_response("My Query: 2,2,3");
        assert_eq!(x.result, "Invalid");
        assert_eq!(x.feedback, "-1");
        assert_eq!(x.outcome, Outcome::Continue);
    }

    #[test]
    fn unparseable_response_retires() {
        let mut s = session("010101");
        let x = s.parse_response("who is the impostor?");
        assert_eq!(x.outcome, Outcome::Invalid);
    }
}
