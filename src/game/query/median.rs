//! # Median-Pair Game Module
//!
//! A hidden list answers queries for the two middle elements of any even
//! subsequence of at least four distinct positions. The goal is a hidden
//! unordered pair of positions.

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

const QUERY: &str = r"My Query:\s*(\d+)((?:\s+\d+)+)";
const ANSWER: &str = r"My Answer:\s*(\d+)\s+(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    list: Vec<i64>,
    answer: (i64, i64),
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        let mut pair = question.int_list_field("answer")?;
        pair.sort_unstable();
        let answer = match pair.as_slice() {
            [i, j] => (*i, *j),
            _ => anyhow::bail!(
                "Question {} is malformed: 'answer' is not a position pair.",
                question.question_id,
            ),
        };
        Ok(Self {
            list: question.int_list_field("list")?,
            answer,
        })
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if let Some(caps) = util::last_match(QUERY, text) {
            let (Some(k), Some(positions)) =
                (util::group_i64(&caps, 1), util::ints(&caps[2]))
            else {
                return Exchange::next("Invalid", "Invalid query");
            };
            let n = self.list.len() as i64;
            if k != positions.len() as i64 {
                return Exchange::next(
                    "Invalid",
                    "Length k must match the number of positions",
                );
            }
            if k % 2 != 0 || k < 4 || k > n {
                return Exchange::invalid("Invalid subsequence length");
            }
            let distinct: HashSet<i64> = positions.iter().copied().collect();
            if distinct.len() != positions.len() {
                return Exchange::next(
                    "Invalid",
                    "Positions must be distinct",
                );
            }
            if !positions.iter().all(|&p| 1 <= p && p <= n) {
                return Exchange::invalid("Invalid position indices");
            }

            let mut subsequence: Vec<i64> = positions
                .iter()
                .map(|&p| self.list[p as usize - 1])
                .collect();
            subsequence.sort_unstable();
            let mid = k as usize / 2;
            return Exchange::next(
                format!("{k} {}", util::join(&positions)),
                format!("{} {}", subsequence[mid - 1], subsequence[mid]),
            );
        }

        if let Some(caps) = util::last_match(ANSWER, text) {
            let (Some(i), Some(j)) =
                (util::group_i64(&caps, 1), util::group_i64(&caps, 2))
            else {
                return Exchange::next("Invalid", "Invalid answer");
            };
            let n = self.list.len() as i64;
            if !(1 <= i && i <= n && 1 <= j && j <= n) {
                return Exchange::next(
                    "Invalid",
                    "Position indices must be valid",
                );
            }

            let correct = (i.min(j), i.max(j)) == self.answer;
            let outcome = if correct { Outcome::Win } else { Outcome::Continue };
            let verdict = if correct { "Correct" } else { "Incorrect" };
            return Exchange::new(format!("{i} {j}"), verdict, outcome);
        }

        Exchange::new(
            "Invalid",
            "Your response must be either 'My Query: k x1...xk' or \
            'My Answer: i j'",
            Outcome::Continue,
        )
    }

    fn is_complete(&self, result: &str) -> bool {
        util::ints(result)
            .map(|pair| match pair.as_slice() {
                [i, j] => (*i.min(j), *i.max(j)) == self.answer,
                _ => false,
            })
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
        if last.feedback != "Correct" && last.feedback != "Incorrect" {
            return (
                false,
                "Game did not end with an answer submission".into(),
            );
        }

        let success = last.feedback == "Correct";
        (success, format!("Final answer: positions {}", last.result))
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;

    fn session() -> Session {
        let question: Question = serde_json::from_str(
            r#"{"question_id": 8, "title": "MedianQuery",
                "list": [9, 2, 7, 4, 5, 1], "answer": [5, 3]}"#,
        )
        .unwrap();
        Session::new(&question).unwrap()
    }

    #[test]
    fn queries_return_the_two_middle_elements() {
        let mut s = session();
        // Values at 1 2 3 4 are 9 2 7 4; sorted 2 4 7 9.
        let x = s.parse_response("My Query: 4 1 2 3 4");
        assert_eq!(x.result, "4 1 2 3 4");
        assert_eq!(x.feedback, "4 7");
        assert_eq!(x.outcome, Outcome::Continue);
    }

    #[test]
    fn odd_or_short_subsequences_retire() {
        let mut s = session();
        let x = s.parse_response("My Query: 3 1 2 3");
        assert_eq!(x.outcome, Outcome::Invalid);

        let mut s = session();
        let x = s.parse_response("My Query: 2 1 2");
        assert_eq!(x.outcome, Outcome::Invalid);
    }

    #[test]
    fn mismatched_count_burns_the_turn() {
        let mut s = session();
        let x = s.parse_response("My Query: 4 1 2 3");
        assert_eq!(x.outcome, Outcome::Continue);
        assert!(x.feedback.contains("match"));
    }

    #[test]
    fn answer_is_order_insensitive() {
        let mut s = session();
        let x = s.parse_response("My Answer: 5 3");
        assert_eq!(x.feedback, "Correct");
        assert_eq!(x.outcome, Outcome::Win);

        let mut s = session();
        let x = s.parse_response("My Answer: 3 5");
        assert_eq!(x.feedback, "Correct");
        assert!(s.is_complete("3 5"));
    }
}
