//! # OR-Comparison Game Module
//!
//! A hidden integer list answers comparisons between the bitwise OR of two
//! index pairs. The goal is any index pair achieving the maximal XOR over
//! the list, judged by value rather than by position.

use anyhow::Result;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Outcome;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const QUERY: &str = r"My Query:\s*(\d+)\s+(\d+)\s+(\d+)\s+(\d+)";
const ANSWER: &str = r"My Answer:\s*(\d+)\s+(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    list: Vec<i64>,
    max_xor: i64,
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        let list = question.int_list_field("list")?;
        let pair = question.int_list_field("answer")?;
        let max_xor = match pair.as_slice() {
            [i, j] => {
                let (i, j) = (*i as usize, *j as usize);
                if i >= list.len() || j >= list.len() {
                    anyhow::bail!(
                        "Question {} is malformed: 'answer' indices out of \
                        range.",
                        question.question_id,
                    );
                }
                list[i] ^ list[j]
            },
            _ => anyhow::bail!(
                "Question {} is malformed: 'answer' is not an index pair.",
                question.question_id,
            ),
        };
        Ok(Self { list, max_xor })
    }

    fn in_range(&self, index: i64) -> bool {
        0 <= index && (index as usize) < self.list.len()
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if let Some(caps) = util::last_match(QUERY, text) {
            let indices: Vec<i64> = (1..=4)
                .filter_map(|i| util::group_i64(&caps, i))
                .collect();
            let [a, b, c, d] = indices.as_slice() else {
                return Exchange::next(
                    "Invalid",
                    "All positions must be valid indices",
                );
            };
            if ![a, b, c, d].iter().all(|&&i| self.in_range(i)) {
                return Exchange::next(
                    "Invalid",
                    "All positions must be valid indices",
                );
            }

            let left = self.list[*a as usize] | self.list[*b as usize];
            let right = self.list[*c as usize] | self.list[*d as usize];
            let comparison = match left.cmp(&right) {
                std::cmp::Ordering::Less => "<",
                std::cmp::Ordering::Equal => "=",
                std::cmp::Ordering::Greater => ">",
            };
            return Exchange::next(format!("{a} {b} {c} {d}"), comparison);
        }

        if let Some(caps) = util::last_match(ANSWER, text) {
            let (Some(i), Some(j)) =
                (util::group_i64(&caps, 1), util::group_i64(&caps, 2))
            else {
                return Exchange::next(
                    "Invalid",
                    "Positions must be valid indices",
                );
            };
            if !self.in_range(i) || !self.in_range(j) {
                return Exchange::next(
                    "Invalid",
                    "Positions must be valid indices",
                );
            }

            let correct =
                self.list[i as usize] ^ self.list[j as usize] == self.max_xor;
            let outcome = if correct { Outcome::Win } else { Outcome::Continue };
            let verdict = if correct { "Correct" } else { "Incorrect" };
            return Exchange::new(format!("{i} {j}"), verdict, outcome);
        }

        Exchange::new(
            "Invalid",
            "Your response must be either 'My Query: a b c d' or \
            'My Answer: i j'",
            Outcome::Continue,
        )
    }

    fn is_complete(&self, result: &str) -> bool {
        util::ints(result)
            .and_then(|pair| match pair.as_slice() {
                [i, j] if self.in_range(*i) && self.in_range(*j) => Some(
                    self.list[*i as usize] ^ self.list[*j as usize]
                        == self.max_xor,
                ),
                _ => None,
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
        // Maximal XOR is 1 ^ 6 = 7, achieved by indices (0, 2).
        let question: Question = serde_json::from_str(
            r#"{"question_id": 7, "title": "BitCompare",
                "list": [1, 4, 6, 5], "answer": [0, 2]}"#,
        )
        .unwrap();
        Session::new(&question).unwrap()
    }

    #[test]
    fn queries_compare_bitwise_ors() {
        let mut s = session();
        // (1|4)=5 vs (6|5)=7.
        let x = s.parse_response("My Query: 0 1 2 3");
        assert_eq!(x.feedback, "<");
        assert_eq!(x.result, "0 1 2 3");

        let x = s.parse_response("My Query: 2 3 0 1");
        assert_eq!(x.feedback, ">");
    }

    #[test]
    fn any_pair_with_maximal_xor_wins() {
        let mut s = session();
        let x = s.parse_response("My Answer: 2 0");
        assert_eq!(x.feedback, "Correct");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(s.is_complete("2 0"));
    }

    #[test]
    fn suboptimal_pair_continues() {
        let mut s = session();
        let x = s.parse_response("My Answer: 0 1");
        assert_eq!(x.feedback, "Incorrect");
        assert_eq!(x.outcome, Outcome::Continue);
    }

    #[test]
    fn out_of_range_indices_burn_the_turn() {
        let mut s = session();
        let x = s.parse_response("My Query: 0 1 2 9");
        assert_eq!(x.result, "Invalid");
        assert_eq!(x.outcome, Outcome::Continue);
    }
}
