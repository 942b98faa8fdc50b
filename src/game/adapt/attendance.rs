//! # Attendance Check Game Module
//!
//! A class roster hides one absent student. Range queries report how many
//! students in `[l, r]` raised their hands, but the class lies under a
//! bounded-window discipline: never three honest answers in a row, never
//! three lies in a row. A lie under-reports by one when everyone queried is
//! present, and over-reports by one otherwise.

use anyhow::Result;
use rand::Rng as _;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Outcome;
use crate::game::Rng;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const QUERY: &str = r"My Query:\s*(\d+)\s+(\d+)";
const ANSWER: &str = r"My Answer:\s*(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    roster: Vec<i64>,
    honesty: Vec<bool>,
    rng: Rng,
}

impl Session {
    pub fn new(question: &Question, rng: Rng) -> Result<Self> {
        Ok(Self {
            roster: question.int_list_field("answer")?,
            honesty: Vec::new(),
            rng,
        })
    }

    /// Chooses this turn's honesty so that no three consecutive answers
    /// share it.
    fn lies_this_turn(&mut self) -> bool {
        match self.honesty.as_slice() {
            [.., a, b] if *a && *b => true,
            [.., a, b] if !*a && !*b => false,
            _ => self.rng.random_bool(0.5),
        }
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if let Some(caps) = util::last_match(QUERY, text) {
            let (Some(l), Some(r)) =
                (util::group_i64(&caps, 1), util::group_i64(&caps, 2))
            else {
                return Exchange::invalid("Invalid number format in query");
            };
            if !(1 <= l && l <= r && r <= self.roster.len() as i64) {
                return Exchange::invalid("Invalid range");
            }

            let present: i64 =
                self.roster[l as usize - 1..r as usize].iter().sum();
            let expected = r - l + 1;

            let lie = self.lies_this_turn();
            let raised = if !lie {
                present
            } else if present == expected {
                present - 1
            } else {
                present + 1
            };

            self.honesty.push(!lie);
            if self.honesty.len() > 2 {
                self.honesty.remove(0);
            }

            return Exchange::next(
                format!("Query:{l},{r}"),
                raised.to_string(),
            );
        }

        if let Some(caps) = util::last_match(ANSWER, text) {
            let Some(guess) = util::group_i64(&caps, 1) else {
                return Exchange::invalid("Invalid number format in answer");
            };
            if !(1 <= guess && guess <= self.roster.len() as i64) {
                return Exchange::invalid("Invalid student number");
            }

            let absent = self.roster[guess as usize - 1] == 0;
            let outcome = if absent { Outcome::Win } else { Outcome::Continue };
            let verdict = if absent { "Correct" } else { "Incorrect" };
            return Exchange::new(format!("Answer:{guess}"), verdict, outcome);
        }

        Exchange::invalid(
            "Invalid format. Use 'My Query: l r' or 'My Answer: a'",
        )
    }

    fn is_complete(&self, result: &str) -> bool {
        result
            .strip_prefix("Answer:")
            .and_then(|g| g.trim().parse::<i64>().ok())
            .map(|guess| {
                self.roster
                    .get(guess as usize - 1)
                    .map(|&status| status == 0)
                    .unwrap_or(false)
            })
            .unwrap_or(false)
    }
}

/* EVALUATION */

pub struct Evaluator;

impl Evaluate for Evaluator {
    fn evaluate_game(
        &self,
        question: &Question,
        turns: &[Turn],
    ) -> (bool, String) {
        if turns.is_empty() {
            return (false, "No turns played".into());
        }

        let Ok(roster) = question.int_list_field("answer") else {
            return (false, "Question has no roster".into());
        };
        let Some(absent) = roster.iter().position(|&status| status == 0)
        else {
            return (false, "Question has no absent student".into());
        };
        let absent = absent as i64 + 1;

        let Some(guess) = turns.iter().rev().find_map(|turn| {
            turn.result
                .strip_prefix("Answer:")
                .and_then(|g| g.trim().parse::<i64>().ok())
        }) else {
            return (false, "No answer submitted".into());
        };

        let success = guess == absent;
        let detail = format!(
            "Absent student: {absent}, Final guess: {guess}, Result: {}",
            if success { "Correct" } else { "Incorrect" },
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
            r#"{"question_id": 20, "title": "AttendanceCheck",
                "answer": [1, 1, 0, 1, 1]}"#,
        )
        .unwrap();
        Session::new(&question, util::session_rng(20)).unwrap()
    }

    #[test]
    fn reports_are_off_by_at_most_one() {
        let mut s = session();
        for _ in 0..30 {
            let x = s.parse_response("My Query: 1 5");
            let raised: i64 = x.feedback.parse().unwrap();
            assert!((raised - 4).abs() <= 1);
        }
    }

    #[test]
    fn no_three_consecutive_answers_share_honesty() {
        let mut s = session();
        let mut streak = 0;
        let mut last_honest = None;
        for _ in 0..60 {
            let x = s.parse_response("My Query: 1 5");
            let honest = x.feedback == "4";
            if last_honest == Some(honest) {
                streak += 1;
            } else {
                streak = 1;
            }
            assert!(streak <= 2);
            last_honest = Some(honest);
        }
    }

    #[test]
    fn lies_under_report_only_when_everyone_is_present() {
        let mut s = session();
        for _ in 0..30 {
            // Students 1..2 are all present; a lie must under-report.
            let x = s.parse_response("My Query: 1 2");
            let raised: i64 = x.feedback.parse().unwrap();
            assert!(raised == 2 || raised == 1);
        }
    }

    #[test]
    fn naming_the_absent_student_wins() {
        let mut s = session();
        let x = s.parse_response("My Answer: 3");
        assert_eq!(x.feedback, "Correct");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(s.is_complete("Answer:3"));

        let mut s = session();
        let x = s.parse_response("My Answer: 2");
        assert_eq!(x.feedback, "Incorrect");
        assert_eq!(x.outcome, Outcome::Continue);
    }

    #[test]
    fn malformed_range_retires() {
        let mut s = session();
        let x = s.parse_response("My Query: 4 2");
        assert_eq!(x.outcome, Outcome::Invalid);
    }
}
