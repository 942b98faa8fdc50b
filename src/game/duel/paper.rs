//! # Paper Number Game Module
//!
//! Random numbers arrive one per turn and the solver writes each onto one
//! of a fixed set of papers, overwriting freely. The game is won the moment
//! every paper is filled and the sequence is non-decreasing; running out of
//! turns ends the game without a verdict.

use anyhow::Result;
use rand::Rng as _;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Rng;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const CHOICE: &str = r"My Choice:\s*(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    papers: Vec<Option<i64>>,
    max_number: i64,
    max_turns: u64,
    turn: u64,
    current: i64,
    rng: Rng,
}

impl Session {
    pub fn new(question: &Question, rng: Rng) -> Result<Self> {
        let papers = question.scale_u64()? as usize;
        Ok(Self {
            papers: vec![None; papers],
            max_number: question.i64_field("max_number")?,
            max_turns: question.turns.ok_or_else(|| {
                anyhow::anyhow!(
                    "Question {} is malformed: missing 'turns' field.",
                    question.question_id,
                )
            })?,
            turn: 1,
            current: question.i64_field("initial_value")?,
            rng,
        })
    }

    fn winning(&self) -> bool {
        let values: Option<Vec<i64>> = self.papers.iter().copied().collect();
        values
            .map(|filled| filled.windows(2).all(|w| w[0] <= w[1]))
            .unwrap_or(false)
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        let Some(caps) = util::last_match(CHOICE, text) else {
            return Exchange::invalid("Invalid format. Use 'My Choice: X'");
        };
        let Some(position) = util::group_i64(&caps, 1) else {
            return Exchange::invalid("Invalid number format");
        };
        if position < 1 || position > self.papers.len() as i64 {
            return Exchange::invalid(format!(
                "Invalid position. Choose between 1 and {}",
                self.papers.len(),
            ));
        }

        self.papers[position as usize - 1] = Some(self.current);
        let result = format!("Position: {position}");
        if self.winning() {
            return Exchange::win(result, "Win");
        }

        self.turn += 1;
        if self.turn > self.max_turns {
            return Exchange::retire(
                result,
                "Game Over - Max turns reached",
            );
        }

        self.current = self.rng.random_range(1..=self.max_number);
        Exchange::next(result, self.current.to_string())
    }

    fn is_complete(&self, _result: &str) -> bool {
        self.winning()
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

        let Ok(paper_count) = question.scale_u64() else {
            return (false, "Question has no paper count".into());
        };
        let max_turns = question.turns.unwrap_or(0) as usize;
        let Ok(mut current) = question.i64_field("initial_value") else {
            return (false, "Question has no initial value".into());
        };

        let mut papers: Vec<Option<i64>> = vec![None; paper_count as usize];
        let mut moves = Vec::new();
        for (i, turn) in turns.iter().enumerate() {
            let round = i + 1;
            let Some(position) = turn
                .result
                .strip_prefix("Position: ")
                .and_then(|p| p.parse::<usize>().ok())
                .filter(|&p| 1 <= p && p <= papers.len())
            else {
                return (
                    false,
                    format!(
                        "Lost: Invalid move at turn {round}\n{}",
                        moves.join("\n"),
                    ),
                );
            };

            papers[position - 1] = Some(current);
            moves.push(format!(
                "Turn {round} - Placed {current} at position {position}",
            ));

            let filled: Option<Vec<i64>> =
                papers.iter().copied().collect();
            let won = filled
                .map(|values| values.windows(2).all(|w| w[0] <= w[1]))
                .unwrap_or(false);
            if won {
                return (
                    true,
                    format!(
                        "Won at turn {round}!\nMove sequence:\n{}",
                        moves.join("\n"),
                    ),
                );
            }

            if let Ok(next) = turn.feedback.parse::<i64>() {
                current = next;
            }
        }

        if turns.len() >= max_turns {
            return (
                false,
                format!(
                    "Lost: Failed to create non-decreasing sequence in \
                    {max_turns} turns\n{}",
                    moves.join("\n"),
                ),
            );
        }
        (false, format!("Game incomplete\n{}", moves.join("\n")))
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;
    use crate::game::Outcome;

    fn session() -> Session {
        let question: Question = serde_json::from_str(
            r#"{"question_id": 34, "title": "PaperNumber", "scale": 2,
                "max_number": 10, "turns": 5, "initial_value": 4}"#,
        )
        .unwrap();
        Session::new(&question, util::session_rng(34)).unwrap()
    }

    #[test]
    fn placements_report_the_next_number() {
        let mut s = session();
        let x = s.parse_response("My Choice: 2");
        assert_eq!(x.result, "Position: 2");
        assert_eq!(x.outcome, Outcome::Continue);
        let next: i64 = x.feedback.parse().unwrap();
        assert!((1..=10).contains(&next));
        assert_eq!(s.papers[1], Some(4));
    }

    #[test]
    fn a_non_decreasing_fill_wins() {
        let mut s = session();
        s.papers = vec![Some(3), None];
        s.current = 3;
        let x = s.parse_response("My Choice: 2");
        assert_eq!(x.feedback, "Win");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(s.is_complete(""));
    }

    #[test]
    fn a_decreasing_fill_does_not_win() {
        let mut s = session();
        s.papers = vec![Some(5), None];
        s.current = 3;
        let x = s.parse_response("My Choice: 2");
        assert_ne!(x.feedback, "Win");
    }

    #[test]
    fn the_turn_cap_retires_without_a_verdict() {
        let mut s = session();
        s.turn = 5;
        s.papers = vec![Some(9), None];
        s.current = 3;
        let x = s.parse_response("My Choice: 2");
        assert_eq!(x.feedback, "Game Over - Max turns reached");
        assert_eq!(x.outcome, Outcome::Retire);
    }

    #[test]
    fn out_of_range_position_retires() {
        let mut s = session();
        let x = s.parse_response("My Choice: 3");
        assert_eq!(x.outcome, Outcome::Invalid);
    }
}
