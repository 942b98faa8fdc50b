//! # Letter-Finding Game Module
//!
//! The solver guesses a hidden uppercase word. Feedback colors each position
//! `R` (right letter, right place), `G` (letter present elsewhere), or `W`
//! (absent), with per-letter multiplicity: a letter only earns as many `G`s
//! as it has unmatched occurrences in the answer.

use anyhow::Result;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const GUESS: &str = r"My Guess:\s*([A-Za-z]+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    answer: String,
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        Ok(Self {
            answer: question
                .str_field("answer")?
                .to_uppercase(),
        })
    }

    /// Two-pass coloring: exact positions first (consuming their answer
    /// letters), then present-elsewhere matches against whatever remains.
    fn color(&self, guess: &str) -> String {
        let guess: Vec<char> = guess.chars().collect();
        let mut remaining: Vec<Option<char>> =
            self.answer.chars().map(Some).collect();
        let mut feedback = vec!['W'; remaining.len()];

        for (i, &g) in guess.iter().enumerate() {
            if remaining[i] == Some(g) {
                feedback[i] = 'R';
                remaining[i] = None;
            }
        }

        for (i, &g) in guess.iter().enumerate() {
            if feedback[i] == 'R' {
                continue;
            }
            if let Some(slot) =
                remaining.iter().position(|&c| c == Some(g))
            {
                feedback[i] = 'G';
                remaining[slot] = None;
            }
        }

        feedback.into_iter().collect()
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        let Some(caps) = util::last_match(GUESS, text) else {
            return Exchange::next(
                "Invalid",
                "Your response must end with 'My Guess: [YOUR WORD]'",
            );
        };

        let guess = caps[1].to_uppercase();
        if guess.chars().count() != self.answer.chars().count() {
            return Exchange::next(
                guess,
                "The word you guess must have correct length.",
            );
        }

        let feedback = self.color(&guess);
        if guess == self.answer {
            Exchange::win(guess, feedback)
        } else {
            Exchange::next(guess, feedback)
        }
    }

    fn is_complete(&self, result: &str) -> bool {
        result == self.answer
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
        let Some(last) = turns.last() else {
            return (false, "No turns played".into());
        };

        let solved = question
            .str_field("answer")
            .map(|answer| {
                last.feedback.chars().count() == answer.chars().count()
                    && last.feedback.chars().all(|c| c == 'R')
            })
            .unwrap_or(false);

        (solved, format!("Final guess: {}", last.result))
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;
    use crate::game::Outcome;
    use crate::model::Question;

    fn session(answer: &str) -> Session {
        let question: Question = serde_json::from_str(&format!(
            r#"{{"question_id": 1, "title": "Wordle", "answer": "{answer}"}}"#,
        ))
        .unwrap();
        Session::new(&question).unwrap()
    }

    #[test]
    fn near_miss_then_exact_guess() {
        let mut s = session("ABCD");
        let x = s.parse_response("My Guess: ABCE");
        assert_eq!(x.feedback, "RRRW");
        assert_eq!(x.outcome, Outcome::Continue);

        let x = s.parse_response("My Guess: ABCD");
        assert_eq!(x.feedback, "RRRR");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(s.is_complete(&x.result));
    }

    #[test]
    fn repeated_letters_respect_multiplicity() {
        let mut s = session("ABAB");
        // The second A earns a G from the unmatched A, the third gets W.
        let x = s.parse_response("My Guess: AABA");
        assert_eq!(x.feedback, "RGGW");
    }

    #[test]
    fn present_letters_color_green() {
        let mut s = session("ABCD");
        let x = s.parse_response("My Guess: DCBA");
        assert_eq!(x.feedback, "GGGG");
    }

    #[test]
    fn wrong_length_burns_the_turn() {
        let mut s = session("ABCD");
        let x = s.parse_response("My Guess: ABCDE");
        assert_eq!(x.outcome, Outcome::Continue);
        assert_eq!(x.result, "ABCDE");
        assert!(x.feedback.contains("length"));
    }

    #[test]
    fn missing_command_burns_the_turn() {
        let mut s = session("ABCD");
        let x = s.parse_response("I refuse to answer.");
        assert_eq!(x.outcome, Outcome::Continue);
        assert_eq!(x.result, "Invalid");
    }

    #[test]
    fn last_stated_guess_is_authoritative() {
        let mut s = session("ABCD");
        let x = s.parse_response("My Guess: AAAA ... actually My Guess: ABCD");
        assert_eq!(x.outcome, Outcome::Win);
    }

    #[test]
    fn evaluation_requires_full_r_feedback() {
        let question: Question = serde_json::from_str(
            r#"{"question_id": 1, "title": "Wordle", "answer": "ABCD"}"#,
        )
        .unwrap();
        let turn = |feedback: &str| Turn {
            round: 1,
            raw_output: String::new(),
            output: String::new(),
            result: "ABCD".into(),
            feedback: feedback.into(),
        };

        let (ok, detail) =
            Evaluator.evaluate_game(&question, &[turn("RRRR")]);
        assert!(ok);
        assert!(detail.contains("ABCD"));

        let (ok, _) = Evaluator.evaluate_game(&question, &[turn("RRRW")]);
        assert!(!ok);

        let (ok, _) = Evaluator.evaluate_game(&question, &[]);
        assert!(!ok);
    }
}
