//! # Palindrome Construction Game Module
//!
//! A string grows every turn: the four opening turns reveal `scale`
//! characters of a fixed prefix, later turns append one random character
//! from {a, b}. Before each reveal the solver may swap two positions (or
//! pass with `0 0`). The game is won iff the completed string is a
//! palindrome.

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

const CHOICE: &str = r"My Choice:\s*(\d+)\s+(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    seed_data: Vec<char>,
    scale: usize,
    revealed: usize,
    turn: u64,
    string: Vec<char>,
    total_length: usize,
    rng: Rng,
}

impl Session {
    pub fn new(question: &Question, rng: Rng) -> Result<Self> {
        let seed_data: Vec<char> =
            question.str_field("initial_data")?.chars().collect();
        let scale = question.scale_u64()? as usize;
        let turns = question.turns.ok_or_else(|| {
            anyhow::anyhow!(
                "Question {} is malformed: missing 'turns' field.",
                question.question_id,
            )
        })? as usize;

        Ok(Self {
            string: seed_data.iter().take(scale).copied().collect(),
            total_length: (seed_data.len() + turns).saturating_sub(4),
            seed_data,
            scale,
            revealed: scale,
            turn: 1,
            rng,
        })
    }

    fn reveal(&mut self) -> String {
        if self.turn <= 4 {
            let chunk: Vec<char> = if self.revealed < self.seed_data.len() {
                self.seed_data
                    .iter()
                    .skip(self.revealed)
                    .take(self.scale)
                    .copied()
                    .collect()
            } else {
                vec!['a'; self.scale]
            };
            self.revealed += self.scale;
            chunk.into_iter().collect()
        } else {
            let letter = if self.rng.random_bool(0.5) { 'a' } else { 'b' };
            letter.to_string()
        }
    }

    fn palindrome(&self) -> bool {
        let n = self.string.len();
        (0..n / 2).all(|i| self.string[i] == self.string[n - 1 - i])
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        let Some(caps) = util::last_match(CHOICE, text) else {
            return Exchange::invalid("Invalid format. Use 'My Choice: l r'");
        };
        let (Some(l), Some(r)) =
            (util::group_i64(&caps, 1), util::group_i64(&caps, 2))
        else {
            return Exchange::invalid("Invalid number format");
        };

        if l != 0 || r != 0 {
            let n = self.string.len() as i64;
            if !(1 <= l && l <= n && 1 <= r && r <= n) {
                return Exchange::invalid("Invalid positions");
            }
            self.string.swap(l as usize - 1, r as usize - 1);
        }

        let appended = self.reveal();
        self.string.extend(appended.chars());
        self.turn += 1;

        let result = format!("My Choice: {l} {r}");
        if self.string.len() >= self.total_length {
            return if self.palindrome() {
                Exchange::win(result, "Win")
            } else {
                Exchange::lose(result, "Lose")
            };
        }
        Exchange::next(result, appended)
    }

    fn is_complete(&self, _result: &str) -> bool {
        self.string.len() >= self.total_length && self.palindrome()
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

        let expected = question.turns.unwrap_or(0) as usize;
        if turns.len() < expected {
            return (
                false,
                format!(
                    "Game incomplete: {}/{expected} turns played",
                    turns.len(),
                ),
            );
        }

        let last = turns.last().unwrap();
        let success = last.feedback == "Win";
        let detail =
            format!("Turns played: {}/{expected}", turns.len());
        (success, detail)
    }
}

/* TESTS */
