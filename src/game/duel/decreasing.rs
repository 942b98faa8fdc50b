//! # Decreasing Game Module
//!
//! Players alternately pick indices of a positive array; each pick pairs
//! with the opponent's previous index and both entries drop by their
//! minimum. A player with no positive index to pick loses.

use anyhow::Result;
use rand::seq::IndexedRandom;

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
    array: Vec<i64>,
    last_pick: usize,
    rng: Rng,
}

impl Session {
    pub fn new(question: &Question, rng: Rng) -> Result<Self> {
        let array = question.int_list_field("initial_list")?;
        let first = question.i64_field("first_choice")?;
        if first < 1 || first as usize > array.len() {
            anyhow::bail!(
                "Question {} is malformed: 'first_choice' out of range.",
                question.question_id,
            );
        }
        Ok(Self {
            array,
            last_pick: first as usize - 1,
            rng,
        })
    }

    fn positive_indices(&self) -> Vec<usize> {
        self.array
            .iter()
            .enumerate()
            .filter(|(_, &v)| v > 0)
            .map(|(i, _)| i)
            .collect()
    }

    fn reduce(&mut self, a: usize, b: usize) {
        let step = self.array[a].min(self.array[b]);
        self.array[a] -= step;
        self.array[b] -= step;
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        let Some(caps) = util::last_match(CHOICE, text) else {
            return Exchange::invalid(
                "My Choice: Invalid format. Use 'My Choice: X'",
            );
        };
        let Some(pick) = util::group_i64(&caps, 1) else {
            return Exchange::invalid("My Choice: Invalid move format or index");
        };
        let pick = pick - 1;

        let legal = 0 <= pick
            && (pick as usize) < self.array.len()
            && pick as usize != self.last_pick
            && self.array[pick as usize] > 0;
        if !legal {
            return Exchange::invalid(format!("Invalid move {}", pick + 1));
        }
        let pick = pick as usize;

        self.reduce(self.last_pick, pick);
        let result = format!("My Choice: {}", pick + 1);

        let open = self.positive_indices();
        if open.is_empty() {
            return Exchange::win(result, "You win!");
        }

        let reply = *open
            .choose(&mut self.rng)
            .expect("Non-empty index list always yields a choice.");
        self.reduce(reply, pick);
        self.last_pick = reply;

        if self.positive_indices().is_empty() {
            return Exchange::lose(
                result,
                format!("My Choice: {}\nYou lose!", reply + 1),
            );
        }
        Exchange::next(result, format!("My Choice: {}", reply + 1))
    }

    fn is_complete(&self, _result: &str) -> bool {
        self.positive_indices().is_empty()
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

        let opening = question
            .i64_field("first_choice")
            .map(|c| c.to_string())
            .unwrap_or_else(|_| "?".into());
        let mut moves = vec![format!("Turn 0 - Opponent chose: {opening}")];
        for (i, turn) in turns.iter().enumerate() {
            let round = i + 1;
            let Some(pick) =
                turn.result.strip_prefix("My Choice: ")
            else {
                return (
                    false,
                    format!(
                        "Lost: Invalid format at turn {round}\n{}",
                        moves.join("\n"),
                    ),
                );
            };
            moves.push(format!("Turn {round} - Solver chose: {pick}"));

            let lowered = turn.feedback.to_lowercase();
            if turn.feedback.contains("Invalid") {
                return (
                    false,
                    format!(
                        "Lost: Invalid move at turn {round}\n{}",
                        moves.join("\n"),
                    ),
                );
            }
            if lowered.contains("win") {
                return (true, format!("Win!\n{}", moves.join("\n")));
            }
            if lowered.contains("lose") {
                return (
                    false,
                    format!("Lost: Game over\n{}", moves.join("\n")),
                );
            }
            if let Some(reply) = util::last_match(CHOICE, &turn.feedback) {
                moves.push(format!(
                    "Turn {round} - Opponent chose: {}",
                    &reply[1],
                ));
            }
        }

        (false, format!("Game incomplete\n{}", moves.join("\n")))
    }
}

/* TESTS */
