//! # Chemical Synthesis Game Module
//!
//! The solver combines element strings toward a target compound using four
//! operations: split, merge, swap, and extract. Each operation has an
//! unstable variant that fires with probability 0.4 and perturbs the
//! result. Element order is significant; produced compounds accumulate.

use anyhow::Result;
use rand::Rng as _;
use rand::seq::index::sample;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Rng;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

use std::collections::BTreeSet;

/* GRAMMAR */

const MERGE: &str = r"My Move:\s*(\w+)\s+(\w+)\s+(\d+)";
const SINGLE: &str = r"My Move:\s*(\w+)\s+(\d+)";

const UNSTABLE_P: f64 = 0.4;

/* GAME IMPLEMENTATION */

pub struct Session {
    available: Vec<String>,
    target: String,
    rng: Rng,
}

impl Session {
    pub fn new(question: &Question, rng: Rng) -> Result<Self> {
        let available = question
            .field("initial_compounds")?
            .as_array()
            .map(|list| {
                list.iter()
                    .filter_map(|v| v.as_str())
                    .map(str::to_owned)
                    .collect()
            })
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Question {} is malformed: 'initial_compounds' is not a \
                    string list.",
                    question.question_id,
                )
            })?;
        Ok(Self {
            available,
            target: question.str_field("target_compound")?.to_owned(),
            rng,
        })
    }

    /// First element against the rest, or an unstable split at a random
    /// interior position.
    fn split(&mut self, compound: &str) -> Vec<String> {
        let chars: Vec<char> = compound.chars().collect();
        if chars.len() <= 1 {
            return vec![compound.to_owned()];
        }

        if self.rng.random_bool(UNSTABLE_P) && chars.len() > 2 {
            let point = self.rng.random_range(1..chars.len());
            return vec![
                chars[..point].iter().collect(),
                chars[point..].iter().collect(),
            ];
        }

        vec![chars[0].to_string(), chars[1..].iter().collect()]
    }

    /// Concatenation, with a chance of one adjacent transposition.
    fn merge(&mut self, left: &str, right: &str) -> Option<String> {
        if left.is_empty() || right.is_empty() {
            return None;
        }
        let mut merged: Vec<char> =
            left.chars().chain(right.chars()).collect();
        if self.rng.random_bool(UNSTABLE_P) && merged.len() > 2 {
            let at = self.rng.random_range(0..merged.len() - 1);
            merged.swap(at, at + 1);
        }
        Some(merged.into_iter().collect())
    }

    /// One or (when unstable) two random transpositions; length-2
    /// compounds are simply reversed.
    fn swap(&mut self, compound: &str) -> String {
        let mut chars: Vec<char> = compound.chars().collect();
        if chars.len() <= 1 {
            return compound.to_owned();
        }

        let swaps = if self.rng.random_bool(UNSTABLE_P) {
            self.rng.random_range(1..=2)
        } else {
            1
        };
        for _ in 0..swaps {
            if chars.len() > 2 {
                let picked = sample(&mut self.rng, chars.len(), 2);
                chars.swap(picked.index(0), picked.index(1));
            } else {
                chars.reverse();
            }
        }
        chars.into_iter().collect()
    }

    /// The final element, or a random one when unstable.
    fn extract(&mut self, compound: &str) -> String {
        let chars: Vec<char> = compound.chars().collect();
        if chars.len() <= 1 {
            return compound.to_owned();
        }
        if self.rng.random_bool(UNSTABLE_P) {
            let at = self.rng.random_range(0..chars.len());
            return chars[at].to_string();
        }
        chars[chars.len() - 1].to_string()
    }

    fn has(&self, compound: &str) -> bool {
        self.available.iter().any(|c| c == compound)
    }

    fn conclude(&self, operation: &str) -> Exchange {
        if self.has(&self.target) {
            return Exchange::win(operation, "WIN");
        }

        let listing: BTreeSet<&str> =
            self.available.iter().map(String::as_str).collect();
        let listing = listing.into_iter().collect::<Vec<_>>().join(" ");
        Exchange::next(operation, format!("Available: {listing}"))
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if let Some(caps) = util::last_match(MERGE, text) {
            let (left, right, operation) =
                (caps[1].to_owned(), caps[2].to_owned(), caps[3].to_owned());
            if operation != "2" {
                return Exchange::next("Wrong type", "Wrong type");
            }
            if !self.has(&left) || !self.has(&right) {
                return Exchange::invalid("Invalid compound");
            }

            if let Some(merged) = self.merge(&left, &right) {
                self.available.push(merged);
            }
            return self.conclude(&operation);
        }

        let Some(caps) = util::last_match(SINGLE, text) else {
            return Exchange::invalid("Invalid format");
        };
        let (compound, operation) = (caps[1].to_owned(), caps[2].to_owned());
        if !self.has(&compound) {
            return Exchange::invalid("Invalid compound");
        }

        match operation.as_str() {
            "1" => {
                let parts = self.split(&compound);
                self.available.extend(parts);
            },
            "2" => return Exchange::next("Wrong type", "Wrong type"),
            "3" => {
                let swapped = self.swap(&compound);
                self.available.push(swapped);
            },
            "4" => {
                let extracted = self.extract(&compound);
                self.available.push(extracted);
            },
            _ => {
                return Exchange::next("Invalid", "Unrecognized operation");
            },
        }

        self.conclude(&operation)
    }

    fn is_complete(&self, _result: &str) -> bool {
        self.has(&self.target)
    }
}

/* EVALUATION */

pub struct Evaluator;

impl Evaluate for Evaluator {
    fn evaluate_game(&self, _: &Question, turns: &[Turn]) -> (bool, String) {
        if turns.is_empty() {
            return (false, "No turns played".into());
        }

        let mut valid = 0;
        let mut invalid = 0;
        let mut compounds: BTreeSet<String> = BTreeSet::new();
        let mut success = false;
        for turn in turns {
            if turn.feedback.to_lowercase().contains("invalid") {
                invalid += 1;
            } else {
                valid += 1;
                if let Some(listing) =
                    turn.feedback.split("Available: ").nth(1)
                {
                    compounds.extend(
                        listing.split_whitespace().map(str::to_owned),
                    );
                }
            }
            if turn.feedback.to_lowercase().contains("win") {
                success = true;
            }
        }

        let detail = format!(
            "Total moves: {}, Valid moves: {valid}, Invalid moves: \
            {invalid}, Unique compounds created: {}",
            turns.len(),
            compounds.len(),
        );
        (success, detail)
    }
}

/* TESTS */
