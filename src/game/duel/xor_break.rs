//! # XOR Breaking Game Module
//!
//! Players break numbers: a break of `n` into `(p1, p2)` is legal iff both
//! parts are in `(0, n)` and `p1 XOR p2 = n`. After the opening break the
//! solver must name which of the opponent's parts it takes before breaking
//! it. The opponent prefers a non-unit part and concedes when its part
//! cannot be broken.

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

const OPENING: &str = r"Breaking into:\s*(\d+)\s+(\d+)";
const FOLLOWUP: &str = r"Choosing:\s*(\d+)\s+Breaking into:\s*(\d+)\s+(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    current: u64,
    opened: bool,
    rng: Rng,
}

impl Session {
    pub fn new(question: &Question, rng: Rng) -> Result<Self> {
        Ok(Self {
            current: question.u64_field("initial_number")?,
            opened: false,
            rng,
        })
    }

    fn valid_break(n: u64, p1: u64, p2: u64) -> bool {
        0 < p1 && p1 < n && 0 < p2 && p2 < n && p1 ^ p2 == n
    }

    /// The smallest legal break of `n`, if any.
    fn find_break(n: u64) -> Option<(u64, u64)> {
        (1..n).find_map(|p1| {
            let p2 = p1 ^ n;
            (0 < p2 && p2 < n).then_some((p1, p2))
        })
    }

    /// Picks one of the solver's parts, preferring a non-unit.
    fn pick(&mut self, p1: u64, p2: u64) -> u64 {
        match (p1, p2) {
            (1, part) | (part, 1) if part != 1 => part,
            _ if self.rng.random_bool(0.5) => p1,
            _ => p2,
        }
    }

    fn reply(&mut self, result: String, p1: u64, p2: u64) -> Exchange {
        let chosen = self.pick(p1, p2);
        self.current = chosen;
        match Self::find_break(chosen) {
            None => Exchange::win(
                result,
                format!("Choosing: {chosen} Cannot break further. You win!"),
            ),
            Some((a, b)) => Exchange::next(
                result,
                format!("Choosing: {chosen} Breaking into: {a} {b}"),
            ),
        }
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if !self.opened {
            let Some(caps) = util::last_match(OPENING, text) else {
                return Exchange::invalid(
                    "Invalid format. Use 'Breaking into: p1 p2'",
                );
            };
            let (Ok(p1), Ok(p2)) =
                (caps[1].parse::<u64>(), caps[2].parse::<u64>())
            else {
                return Exchange::invalid("Invalid number format");
            };
            if !Self::valid_break(self.current, p1, p2) {
                return Exchange::invalid("Invalid break");
            }

            self.opened = true;
            return self.reply(format!("Breaking into: {p1} {p2}"), p1, p2);
        }

        let Some(caps) = util::last_match(FOLLOWUP, text) else {
            return Exchange::invalid(
                "Invalid format. Use 'Choosing: p Breaking into: p1 p2'",
            );
        };
        let (Ok(chosen), Ok(p1), Ok(p2)) = (
            caps[1].parse::<u64>(),
            caps[2].parse::<u64>(),
            caps[3].parse::<u64>(),
        ) else {
            return Exchange::invalid("Invalid number format");
        };
        if !Self::valid_break(chosen, p1, p2) {
            return Exchange::invalid("Invalid break");
        }

        self.reply(
            format!("Choosing: {chosen} Breaking into: {p1} {p2}"),
            p1,
            p2,
        )
    }

    fn is_complete(&self, _result: &str) -> bool {
        Self::find_break(self.current).is_none()
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

        let opening = question.u64_field("initial_number").unwrap_or(0);
        let mut moves = Vec::new();
        for (i, turn) in turns.iter().enumerate() {
            let round = i + 1;
            if i == 0 {
                let Some(caps) = util::last_match(OPENING, &turn.result)
                else {
                    return (
                        false,
                        format!(
                            "Lost: Invalid format at turn {round}\n{}",
                            moves.join("\n"),
                        ),
                    );
                };
                moves.push(format!(
                    "Turn {round} - Breaking {opening} into: {} {}",
                    &caps[1], &caps[2],
                ));
            } else {
                let Some(caps) = util::last_match(FOLLOWUP, &turn.result)
                else {
                    return (
                        false,
                        format!(
                            "Lost: Invalid format at turn {round}\n{}",
                            moves.join("\n"),
                        ),
                    );
                };
                moves.push(format!(
                    "Turn {round} - Choosing {} and breaking into: {} {}",
                    &caps[1], &caps[2], &caps[3],
                ));
            }

            if turn.feedback.contains("Invalid") {
                return (
                    false,
                    format!(
                        "Lost: Invalid move at turn {round}\n{}",
                        moves.join("\n"),
                    ),
                );
            }
            if turn.feedback.to_lowercase().contains("win") {
                return (true, format!("Win!\n{}", moves.join("\n")));
            }
            moves.push(format!("Turn {round} - {}", turn.feedback));
        }

        (false, format!("Game incomplete\n{}", moves.join("\n")))
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;
    use crate::game::Outcome;

    fn session(n: u64) -> Session {
        let question: Question = serde_json::from_str(&format!(
            r#"{{"question_id": 5, "title": "XORBreaking",
                "initial_number": {n}}}"#,
        ))
        .unwrap();
        Session::new(&question, util::session_rng(5)).unwrap()
    }

    #[test]
    fn a_break_must_xor_to_the_broken_number() {
        assert!(Session::valid_break(13, 10, 7));
        assert!(!Session::valid_break(13, 10, 6));
        assert!(!Session::valid_break(13, 13, 0));
        assert!(!Session::valid_break(5, 2, 7));
    }

    #[test]
    fn the_opening_break_is_accepted_and_answered() {
        let mut s = session(13);
        let x = s.parse_response("Breaking into: 10 7");
        assert_eq!(x.result, "Breaking into: 10 7");
        assert!(x.feedback.starts_with("Choosing: "));
        // The opponent picked one of the two parts.
        let chosen: u64 = x
            .feedback
            .strip_prefix("Choosing: ")
            .unwrap()
            .split_whitespace()
            .next()
            .unwrap()
            .parse()
            .unwrap();
        assert!(chosen == 10 || chosen == 7);
    }

    #[test]
    fn any_opponent_break_satisfies_the_xor_rule() {
        let mut s = session(13);
        let x = s.parse_response("Breaking into: 10 7");
        if let Some(caps) =
            util::last_match(r"Breaking into:\s*(\d+)\s+(\d+)", &x.feedback)
        {
            let (a, b): (u64, u64) =
                (caps[1].parse().unwrap(), caps[2].parse().unwrap());
            assert!(Session::valid_break(s.current, a, b));
        }
    }

    #[test]
    fn the_opponent_avoids_unit_parts() {
        for seed in 0..10 {
            let mut s = session(3);
            s.rng = util::session_rng(seed);
            // 3 breaks only into 1 and 2: the opponent must take 2.
            let x = s.parse_response("Breaking into: 1 2");
            assert!(x.feedback.starts_with("Choosing: 2"));
        }
    }

    #[test]
    fn an_unbreakable_part_concedes() {
        let mut s = session(3);
        // Both parts of 3 are terminal: 1 cannot break, 2 = 10b requires
        // p1 ^ p2 = 2 with parts below 2, which is impossible.
        let x = s.parse_response("Breaking into: 1 2");
        assert!(x.feedback.contains("You win!"));
        assert_eq!(x.outcome, Outcome::Win);
    }

    #[test]
    fn illegal_breaks_retire() {
        let mut s = session(13);
        let x = s.parse_response("Breaking into: 13 0");
        assert_eq!(x.outcome, Outcome::Invalid);
    }

    #[test]
    fn followup_moves_use_the_extended_grammar() {
        let mut s = session(13);
        s.parse_response("Breaking into: 10 7");
        let x = s.parse_response("Breaking into: 4 6");
        assert_eq!(x.outcome, Outcome::Invalid);

        let mut s = session(13);
        s.parse_response("Breaking into: 10 7");
        // 6 = 4 xor 2.
        let x = s.parse_response("Choosing: 6 Breaking into: 4 2");
        assert_ne!(x.result, "Invalid");
    }
}
