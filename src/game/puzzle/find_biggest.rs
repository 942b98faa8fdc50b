//! # Treasure Valuation Game Module
//!
//! Treasures of differing value are scattered over a grid. Moving onto a
//! treasure reveals its value; empty cells report the compass direction of
//! the nearest treasure, which is wrong half the time but never twice in a
//! row. Collecting wins only on the most valuable treasure.

use anyhow::Result;
use rand::Rng as _;
use rand::seq::IndexedRandom;
use serde_json::Value;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Rng;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const CHOICE: &str = r"My Choice:\s*(?:(\d+)\s+(\d+)|COLLECT)";

const COMPASS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/* DEFINITIONS */

struct Treasure {
    x: i64,
    y: i64,
    value: i64,
}

/* GAME IMPLEMENTATION */

pub struct Session {
    size: i64,
    treasures: Vec<Treasure>,
    position: (i64, i64),
    last_direction_wrong: bool,
    rng: Rng,
}

impl Session {
    pub fn new(question: &Question, rng: Rng) -> Result<Self> {
        let spec = question.field("graph")?;
        let size = spec
            .get("grid_size")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Question {} is malformed: 'graph' has no grid_size.",
                    question.question_id,
                )
            })?;
        let treasures = spec
            .get("treasures")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(|t| {
                        Some(Treasure {
                            x: t.get("x")?.as_i64()?,
                            y: t.get("y")?.as_i64()?,
                            value: t.get("value")?.as_i64()?,
                        })
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        if treasures.is_empty() {
            anyhow::bail!(
                "Question {} is malformed: 'graph' has no treasures.",
                question.question_id,
            );
        }

        Ok(Self {
            size,
            treasures,
            position: (1, 1),
            last_direction_wrong: false,
            rng,
        })
    }

    fn direction(from: (i64, i64), to: (i64, i64)) -> &'static str {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        match (dx.signum(), dy.signum()) {
            (-1, -1) => "NW",
            (-1, 0) => "N",
            (-1, 1) => "NE",
            (0, -1) => "W",
            (0, _) => "E",
            (_, -1) => "SW",
            (_, 0) => "S",
            _ => "SE",
        }
    }

    fn nearest_direction(&self, x: i64, y: i64) -> &'static str {
        let nearest = self
            .treasures
            .iter()
            .min_by_key(|t| (t.x - x).abs() + (t.y - y).abs())
            .expect("Treasure list is never empty.");
        Self::direction((x, y), (nearest.x, nearest.y))
    }

    fn treasure_at(&self, x: i64, y: i64) -> Option<&Treasure> {
        self.treasures.iter().find(|t| t.x == x && t.y == y)
    }

    fn collect(&mut self) -> Exchange {
        let (x, y) = self.position;
        let Some(here) = self.treasure_at(x, y) else {
            return Exchange::retire("My Choice: COLLECT", "Fail");
        };

        let best = self
            .treasures
            .iter()
            .map(|t| t.value)
            .max()
            .unwrap_or(i64::MIN);
        if here.value == best {
            Exchange::win("My Choice: COLLECT", "Win")
        } else {
            Exchange::lose("My Choice: COLLECT", "Lose")
        }
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        let Some(caps) = util::last_match(CHOICE, text) else {
            return Exchange::invalid(
                "Invalid format. Use 'My Choice: X Y' or 'My Choice: COLLECT'",
            );
        };

        if text.contains("COLLECT") {
            return self.collect();
        }

        let (Some(x), Some(y)) =
            (util::group_i64(&caps, 1), util::group_i64(&caps, 2))
        else {
            return Exchange::invalid("INVALID_MOVE");
        };
        if x < 1 || x > self.size || y < 1 || y > self.size {
            return Exchange::invalid("INVALID_MOVE");
        }
        let (dx, dy) =
            ((x - self.position.0).abs(), (y - self.position.1).abs());
        if dx > 1 || dy > 1 {
            return Exchange::invalid("INVALID_MOVE");
        }

        self.position = (x, y);
        let result = format!("My Choice: {x} {y}");
        if let Some(found) = self.treasure_at(x, y) {
            return Exchange::next(result, format!("TREASURE {}", found.value));
        }

        let truth = self.nearest_direction(x, y);
        if self.last_direction_wrong {
            self.last_direction_wrong = false;
            return Exchange::next(result, format!("EMPTY {truth}"));
        }

        if self.rng.random_bool(0.5) {
            self.last_direction_wrong = true;
            let wrong: Vec<&&str> =
                COMPASS.iter().filter(|&&d| d != truth).collect();
            let lied = wrong
                .choose(&mut self.rng)
                .copied()
                .copied()
                .unwrap_or(truth);
            Exchange::next(result, format!("EMPTY {lied}"))
        } else {
            self.last_direction_wrong = false;
            Exchange::next(result, format!("EMPTY {truth}"))
        }
    }

    fn is_complete(&self, result: &str) -> bool {
        result.contains("COLLECT")
            && self
                .treasure_at(self.position.0, self.position.1)
                .map(|t| {
                    let best = self
                        .treasures
                        .iter()
                        .map(|t| t.value)
                        .max()
                        .unwrap_or(i64::MIN);
                    t.value == best
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
        if !last.result.contains("COLLECT") {
            return (
                false,
                "Game did not end with a collection attempt".into(),
            );
        }

        let moves = turns
            .iter()
            .filter(|turn| {
                turn.result.contains("Choice:")
                    && !turn.result.contains("COLLECT")
            })
            .count();
        let collections = turns
            .iter()
            .filter(|turn| turn.result.contains("COLLECT"))
            .count();
        let found = turns
            .iter()
            .filter(|turn| turn.feedback.contains("TREASURE"))
            .count();
        let success = last.feedback == "Win";
        let detail = format!(
            "Moves made: {moves}, Treasures found: {found}, \
            Collection attempts: {collections}",
        );
        (success, detail)
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;
    use crate::game::Outcome;

    fn session() -> Session {
        let question: Question = serde_json::from_str(
            r#"{"question_id": 25, "title": "FindBiggest",
                "graph": {"grid_size": 5, "treasures": [
                    {"x": 2, "y": 2, "value": 10},
                    {"x": 4, "y": 4, "value": 30}
                ]}}"#,
        )
        .unwrap();
        Session::new(&question, util::session_rng(25)).unwrap()
    }

    #[test]
    fn stepping_on_a_treasure_reveals_its_value() {
        let mut s = session();
        s.parse_response("My Choice: 2 1");
        let x = s.parse_response("My Choice: 2 2");
        assert_eq!(x.feedback, "TREASURE 10");
    }

    #[test]
    fn empty_cells_report_a_compass_direction() {
        let mut s = session();
        let x = s.parse_response("My Choice: 1 2");
        assert!(x.feedback.starts_with("EMPTY "));
        let direction = x.feedback.trim_start_matches("EMPTY ");
        assert!(COMPASS.contains(&direction));
    }

    #[test]
    fn wrong_directions_never_come_twice_in_a_row() {
        let mut s = session();
        let mut wrong_streak = 0;
        // Shuffle within the starting corner, away from treasures. The
        // nearest treasure is at (2,2): truth is S from (1,2), SE from
        // (1,1).
        for (cell, truth) in
            [("1 2", "S"), ("1 1", "SE")].into_iter().cycle().take(40)
        {
            let x = s.parse_response(&format!("My Choice: {cell}"));
            let reported = x.feedback.trim_start_matches("EMPTY ");
            if reported != truth {
                wrong_streak += 1;
                assert!(wrong_streak <= 1);
            } else {
                wrong_streak = 0;
            }
        }
    }

    #[test]
    fn collecting_the_biggest_treasure_wins() {
        let mut s = session();
        s.position = (4, 4);
        let x = s.parse_response("My Choice: COLLECT");
        assert_eq!(x.feedback, "Win");
        assert_eq!(x.outcome, Outcome::Win);
    }

    #[test]
    fn collecting_a_lesser_treasure_loses() {
        let mut s = session();
        s.position = (2, 2);
        let x = s.parse_response("My Choice: COLLECT");
        assert_eq!(x.feedback, "Lose");
        assert_eq!(x.outcome, Outcome::Lose);
    }

    #[test]
    fn collecting_on_an_empty_cell_fails() {
        let mut s = session();
        let x = s.parse_response("My Choice: COLLECT");
        assert_eq!(x.feedback, "Fail");
        assert_eq!(x.outcome, Outcome::Retire);
    }

    #[test]
    fn teleporting_is_rejected() {
        let mut s = session();
        let x = s.parse_response("My Choice: 4 4");
        assert_eq!(x.feedback, "INVALID_MOVE");
        assert_eq!(x.outcome, Outcome::Invalid);
    }
}
