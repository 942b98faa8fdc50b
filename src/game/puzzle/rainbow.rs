//! # Rainbow Candy Game Module
//!
//! A candy travels a grid of dyeing devices toward the far corner. Dye
//! machines color a white candy; two base colors mix into a fixed secondary
//! color; mixed candies cannot be re-dyed; a white device washes the candy
//! clean. The run succeeds iff the candy arrives with the target color.

use anyhow::Result;
use serde_json::Value;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

use std::collections::HashMap;

/* GRAMMAR */

const MOVE: &str = r"My Move:\s*([NSEW])";

/* GAME IMPLEMENTATION */

pub struct Session {
    size: i64,
    devices: HashMap<(i64, i64), char>,
    target: char,
    position: (i64, i64),
    color: char,
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        let spec = question.field("graph")?;
        let size = spec
            .get("size")
            .and_then(Value::as_i64)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Question {} is malformed: 'graph' has no size.",
                    question.question_id,
                )
            })?;
        let target = spec
            .get("target")
            .and_then(Value::as_str)
            .and_then(|t| t.chars().next())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Question {} is malformed: 'graph' has no target.",
                    question.question_id,
                )
            })?;

        let mut devices = HashMap::new();
        if let Some(map) = spec.get("devices").and_then(Value::as_object) {
            for (key, device) in map {
                let Some((x, y)) = key.split_once(',').and_then(|(x, y)| {
                    Some((
                        x.trim().parse::<i64>().ok()?,
                        y.trim().parse::<i64>().ok()?,
                    ))
                }) else {
                    continue;
                };
                if let Some(kind) =
                    device.as_str().and_then(|d| d.chars().next())
                {
                    devices.insert((x, y), kind);
                }
            }
        }

        Ok(Self {
            size,
            devices,
            target,
            position: (1, 1),
            color: 'W',
        })
    }

    fn recolor(color: char, device: char) -> char {
        match device {
            'W' => 'W',
            'R' | 'G' | 'B' => match color {
                'W' => device,
                'R' | 'G' | 'B' => {
                    let mut pair = [color, device];
                    pair.sort_unstable();
                    match pair {
                        ['G', 'R'] => 'Y',
                        ['B', 'G'] => 'C',
                        ['B', 'R'] => 'P',
                        _ => color,
                    }
                },
                _ => color,
            },
            _ => color,
        }
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        let Some(caps) = util::last_match(MOVE, text) else {
            return Exchange::invalid(
                "Invalid format. Use 'My Move: X' where X is N/S/E/W",
            );
        };
        let direction = caps[1].chars().next().unwrap_or('N');

        let (dx, dy) = match direction {
            'N' => (-1, 0),
            'S' => (1, 0),
            'W' => (0, -1),
            _ => (0, 1),
        };
        let (x, y) = (self.position.0 + dx, self.position.1 + dy);
        if x < 1 || x > self.size || y < 1 || y > self.size {
            return Exchange::invalid("Invalid move: out of bounds");
        }

        self.position = (x, y);
        if let Some(&device) = self.devices.get(&(x, y)) {
            self.color = Self::recolor(self.color, device);
        }

        let result = direction.to_string();
        if (x, y) == (self.size, self.size) && self.color == self.target {
            return Exchange::win(result, "WIN");
        }
        Exchange::next(result, self.color.to_string())
    }

    fn is_complete(&self, _result: &str) -> bool {
        self.position == (self.size, self.size) && self.color == self.target
    }
}

/* EVALUATION */

pub struct Evaluator;

impl Evaluate for Evaluator {
    fn evaluate_game(&self, _: &Question, turns: &[Turn]) -> (bool, String) {
        let Some(last) = turns.last() else {
            return (false, "No turns played".into());
        };

        let mut colors = Vec::new();
        let mut success = false;
        for turn in turns {
            let lowered = turn.feedback.to_lowercase();
            if !lowered.contains("invalid") {
                colors.push(turn.feedback.clone());
            }
            if lowered.contains("win") {
                success = true;
            }
        }

        let outcome = if success {
            "Success".to_owned()
        } else if last.feedback.to_lowercase().contains("invalid") {
            "Invalid move".to_owned()
        } else {
            format!("Wrong color: {}", last.feedback)
        };
        let detail = format!(
            "Moves used: {}, Color sequence: {}, Result: {outcome}",
            turns.len(),
            colors.join(" -> "),
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
            r#"{"question_id": 28, "title": "RainbowCandy",
                "graph": {"size": 2, "target": "Y",
                    "devices": {
                        "1,1": ".", "1,2": "R",
                        "2,1": "G", "2,2": "G"
                    }}}"#,
        )
        .unwrap();
        Session::new(&question).unwrap()
    }

    #[test]
    fn dye_then_mix_produces_a_secondary_color() {
        let mut s = session();
        let x = s.parse_response("My Move: E");
        assert_eq!(x.feedback, "R");

        // R + G mixes to Y, which is also the target at the corner.
        let x = s.parse_response("My Move: S");
        assert_eq!(x.feedback, "WIN");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(s.is_complete(""));
    }

    #[test]
    fn mixed_colors_resist_further_dye() {
        assert_eq!(Session::recolor('Y', 'B'), 'Y');
        assert_eq!(Session::recolor('C', 'R'), 'C');
    }

    #[test]
    fn white_device_washes_the_candy() {
        assert_eq!(Session::recolor('R', 'W'), 'W');
        assert_eq!(Session::recolor('P', 'W'), 'W');
    }

    #[test]
    fn arriving_with_the_wrong_color_continues() {
        let mut s = session();
        let x = s.parse_response("My Move: S");
        assert_eq!(x.feedback, "G");
        // G + G stays G at the corner: no win, session continues.
        let x = s.parse_response("My Move: E");
        assert_eq!(x.feedback, "G");
        assert_eq!(x.outcome, Outcome::Continue);
    }

    #[test]
    fn leaving_the_grid_retires() {
        let mut s = session();
        let x = s.parse_response("My Move: N");
        assert_eq!(x.outcome, Outcome::Invalid);
    }
}
