//! # Dark Maze Game Module
//!
//! The solver feels its way through an unlit maze one compass step at a
//! time. Walls block silently, the outer boundary rejects the move, and
//! reaching the far corner wins.

use anyhow::Result;
use serde_json::Value;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

use std::collections::HashMap;
use std::collections::HashSet;

/* GRAMMAR */

const MOVE: &str = r"My Choice:\s*([NESW])";

/* GAME IMPLEMENTATION */

pub struct Session {
    size: i64,
    walls: HashMap<(i64, i64), HashSet<char>>,
    position: (i64, i64),
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        let size = question.scale_u64()? as i64;
        let rooms = question
            .field("maze")?
            .get("rooms")
            .and_then(Value::as_object)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Question {} is malformed: 'maze' has no rooms.",
                    question.question_id,
                )
            })?;

        let mut walls = HashMap::new();
        for (key, room) in rooms {
            let Some((x, y)) = key
                .split_once(',')
                .and_then(|(x, y)| {
                    Some((
                        x.trim().parse::<i64>().ok()?,
                        y.trim().parse::<i64>().ok()?,
                    ))
                })
            else {
                continue;
            };
            let blocked: HashSet<char> = room
                .get("walls")
                .and_then(Value::as_array)
                .map(|sides| {
                    sides
                        .iter()
                        .filter_map(|side| side.as_str())
                        .filter_map(|side| side.chars().next())
                        .collect()
                })
                .unwrap_or_default();
            walls.insert((x, y), blocked);
        }

        Ok(Self {
            size,
            walls,
            position: (1, 1),
        })
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        let Some(caps) = util::last_match(MOVE, text) else {
            return Exchange::invalid(
                "Invalid format. Use 'My Choice: X' where X is N, E, S, or W",
            );
        };
        let direction = caps[1].chars().next().unwrap_or('N');
        let result = format!("My Choice: {direction}");

        let (dx, dy) = match direction {
            'N' => (-1, 0),
            'E' => (0, 1),
            'S' => (1, 0),
            _ => (0, -1),
        };
        let (x, y) = (self.position.0 + dx, self.position.1 + dy);
        if x < 1 || x > self.size || y < 1 || y > self.size {
            return Exchange::new(
                result,
                "INVALID",
                crate::game::Outcome::Invalid,
            );
        }

        let blocked = self
            .walls
            .get(&self.position)
            .map(|sides| sides.contains(&direction))
            .unwrap_or(false);
        if blocked {
            return Exchange::next(result, "BLOCKED");
        }

        self.position = (x, y);
        if x == self.size && y == self.size {
            return Exchange::win(result, "WIN");
        }
        Exchange::next(result, "MOVED")
    }

    fn is_complete(&self, _result: &str) -> bool {
        self.position == (self.size, self.size)
    }
}

/* EVALUATION */

pub struct Evaluator;

impl Evaluate for Evaluator {
    fn evaluate_game(&self, _: &Question, turns: &[Turn]) -> (bool, String) {
        let Some(last) = turns.last() else {
            return (false, "No turns played".into());
        };

        let moved = turns
            .iter()
            .filter(|turn| turn.feedback.contains("MOVED"))
            .count();
        let blocked = turns
            .iter()
            .filter(|turn| turn.feedback.contains("BLOCKED"))
            .count();
        let rejected = turns
            .iter()
            .filter(|turn| turn.feedback.contains("INVALID"))
            .count();
        let success = last.feedback.contains("WIN");
        let final_move =
            last.result.split(": ").nth(1).unwrap_or("unknown");
        let detail = format!(
            "Total moves: {}, Valid moves: {moved}, Blocked moves: \
            {blocked}, Invalid moves: {rejected}, Final move: {final_move}",
            turns.len(),
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
            r#"{"question_id": 24, "title": "DarkMaze", "scale": 2,
                "maze": {"rooms": {
                    "1,1": {"walls": ["S"]},
                    "1,2": {"walls": []},
                    "2,1": {"walls": []},
                    "2,2": {"walls": []}
                }}}"#,
        )
        .unwrap();
        Session::new(&question).unwrap()
    }

    #[test]
    fn walls_block_without_moving() {
        let mut s = session();
        let x = s.parse_response("My Choice: S");
        assert_eq!(x.feedback, "BLOCKED");
        assert_eq!(s.position, (1, 1));
    }

    #[test]
    fn open_passages_move() {
        let mut s = session();
        let x = s.parse_response("My Choice: E");
        assert_eq!(x.feedback, "MOVED");
        assert_eq!(s.position, (1, 2));
    }

    #[test]
    fn reaching_the_far_corner_wins() {
        let mut s = session();
        s.parse_response("My Choice: E");
        let x = s.parse_response("My Choice: S");
        assert_eq!(x.feedback, "WIN");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(s.is_complete(""));
    }

    #[test]
    fn leaving_the_grid_retires() {
        let mut s = session();
        let x = s.parse_response("My Choice: N");
        assert_eq!(x.feedback, "INVALID");
        assert_eq!(x.outcome, Outcome::Invalid);
    }
}
