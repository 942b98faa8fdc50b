//! # Cactus Search Game Module
//!
//! A target vertex hides somewhere in a cactus graph. Every wrong guess is
//! answered with `GO u`, where `u` is the first step of a shortest path
//! from the guess toward the target.

use anyhow::Result;
use rand::Rng as _;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Rng;
use crate::game::util;
use crate::game::util::Graph;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const GUESS: &str = r"My Guess:\s*(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    graph: Graph,
    vertices: i64,
    target: i64,
}

impl Session {
    pub fn new(question: &Question, mut rng: Rng) -> Result<Self> {
        let vertices = question.scale_u64()? as i64;
        let paths = question
            .field("graph")?
            .get("paths")
            .and_then(|v| v.as_array())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Question {} is malformed: 'graph' has no paths.",
                    question.question_id,
                )
            })?;

        let mut graph = Graph::new();
        for path in paths {
            let stops: Vec<i64> = path
                .as_array()
                .map(|nodes| {
                    nodes.iter().filter_map(|n| n.as_i64()).collect()
                })
                .unwrap_or_default();
            for pair in stops.windows(2) {
                graph.add_edge(pair[0], pair[1]);
            }
        }

        let target = rng.random_range(1..=vertices);
        Ok(Self {
            graph,
            vertices,
            target,
        })
    }

    fn advice(&self, from: i64) -> i64 {
        self.graph
            .path(from, self.target)
            .and_then(|path| path.get(1).copied())
            .unwrap_or(from)
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        let Some(caps) = util::last_match(GUESS, text) else {
            return Exchange::invalid("Invalid format. Use 'My Guess: X'");
        };
        let Some(guess) = util::group_i64(&caps, 1) else {
            return Exchange::invalid("Invalid guess");
        };
        if !(1 <= guess && guess <= self.vertices) {
            return Exchange::invalid(format!(
                "Invalid vertex number. Must be between 1 and {}",
                self.vertices,
            ));
        }

        if guess == self.target {
            return Exchange::win(format!("My Guess: {guess}"), "Win");
        }

        Exchange::next(
            format!("My Guess: {guess}"),
            format!("GO {}", self.advice(guess)),
        )
    }

    fn is_complete(&self, result: &str) -> bool {
        result
            .strip_prefix("My Guess: ")
            .and_then(|g| g.parse::<i64>().ok())
            .map(|guess| guess == self.target)
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
        if !last.result.contains("Guess:") {
            return (false, "Game did not end with a guess".into());
        }

        let guesses = turns
            .iter()
            .filter(|turn| turn.result.contains("Guess:"))
            .count();
        let success = last.feedback == "Win";
        let submitted = last.result.split(": ").nth(1).unwrap_or_default();
        let detail = format!(
            "Guesses made: {guesses}, Final guess: {submitted}, Result: {}",
            if success { "Success" } else { "Failed" },
        );
        (success, detail)
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;

    fn session() -> Session {
        // A five-vertex path; the seed picks some target in 1..=5.
        let question: Question = serde_json::from_str(
            r#"{"question_id": 21, "title": "CactusSearch", "scale": 5,
                "graph": {"paths": [[1, 2, 3, 4, 5]]}}"#,
        )
        .unwrap();
        Session::new(&question, util::session_rng(21)).unwrap()
    }

    #[test]
    fn advice_points_one_step_toward_the_target() {
        let mut s = session();
        s.target = 5;
        let x = s.parse_response("My Guess: 1");
        assert_eq!(x.feedback, "GO 2");

        let x = s.parse_response("My Guess: 4");
        assert_eq!(x.feedback, "GO 5");
    }

    #[test]
    fn guessing_the_target_wins() {
        let mut s = session();
        s.target = 3;
        let x = s.parse_response("My Guess: 3");
        assert_eq!(x.feedback, "Win");
        assert_eq!(x.outcome, crate::game::Outcome::Win);
        assert!(s.is_complete("My Guess: 3"));
    }

    #[test]
    fn target_is_drawn_from_the_session_rng() {
        let a = session().target;
        let b = session().target;
        assert_eq!(a, b);
        assert!((1..=5).contains(&a));
    }

    #[test]
    fn out_of_range_guess_retires() {
        let mut s = session();
        let x = s.parse_response("My Guess: 9");
        assert_eq!(x.outcome, crate::game::Outcome::Invalid);
    }
}
