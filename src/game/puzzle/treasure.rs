//! # Treasure Hunt Game Module
//!
//! The solver explores a hidden graph by picking one of the current
//! vertex's neighbors, presented in a freshly shuffled order each round as
//! `R d deg1 flag1 deg2 flag2 ...`. Every visited vertex is flagged; the
//! hunt is won once all vertices carry a flag.

use anyhow::Result;
use rand::seq::SliceRandom;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Rng;
use crate::game::util;
use crate::game::util::Graph;
use crate::model::Question;
use crate::model::Turn;

use std::collections::HashSet;

/* GRAMMAR */

const CHOICE: &str = r"My Choice:\s*(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    graph: Graph,
    vertices: i64,
    position: i64,
    flags: HashSet<i64>,
    listing: Option<Vec<i64>>,
    rng: Rng,
}

impl Session {
    pub fn new(question: &Question, rng: Rng) -> Result<Self> {
        let mut graph = Graph::new();
        for (u, v) in question.pair_list_field("graph")? {
            graph.add_edge(u, v);
        }
        Ok(Self {
            graph,
            vertices: question.scale_u64()? as i64,
            position: 1,
            flags: HashSet::from([1]),
            listing: None,
            rng,
        })
    }

    /// Shuffles the current neighbors, remembers the order for the next
    /// choice, and renders the `R d deg flag ...` report.
    fn survey(&mut self) -> String {
        let mut neighbors = self.graph.neighbors(self.position).to_vec();
        neighbors.shuffle(&mut self.rng);

        let mut info = vec![format!("R {}", neighbors.len())];
        for &v in &neighbors {
            info.push(self.graph.neighbors(v).len().to_string());
            info.push(if self.flags.contains(&v) { "1" } else { "0" }.into());
        }
        self.listing = Some(neighbors);
        info.join(" ")
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        let Some(caps) = util::last_match(CHOICE, text) else {
            return Exchange::invalid("Invalid format. Use 'My Choice: X'");
        };
        let Some(choice) = util::group_i64(&caps, 1) else {
            return Exchange::invalid("Invalid choice");
        };

        let Some(listing) = self.listing.clone() else {
            return Exchange::next("Initial", self.survey());
        };

        if choice < 1 || choice > listing.len() as i64 {
            return Exchange::invalid("Invalid choice number");
        }

        self.position = listing[choice as usize - 1];
        self.flags.insert(self.position);
        let result = format!("My Choice: {choice}");
        if self.flags.len() as i64 == self.vertices {
            return Exchange::win(result, "Win");
        }

        let report = self.survey();
        Exchange::next(result, report)
    }

    fn is_complete(&self, _result: &str) -> bool {
        self.flags.len() as i64 == self.vertices
    }
}

/* EVALUATION */

pub struct Evaluator;

impl Evaluate for Evaluator {
    fn evaluate_game(&self, _: &Question, turns: &[Turn]) -> (bool, String) {
        if turns.is_empty() {
            return (false, "No turns played".into());
        }

        let mut moves = Vec::new();
        for (i, turn) in turns.iter().enumerate() {
            if let Some(choice) = turn.result.strip_prefix("My Choice: ") {
                moves.push(format!(
                    "Turn {} - Selected choice {choice}",
                    i + 1,
                ));
            }
            let lowered = turn.feedback.to_lowercase();
            if lowered.contains("win") {
                return (true, format!("Win!\n{}", moves.join("\n")));
            }
            if lowered.contains("invalid") {
                return (
                    false,
                    format!("Lost: Invalid move\n{}", moves.join("\n")),
                );
            }
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
        // Triangle on three vertices.
        let question: Question = serde_json::from_str(
            r#"{"question_id": 30, "title": "TreasureHunt", "scale": 3,
                "graph": [[1, 2], [2, 3], [1, 3]]}"#,
        )
        .unwrap();
        Session::new(&question, util::session_rng(30)).unwrap()
    }

    #[test]
    fn first_exchange_surveys_the_start_vertex() {
        let mut s = session();
        let x = s.parse_response("My Choice: 1");
        assert_eq!(x.result, "Initial");
        assert!(x.feedback.starts_with("R 2 "));
        // Both neighbors have degree 2 and no flag yet.
        let fields: Vec<&str> = x.feedback.split(' ').collect();
        assert_eq!(fields.len(), 6);
        assert_eq!(&fields[2..], &["2", "0", "2", "0"]);
    }

    #[test]
    fn choices_index_into_the_last_listing() {
        let mut s = session();
        s.parse_response("My Choice: 1");
        let listed = s.listing.clone().unwrap();
        let x = s.parse_response("My Choice: 2");
        assert_eq!(s.position, listed[1]);
        assert_eq!(x.outcome, Outcome::Continue);
    }

    #[test]
    fn flagging_every_vertex_wins() {
        let mut s = session();
        s.parse_response("My Choice: 1");
        // Greedily walk to unflagged neighbors; a triangle needs two moves.
        for _ in 0..2 {
            let listing = s.listing.clone().unwrap();
            let slot = listing
                .iter()
                .position(|v| !s.flags.contains(v))
                .expect("an unflagged neighbor must remain");
            let x = s.parse_response(&format!("My Choice: {}", slot + 1));
            if x.outcome == Outcome::Win {
                assert_eq!(x.feedback, "Win");
                assert!(s.is_complete(""));
                return;
            }
        }
        panic!("the triangle should be covered in two moves");
    }

    #[test]
    fn out_of_listing_choice_retires() {
        let mut s = session();
        s.parse_response("My Choice: 1");
        let x = s.parse_response("My Choice: 5");
        assert_eq!(x.outcome, Outcome::Invalid);
    }
}
