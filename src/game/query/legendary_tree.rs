//! # Legendary Tree Game Module
//!
//! The solver reconstructs a hidden tree. A query names two disjoint
//! non-empty vertex sets and a vertex `v`, and learns how many pairs
//! `(s, t)` across the sets have `v` on their unique tree path. The final
//! answer is the full edge set, accepted on set equality.

use anyhow::Result;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Outcome;
use crate::game::util;
use crate::game::util::Graph;
use crate::model::Question;
use crate::model::Turn;

use std::collections::BTreeSet;

/* GRAMMAR */

const QUERY: &str = r"My Query: ([\d ]+) \| ([\d ]+) \| (\d+)";
const ANSWER: &str = r"My Answer: ((?:\d-\d)(?: \d-\d)*)";

/* GAME IMPLEMENTATION */

pub struct Session {
    tree: Graph,
    edges: BTreeSet<(i64, i64)>,
    vertices: BTreeSet<i64>,
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        let listed = question.field("answer")?.as_array().ok_or_else(|| {
            anyhow::anyhow!(
                "Question {} is malformed: 'answer' is not an edge list.",
                question.question_id,
            )
        })?;

        let mut tree = Graph::new();
        let mut edges = BTreeSet::new();
        let mut vertices = BTreeSet::new();
        for edge in listed {
            let text = edge.as_str().unwrap_or_default();
            let mut digits =
                text.chars().filter_map(|c| c.to_digit(10).map(i64::from));
            let (Some(u), Some(v)) = (digits.next(), digits.next()) else {
                anyhow::bail!(
                    "Question {} is malformed: edge '{text}' is not a \
                    digit pair.",
                    question.question_id,
                );
            };
            tree.add_edge(u, v);
            edges.insert((u.min(v), u.max(v)));
            vertices.insert(u);
            vertices.insert(v);
        }

        Ok(Self {
            tree,
            edges,
            vertices,
        })
    }

    fn paths_through(&self, s: &BTreeSet<i64>, t: &BTreeSet<i64>, v: i64) -> usize {
        s.iter()
            .flat_map(|&a| t.iter().map(move |&b| (a, b)))
            .filter(|&(a, b)| {
                self.tree
                    .path(a, b)
                    .map(|path| path.contains(&v))
                    .unwrap_or(false)
            })
            .count()
    }

    fn parse_edges(text: &str) -> Option<BTreeSet<(i64, i64)>> {
        text.split_whitespace()
            .map(|token| {
                let (u, v) = token.split_once('-')?;
                let (u, v) = (u.parse::<i64>().ok()?, v.parse::<i64>().ok()?);
                Some((u.min(v), u.max(v)))
            })
            .collect()
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if let Some(caps) = util::last_match(QUERY, text) {
            let (Some(s), Some(t), Some(v)) = (
                util::ints(&caps[1]),
                util::ints(&caps[2]),
                util::group_i64(&caps, 3),
            ) else {
                return Exchange::next("Invalid", "Invalid numbers in query");
            };
            let s: BTreeSet<i64> = s.into_iter().collect();
            let t: BTreeSet<i64> = t.into_iter().collect();

            let top = self.vertices.iter().max().copied().unwrap_or(0);
            if s.is_empty() || t.is_empty() {
                return Exchange::next("Invalid", "Sets cannot be empty");
            }
            if !s.is_subset(&self.vertices) || !t.is_subset(&self.vertices) {
                return Exchange::next(
                    "Invalid",
                    format!("Vertices must be in range [1,{top}]"),
                );
            }
            if !s.is_disjoint(&t) {
                return Exchange::next("Invalid", "Sets must be disjoint");
            }
            if !self.vertices.contains(&v) {
                return Exchange::next(
                    "Invalid",
                    format!("Vertex {v} not in tree"),
                );
            }

            let count = self.paths_through(&s, &t, v);
            let side = |set: &BTreeSet<i64>| {
                set.iter()
                    .map(|x| x.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            };
            return Exchange::next(
                format!("Query: {} | {} | {v}", side(&s), side(&t)),
                count.to_string(),
            );
        }

        if let Some(caps) = util::last_match(ANSWER, text) {
            let Some(submitted) = Self::parse_edges(&caps[1]) else {
                return Exchange::next("Invalid", "Invalid answer format");
            };
            let listed = submitted
                .iter()
                .map(|(u, v)| format!("{u}-{v}"))
                .collect::<Vec<_>>()
                .join(" ");

            let top = self.vertices.iter().max().copied().unwrap_or(0);
            let expected = self.vertices.len().saturating_sub(1);
            if caps[1].split_whitespace().count() != expected {
                return Exchange::next(
                    format!("Answer: {listed}"),
                    "Incorrect",
                );
            }
            if submitted.iter().any(|(u, v)| {
                !self.vertices.contains(u) || !self.vertices.contains(v)
            }) {
                return Exchange::next(
                    "Invalid",
                    format!("Vertices must be in range [1,{top}]"),
                );
            }

            let correct = submitted == self.edges;
            let outcome = if correct { Outcome::Win } else { Outcome::Continue };
            let verdict = if correct { "Correct" } else { "Incorrect" };
            return Exchange::new(format!("Answer: {listed}"), verdict, outcome);
        }

        Exchange::next("Invalid", "Please use correct format")
    }

    fn is_complete(&self, result: &str) -> bool {
        result
            .strip_prefix("Answer: ")
            .and_then(Self::parse_edges)
            .map(|submitted| submitted == self.edges)
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
        let success = last.feedback == "Correct";
        (success, format!("Final guess: {}", last.result))
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;

    fn session() -> Session {
        // The path 1 - 2 - 3 - 4.
        let question: Question = serde_json::from_str(
            r#"{"question_id": 13, "title": "LegendaryTree",
                "answer": ["12", "23", "34"]}"#,
        )
        .unwrap();
        Session::new(&question).unwrap()
    }

    #[test]
    fn query_counts_paths_through_the_vertex() {
        let mut s = session();
        // Paths 1->3 and 1->4 pass through 2; 2 is an endpoint of 1->2.
        let x = s.parse_response("My Query: 1 | 3 4 | 2");
        assert_eq!(x.feedback, "2");

        let x = s.parse_response("My Query: 1 2 | 4 | 3");
        assert_eq!(x.feedback, "2");

        let x = s.parse_response("My Query: 1 | 2 | 4");
        assert_eq!(x.feedback, "0");
    }

    #[test]
    fn overlapping_sets_burn_the_turn() {
        let mut s = session();
        let x = s.parse_response("My Query: 1 2 | 2 3 | 1");
        assert_eq!(x.result, "Invalid");
        assert_eq!(x.feedback, "Sets must be disjoint");
        assert_eq!(x.outcome, Outcome::Continue);
    }

    #[test]
    fn edge_set_is_accepted_in_any_order() {
        let mut s = session();
        let x = s.parse_response("My Answer: 3-4 2-3 2-1");
        assert_eq!(x.feedback, "Correct");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(s.is_complete(&x.result));
    }

    #[test]
    fn wrong_edge_count_is_incorrect() {
        let mut s = session();
        let x = s.parse_response("My Answer: 1-2 2-3");
        assert_eq!(x.feedback, "Incorrect");
        assert_eq!(x.outcome, Outcome::Continue);
    }

    #[test]
    fn wrong_edges_are_incorrect() {
        let mut s = session();
        let x = s.parse_response("My Answer: 1-2 2-3 2-4");
        assert_eq!(x.feedback, "Incorrect");
        assert_eq!(x.outcome, Outcome::Continue);
    }
}
