//! # Game Utilities Module
//!
//! Helpers shared by the game handler family: the command-grammar matching
//! primitives every handler parses solver output with, per-session RNG
//! construction, and the breadth-first search used by graph-discovery games.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use regex::Captures;
use regex::Regex;

use std::collections::HashMap;
use std::collections::VecDeque;

/* COMMAND GRAMMARS */

/// Compiles a hardcoded command pattern. Game modules only ever pass string
/// literals here, so a failure is a programming error, not an input error.
pub fn grammar(pattern: &str) -> Regex {
    Regex::new(pattern).expect("Hardcoded grammar pattern failed to compile.")
}

/// Returns the captures of the LAST occurrence of `pattern` in `text`.
///
/// Solvers routinely restate their move while reasoning, so every command
/// grammar in the system takes the final occurrence as authoritative. All
/// handlers must funnel their matching through this function to keep that
/// rule uniform.
pub fn last_match<'t>(pattern: &str, text: &'t str) -> Option<Captures<'t>> {
    grammar(pattern).captures_iter(text).last()
}

/// Parses capture group `i` as a signed integer.
pub fn group_i64(caps: &Captures, i: usize) -> Option<i64> {
    caps.get(i)?.as_str().parse().ok()
}

/// Parses a whitespace-separated list of integers.
pub fn ints(text: &str) -> Option<Vec<i64>> {
    text.split_whitespace()
        .map(|tok| tok.parse().ok())
        .collect()
}

/// Parses a comma-separated list of integers.
pub fn csv_ints(text: &str) -> Option<Vec<i64>> {
    text.split(',')
        .map(|tok| tok.trim().parse().ok())
        .collect()
}

/// Joins integers with single spaces, the canonical list encoding used in
/// move summaries and feedback.
pub fn join(values: &[i64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/* RANDOMNESS */

/// Returns the single RNG a session is allowed to consume, seeded from its
/// question id. Adversary decisions, lies, and stochastic rule variants all
/// draw from this stream, which makes a run reproducible per question.
pub fn session_rng(question_id: u64) -> SmallRng {
    SmallRng::seed_from_u64(question_id)
}

/* GRAPHS */

/// A small undirected graph over integer-labeled vertices, sufficient for
/// the tree and maze discovery games.
#[derive(Clone, Debug, Default)]
pub struct Graph {
    adj: HashMap<i64, Vec<i64>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the undirected edge `u -- v`.
    pub fn add_edge(&mut self, u: i64, v: i64) {
        self.adj.entry(u).or_default().push(v);
        self.adj.entry(v).or_default().push(u);
    }

    /// Returns the neighbors of `v` in insertion order.
    pub fn neighbors(&self, v: i64) -> &[i64] {
        self.adj
            .get(&v)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn vertices(&self) -> impl Iterator<Item = i64> + '_ {
        self.adj.keys().copied()
    }

    /// Returns the BFS path from `from` to `to`, inclusive of both ends, or
    /// `None` if `to` is unreachable.
    pub fn path(&self, from: i64, to: i64) -> Option<Vec<i64>> {
        if from == to {
            return Some(vec![from]);
        }

        let mut parent: HashMap<i64, i64> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        parent.insert(from, from);
        while let Some(curr) = queue.pop_front() {
            for &next in self.neighbors(curr) {
                if parent.contains_key(&next) {
                    continue;
                }
                parent.insert(next, curr);
                if next == to {
                    let mut path = vec![to];
                    let mut node = to;
                    while node != from {
                        node = parent[&node];
                        path.push(node);
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }
        None
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn last_occurrence_of_a_command_wins() {
        let text = "I will try My Guess: AAAA first. No wait. My Guess: BBBB";
        let caps = last_match(r"My Guess:\s*([A-Za-z]+)", text).unwrap();
        assert_eq!(&caps[1], "BBBB");
    }

    #[test]
    fn absent_command_yields_no_match() {
        assert!(last_match(r"My Guess:\s*([A-Za-z]+)", "hello").is_none());
    }

    #[test]
    fn integer_lists_parse_and_join() {
        assert_eq!(ints("3 1  4").unwrap(), vec![3, 1, 4]);
        assert_eq!(csv_ints("3, 1,4").unwrap(), vec![3, 1, 4]);
        assert!(ints("3 x 4").is_none());
        assert_eq!(join(&[3, 1, 4]), "3 1 4");
    }

    #[test]
    fn session_rng_is_reproducible_per_question() {
        use rand::Rng;
        let a: u64 = session_rng(42).random();
        let b: u64 = session_rng(42).random();
        let c: u64 = session_rng(43).random();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn bfs_path_finds_the_unique_tree_path() {
        let mut g = Graph::new();
        g.add_edge(1, 2);
        g.add_edge(2, 3);
        g.add_edge(2, 4);
        g.add_edge(4, 5);
        assert_eq!(g.path(1, 5).unwrap(), vec![1, 2, 4, 5]);
        assert_eq!(g.path(3, 3).unwrap(), vec![3]);
        assert!(g.path(1, 9).is_none());
    }
}
