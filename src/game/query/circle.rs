//! # Circle-Finding Game Module
//!
//! A hidden circle is probed with rays from the origin: each query point
//! defines a ray whose distance to the circle is reported with ten decimal
//! places. The answer must name the exact center and radius.

use anyhow::Result;

use crate::game::Evaluate;
use crate::game::Exchange;
use crate::game::Handler;
use crate::game::Outcome;
use crate::game::util;
use crate::model::Question;
use crate::model::Turn;

/* GRAMMAR */

const QUERY: &str = r"My Query:\s*(-?\d+)\s+(-?\d+)";
const ANSWER: &str = r"My Answer:\s*(-?\d+)\s+(-?\d+)\s+(\d+)";

/* GAME IMPLEMENTATION */

pub struct Session {
    center: (i64, i64),
    radius: i64,
}

impl Session {
    pub fn new(question: &Question) -> Result<Self> {
        let center = question.int_list_field("center")?;
        let center = match center.as_slice() {
            [x, y] => (*x, *y),
            _ => anyhow::bail!(
                "Question {} is malformed: 'center' is not a point.",
                question.question_id,
            ),
        };
        Ok(Self {
            center,
            radius: question.i64_field("radius")?,
        })
    }

    /// Distance from the ray through `(xq, yq)` to the circle boundary. A
    /// center behind the ray measures from the origin instead of from the
    /// supporting line.
    fn ray_distance(&self, xq: i64, yq: i64) -> f64 {
        let (dx, dy) = (xq as f64, yq as f64);
        let length = (dx * dx + dy * dy).sqrt();
        let (ux, uy) = (dx / length, dy / length);
        let (vx, vy) = (self.center.0 as f64, self.center.1 as f64);

        let projection = vx * ux + vy * uy;
        let distance = if projection < 0.0 {
            (vx * vx + vy * vy).sqrt() - self.radius as f64
        } else {
            (vx * dy - vy * dx).abs() / length - self.radius as f64
        };
        distance.max(0.0)
    }
}

impl Handler for Session {
    fn parse_response(&mut self, text: &str) -> Exchange {
        if let Some(caps) = util::last_match(QUERY, text) {
            let (Some(xq), Some(yq)) =
                (util::group_i64(&caps, 1), util::group_i64(&caps, 2))
            else {
                return Exchange::next("Invalid", "Invalid query point");
            };
            if xq == 0 && yq == 0 {
                return Exchange::next(
                    "Invalid",
                    "Query point cannot be origin (0,0)",
                );
            }

            return Exchange::next(
                format!("{xq} {yq}"),
                format!("{:.10}", self.ray_distance(xq, yq)),
            );
        }

        if let Some(caps) = util::last_match(ANSWER, text) {
            let (Some(xc), Some(yc), Some(rc)) = (
                util::group_i64(&caps, 1),
                util::group_i64(&caps, 2),
                util::group_i64(&caps, 3),
            ) else {
                return Exchange::next("Invalid", "Invalid answer");
            };

            let correct = (xc, yc) == self.center && rc == self.radius;
            let outcome = if correct { Outcome::Win } else { Outcome::Continue };
            let verdict = if correct { "Correct" } else { "Incorrect" };
            return Exchange::new(format!("{xc} {yc} {rc}"), verdict, outcome);
        }

        Exchange::new(
            "Invalid",
            "Your response must be either 'My Query: xq yq' or \
            'My Answer: xc yc rc'",
            Outcome::Continue,
        )
    }

    fn is_complete(&self, result: &str) -> bool {
        util::ints(result)
            .map(|parts| match parts.as_slice() {
                [xc, yc, rc] => {
                    (*xc, *yc) == self.center && *rc == self.radius
                },
                _ => false,
            })
            .unwrap_or(false)
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
        let Some(last) = turns.last() else {
            return (false, "No turns played".into());
        };
        if last.feedback != "Correct" && last.feedback != "Incorrect" {
            return (
                false,
                "Game did not end with an answer submission".into(),
            );
        }

        let queries = turns
            .iter()
            .filter(|turn| turn.result.split_whitespace().count() == 2)
            .count();
        let Some(parts) =
            util::ints(&last.result).filter(|parts| parts.len() == 3)
        else {
            return (false, "Unparseable final answer".into());
        };
        let (xc, yc, rc) = (parts[0], parts[1], parts[2]);

        if let Ok(bound) = question.scale_u64() {
            let bound = bound as i64;
            if xc.abs().max(yc.abs()).max(rc.abs()) > bound {
                return (
                    false,
                    format!("Parameters exceed allowed range: ±{bound}"),
                );
            }
        }

        let success = last.feedback == "Correct";
        let detail = format!(
            "Final answer: center=({xc},{yc}), radius={rc}, \
            Queries used: {queries}",
        );
        (success, detail)
    }
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;

    fn session() -> Session {
        let question: Question = serde_json::from_str(
            r#"{"question_id": 10, "title": "CircleFinding",
                "scale": 100, "center": [3, 4], "radius": 2}"#,
        )
        .unwrap();
        Session::new(&question).unwrap()
    }

    #[test]
    fn ray_through_the_center_reports_zero() {
        let mut s = session();
        let x = s.parse_response("My Query: 3 4");
        assert_eq!(x.feedback, "0.0000000000");
    }

    #[test]
    fn opposite_ray_measures_from_the_origin() {
        let mut s = session();
        // |center| = 5, radius 2, so the gap is 3.
        let x = s.parse_response("My Query: -3 -4");
        assert_eq!(x.feedback, "3.0000000000");
    }

    #[test]
    fn origin_query_burns_the_turn() {
        let mut s = session();
        let x = s.parse_response("My Query: 0 0");
        assert_eq!(x.result, "Invalid");
        assert_eq!(x.outcome, Outcome::Continue);
    }

    #[test]
    fn exact_parameters_win() {
        let mut s = session();
        let x = s.parse_response("My Answer: 3 4 2");
        assert_eq!(x.feedback, "Correct");
        assert_eq!(x.outcome, Outcome::Win);
        assert!(s.is_complete("3 4 2"));

        let mut s = session();
        let x = s.parse_response("My Answer: 3 4 3");
        assert_eq!(x.feedback, "Incorrect");
        assert_eq!(x.outcome, Outcome::Continue);
    }
}
