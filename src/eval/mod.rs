//! # Evaluation Driver Module
//!
//! Post-hoc scoring: pairs every question with its recovered transcript,
//! applies the kind-matched evaluator, aggregates accuracy and turn counts,
//! writes the report JSON, and prints a short colored summary.

use anyhow::Context;
use anyhow::Result;
use colored::Colorize;
use log::info;

use std::collections::BTreeMap;
use std::path::Path;

use crate::game::GameKind;
use crate::model::EvalReport;
use crate::model::Question;
use crate::model::QuestionReport;
use crate::model::TranscriptRecord;

/* EVALUATION */

/// Scores `questions` against `transcripts` as games of `kind`. Questions
/// without a transcript score as failures with zero turns.
pub fn score(
    kind: GameKind,
    questions: &[Question],
    transcripts: &BTreeMap<u64, TranscriptRecord>,
) -> EvalReport {
    let evaluator = kind.evaluator();
    let mut results = Vec::with_capacity(questions.len());
    let mut successful = 0;

    for question in questions {
        let report = match transcripts.get(&question.question_id) {
            None => QuestionReport {
                question_id: question.question_id,
                success: false,
                detail: "No answer found".into(),
                num_turns: 0,
            },
            Some(record) => {
                let (success, detail) =
                    evaluator.evaluate_game(question, &record.turns);
                QuestionReport {
                    question_id: question.question_id,
                    success,
                    detail,
                    num_turns: record.turns.len(),
                }
            },
        };
        if report.success {
            successful += 1;
        }
        results.push(report);
    }

    let total = results.len();
    let accuracy = if total > 0 {
        successful as f64 / total as f64
    } else {
        0.0
    };
    let average_turns = if total > 0 {
        results.iter().map(|r| r.num_turns).sum::<usize>() as f64
            / total as f64
    } else {
        0.0
    };

    EvalReport {
        game_type: kind.name().to_owned(),
        total_questions: total,
        successful_games: successful,
        accuracy,
        average_turns,
        detailed_results: results,
    }
}

/// Writes `report` as a single indented JSON document.
pub fn write_report(report: &EvalReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create {}.", parent.display())
            })?;
        }
    }
    let body = serde_json::to_string_pretty(report)?;
    std::fs::write(path, body)
        .with_context(|| format!("Failed to write {}.", path.display()))?;
    info!("Wrote evaluation report to {}.", path.display());
    Ok(())
}

/// Prints the per-kind summary the driver ends with.
pub fn print_summary(report: &EvalReport) {
    println!(
        "\nEvaluation Results for {}:",
        report.game_type.bold(),
    );
    println!("Total Questions: {}", report.total_questions);
    println!("Successful Games: {}", report.successful_games);

    let accuracy = format!("{:.2}%", report.accuracy * 100.0);
    let accuracy = if report.accuracy >= 0.5 {
        accuracy.green()
    } else {
        accuracy.red()
    };
    println!("Accuracy: {accuracy}");
    println!("Average Turns: {:.2}", report.average_turns);
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;
    use crate::model::Turn;

    fn wordle_question(question_id: u64) -> Question {
        serde_json::from_str(&format!(
            r#"{{"question_id": {question_id}, "title": "Wordle",
                "answer": "ABCD"}}"#,
        ))
        .unwrap()
    }

    fn record(question_id: u64, feedback: &str) -> TranscriptRecord {
        TranscriptRecord {
            question_id,
            turns: vec![Turn {
                round: 1,
                raw_output: String::new(),
                output: String::new(),
                result: "ABCD".into(),
                feedback: feedback.into(),
            }],
        }
    }

    #[test]
    fn scoring_aggregates_success_and_turns() {
        let questions =
            vec![wordle_question(1), wordle_question(2), wordle_question(3)];
        let transcripts = BTreeMap::from([
            (1, record(1, "RRRR")),
            (2, record(2, "RRWW")),
        ]);

        let report = score(GameKind::Wordle, &questions, &transcripts);
        assert_eq!(report.total_questions, 3);
        assert_eq!(report.successful_games, 1);
        assert!((report.accuracy - 1.0 / 3.0).abs() < 1e-9);
        assert!((report.average_turns - 2.0 / 3.0).abs() < 1e-9);

        let missing = &report.detailed_results[2];
        assert!(!missing.success);
        assert_eq!(missing.detail, "No answer found");
        assert_eq!(missing.num_turns, 0);
    }

    #[test]
    fn reports_round_trip_through_disk() -> Result<()> {
        let questions = vec![wordle_question(1)];
        let transcripts = BTreeMap::from([(1, record(1, "RRRR"))]);
        let report = score(GameKind::Wordle, &questions, &transcripts);

        let dir = tempfile::tempdir()?;
        let path = dir.path().join("eval.json");
        write_report(&report, &path)?;

        let read: EvalReport =
            serde_json::from_str(&std::fs::read_to_string(&path)?)?;
        assert_eq!(read.game_type, "Wordle");
        assert_eq!(read.successful_games, 1);
        Ok(())
    }
}
