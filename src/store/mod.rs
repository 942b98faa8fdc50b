//! # Transcript Store Module
//!
//! Append-only persistence for session transcripts. Every write is a whole
//! record (one JSON object per line), so an interrupted run leaves at worst
//! a truncated final line; recovery keeps the last intact record per
//! question and compaction rewrites the file to exactly one sorted record
//! per question.

use anyhow::Context;
use anyhow::Result;
use log::warn;

use std::collections::BTreeMap;
use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use crate::model::TranscriptRecord;

/* DEFINITIONS */

/// Single-writer handle to the answer file. The scheduler appends one
/// record per session per round; nothing else writes to the file during a
/// run.
pub struct Store {
    path: PathBuf,
    file: File,
}

impl Store {
    /// Opens (or creates) the store at `path` for appending.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create {}.", parent.display())
                })?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| {
                format!("Failed to open {}.", path.display())
            })?;
        Ok(Self {
            path: path.to_owned(),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record. Write failures are logged and swallowed: the
    /// next successful write re-establishes the session's full state, and
    /// compaction drops the stale line.
    pub fn append(&mut self, record: &TranscriptRecord) {
        let outcome = serde_json::to_string(record)
            .map_err(anyhow::Error::from)
            .and_then(|line| {
                writeln!(self.file, "{line}").map_err(anyhow::Error::from)
            });
        if let Err(e) = outcome {
            warn!(
                "Failed to persist question {}: {e}",
                record.question_id,
            );
        }
    }
}

/* RECOVERY */

/// Loads the store at `path`, grouping by question id and keeping the last
/// record for each. Corrupt or truncated lines are skipped. A missing file
/// recovers to an empty map.
pub fn recover(path: &Path) -> Result<BTreeMap<u64, TranscriptRecord>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(BTreeMap::new());
        },
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Failed to read {}.", path.display())
            });
        },
    };

    let mut records = BTreeMap::new();
    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<TranscriptRecord>(line) {
            Ok(record) => {
                records.insert(record.question_id, record);
            },
            Err(e) => {
                warn!("Skipping corrupt transcript line: {e}");
            },
        }
    }
    Ok(records)
}

/// Rewrites the store with exactly one record per question id (the latest
/// write wins), ordered by ascending id.
pub fn compact(path: &Path) -> Result<()> {
    let records = recover(path)?;
    let mut lines = String::new();
    for record in records.values() {
        lines.push_str(&serde_json::to_string(record)?);
        lines.push('\n');
    }
    std::fs::write(path, lines)
        .with_context(|| format!("Failed to rewrite {}.", path.display()))
}

/* TESTS */

#[cfg(test)]
mod test {

    use super::*;
    use crate::model::Turn;

    fn record(question_id: u64, rounds: u64) -> TranscriptRecord {
        TranscriptRecord {
            question_id,
            turns: (1..=rounds)
                .map(|round| Turn {
                    round,
                    raw_output: format!("raw {round}"),
                    output: format!("out {round}"),
                    result: format!("Guess: {round}"),
                    feedback: "Incorrect".into(),
                })
                .collect(),
        }
    }

    #[test]
    fn recovery_keeps_the_last_record_per_question() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("answers.jsonl");

        let mut store = Store::open(&path)?;
        store.append(&record(7, 1));
        store.append(&record(3, 1));
        store.append(&record(7, 2));

        let recovered = recover(&path)?;
        assert_eq!(recovered.len(), 2);
        assert_eq!(recovered[&7].turns.len(), 2);
        assert_eq!(recovered[&3].turns.len(), 1);
        Ok(())
    }

    #[test]
    fn corrupt_and_truncated_lines_are_skipped() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("answers.jsonl");

        let mut store = Store::open(&path)?;
        store.append(&record(1, 1));
        {
            use std::io::Write as _;
            let mut file =
                OpenOptions::new().append(true).open(&path)?;
            writeln!(file, "{{\"question_id\": 2, \"turns\"")?;
            writeln!(file, "not json at all")?;
        }
        store.append(&record(2, 3));

        let recovered = recover(&path)?;
        assert_eq!(recovered.len(), 2);
        assert_eq!(recovered[&2].turns.len(), 3);
        Ok(())
    }

    #[test]
    fn compaction_sorts_and_deduplicates() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("answers.jsonl");

        let mut store = Store::open(&path)?;
        store.append(&record(9, 1));
        store.append(&record(4, 1));
        store.append(&record(9, 2));
        drop(store);

        compact(&path)?;
        let contents = std::fs::read_to_string(&path)?;
        let ids: Vec<u64> = contents
            .lines()
            .map(|line| {
                serde_json::from_str::<TranscriptRecord>(line)
                    .unwrap()
                    .question_id
            })
            .collect();
        assert_eq!(ids, vec![4, 9]);

        let recovered = recover(&path)?;
        assert_eq!(recovered[&9].turns.len(), 2);
        Ok(())
    }

    #[test]
    fn a_missing_file_recovers_empty() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nothing-here.jsonl");
        assert!(recover(&path)?.is_empty());
        Ok(())
    }
}
