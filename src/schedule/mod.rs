//! # Round Scheduler Module
//!
//! Drives every live session through rounds against one shared generation
//! backend. Each round batches the prompts of all due sessions into one
//! `generate` call (falling back to per-prompt calls if the batch fails),
//! dispatches completions through the owning handlers, persists each turn,
//! and retires sessions on terminal outcomes or round caps.

use anyhow::Result;
use log::debug;
use log::info;
use log::warn;

use std::collections::BTreeMap;

use crate::game::GameKind;
use crate::game::Handler;
use crate::game::Outcome;
use crate::model::Category;
use crate::model::Question;
use crate::model::TranscriptRecord;
use crate::model::Turn;
use crate::store::Store;

pub mod backend;

use backend::Generate;

/* DEFINITIONS */

/// Run-wide scheduling knobs.
#[derive(Clone, Debug)]
pub struct Options {
    /// Round cap for non-strategic categories. Strategic sessions are
    /// capped by their question's own `turns` field instead.
    pub max_round: u64,

    /// Seed each prompt with an opening think tag.
    pub think_mode: bool,
}

/// One question bound to its handler and its append-only turn log.
pub struct Session {
    question: Question,
    handler: Box<dyn Handler>,
    turns: Vec<Turn>,
    next_round: u64,
    alive: bool,
}

impl Session {
    /// Builds or resumes the session for `question`. Returns `None` when
    /// the recovered transcript shows the session already finished.
    fn prepare(
        question: &Question,
        category: Category,
        recovered: &BTreeMap<u64, TranscriptRecord>,
        options: &Options,
    ) -> Result<Option<Self>> {
        let kind = GameKind::from_title(&question.title)?;
        let handler = kind.session(question)?;
        let turns = recovered
            .get(&question.question_id)
            .map(|record| record.turns.clone())
            .unwrap_or_default();

        let cap = if category.strategic() {
            question.turns.unwrap_or(0)
        } else {
            options.max_round
        };
        let finished = match turns.last() {
            None => false,
            Some(last) => {
                handler.is_complete(&last.result)
                    || terminal_token(&last.feedback)
                    || turns.len() as u64 >= cap
            },
        };
        if finished {
            debug!(
                "Question {} already finished; skipping.",
                question.question_id,
            );
            return Ok(None);
        }

        Ok(Some(Self {
            next_round: turns.len() as u64 + 1,
            question: question.clone(),
            handler,
            turns,
            alive: true,
        }))
    }

    fn cap(&self, category: Category, options: &Options) -> u64 {
        if category.strategic() {
            self.question.turns.unwrap_or(0)
        } else {
            options.max_round
        }
    }

    /// The full conversation-shaped prompt for the next round: the
    /// question prompt (with the round budget disclosed for non-strategic
    /// categories), past exchanges, and optionally a think-tag seed.
    fn compose(&self, category: Category, options: &Options) -> String {
        let mut text = if category.strategic() {
            self.question.prompt.clone()
        } else {
            disclose_budget(&self.question.prompt, options.max_round)
        };

        for turn in &self.turns {
            text.push_str("\n\n");
            text.push_str(&turn.output);
            text.push_str("\n\n");
            text.push_str(&turn.feedback);
        }
        if options.think_mode {
            text.push_str("\n\n<think>\n");
        }
        text
    }

    /// Feeds one completion through the handler and logs the turn.
    /// Returns the turn's outcome.
    fn dispatch(&mut self, raw: &str, store: &mut Store) -> Outcome {
        let raw = raw.trim();
        let output = strip_reasoning(raw);
        let exchange = self.handler.parse_response(output);

        self.turns.push(Turn {
            round: self.turns.len() as u64 + 1,
            raw_output: raw.to_owned(),
            output: output.to_owned(),
            result: exchange.result,
            feedback: exchange.feedback,
        });
        store.append(&TranscriptRecord {
            question_id: self.question.question_id,
            turns: self.turns.clone(),
        });
        exchange.outcome
    }
}

/// Inserts the round-budget disclosure ahead of the prompt's closing
/// "Ready to start" call to action, if present.
fn disclose_budget(prompt: &str, max_round: u64) -> String {
    let disclosure = format!(
        "\n- You have {max_round} attempts to find the answer, which means \
        you need to output your answer in the {max_round}-th round or \
        before this round.",
    );
    match prompt.find("\n\nReady to start") {
        Some(at) => {
            let mut text = String::with_capacity(
                prompt.len() + disclosure.len(),
            );
            text.push_str(&prompt[..at]);
            text.push_str(&disclosure);
            text.push_str(&prompt[at..]);
            text
        },
        None => prompt.to_owned(),
    }
}

/// Drops everything up to and including the LAST closing think tag.
fn strip_reasoning(raw: &str) -> &str {
    raw.rsplit("</think>").next().unwrap_or(raw).trim()
}

/// True iff `feedback` carries a terminal token. Only used when resuming
/// from persisted text; live rounds consume the structured outcome.
fn terminal_token(feedback: &str) -> bool {
    let lowered = feedback.to_lowercase();
    ["win", "lose", "invalid"]
        .iter()
        .any(|token| lowered.contains(token))
}

/* SCHEDULING */

/// Drives `questions` to completion and leaves their transcripts in the
/// store. Returns the number of sessions that played at least one round
/// this run.
pub async fn run(
    category: Category,
    questions: &[Question],
    backend: &dyn Generate,
    store: &mut Store,
    options: &Options,
) -> Result<usize> {
    let recovered = crate::store::recover(store.path())?;
    let mut sessions = Vec::new();
    for question in questions {
        if let Some(session) =
            Session::prepare(question, category, &recovered, options)?
        {
            sessions.push(session);
        }
    }
    let scheduled = sessions.len();
    info!(
        "Scheduling {scheduled} of {} questions ({category}).",
        questions.len(),
    );

    let mut round: u64 = 0;
    loop {
        round += 1;
        if !category.strategic() && round > options.max_round {
            break;
        }

        let due: Vec<usize> = sessions
            .iter()
            .enumerate()
            .filter(|(_, s)| {
                s.alive
                    && s.next_round == round
                    && (s.turns.len() as u64) < s.cap(category, options)
            })
            .map(|(i, _)| i)
            .collect();
        if due.is_empty() {
            if sessions.iter().all(|s| {
                !s.alive
                    || s.next_round <= round
                    || s.turns.len() as u64 >= s.cap(category, options)
            }) {
                break;
            }
            continue;
        }
        debug!("Round {round}: {} sessions due.", due.len());

        let prompts: Vec<String> = due
            .iter()
            .map(|&i| sessions[i].compose(category, options))
            .collect();

        // One batched call; on failure, each prompt individually. A
        // session whose individual call also fails is retired without a
        // recorded turn.
        let completions: Vec<Option<String>> =
            match backend.generate(&prompts).await {
                Ok(batch) if batch.len() == prompts.len() => {
                    batch.into_iter().map(Some).collect()
                },
                Ok(batch) => {
                    warn!(
                        "Batch returned {} completions for {} prompts; \
                        falling back to individual calls.",
                        batch.len(),
                        prompts.len(),
                    );
                    fallback(backend, &prompts).await
                },
                Err(e) => {
                    warn!(
                        "Batch generation failed on round {round}: {e}; \
                        falling back to individual calls.",
                    );
                    fallback(backend, &prompts).await
                },
            };

        for (&slot, completion) in due.iter().zip(completions) {
            let session = &mut sessions[slot];
            let Some(raw) = completion else {
                warn!(
                    "Generation failed for question {}; retiring.",
                    session.question.question_id,
                );
                session.alive = false;
                continue;
            };

            let outcome = session.dispatch(&raw, store);
            let capped =
                session.turns.len() as u64 >= session.cap(category, options);
            if outcome.terminal() || capped {
                debug!(
                    "Question {} retired after round {round} ({outcome:?}).",
                    session.question.question_id,
                );
                session.alive = false;
            } else {
                session.next_round += 1;
            }
        }

        if sessions.iter().all(|s| !s.alive) {
            break;
        }
    }

    Ok(scheduled)
}

async fn fallback(
    backend: &dyn Generate,
    prompts: &[String],
) -> Vec<Option<String>> {
    let mut completions = Vec::with_capacity(prompts.len());
    for prompt in prompts {
        match backend.generate_one(prompt).await {
            Ok(completion) => completions.push(Some(completion)),
            Err(e) => {
                warn!("Individual generation failed: {e}");
                completions.push(None);
            },
        }
    }
    completions
}

/* TESTS */
