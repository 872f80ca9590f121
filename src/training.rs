use crate::error::{SessionError, StoreError};
use crate::matcher::{grade, Grade};
use crate::report;
use crate::set::Set;
use crate::store::{persist_pruned_set, PruneOutcome};
use crate::traits::*;
use rand::Rng;
use std::collections::BTreeSet;

/*
Implements the flow of one drill;
    Configuring
        Set, direction and shuffle are given, empty sets are refused.

    Running
        Present question, obtain answer, grade it.
        Count it, remember the pair if the learner asked to drop it.
        After the last pair go on to the confirmation if anything is to be dropped.

    AwaitingPruneConfirmation
        No: done, nothing changes.
        Yes: persist the pruned set, keeping a backup of the original once.

    Done
        The caller may ask for another pass with the same settings.
*/

/// How a session asks its questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionConfig {
    pub direction: Direction,
    /// Shuffle before every pass.
    pub shuffle: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Configuring,
    Running,
    AwaitingPruneConfirmation,
    Done,
}

/// Score of one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionSummary {
    pub asked: usize,
    pub correct: usize,
}

/// One learner drilling one set.
#[derive(Debug)]
pub struct TrainingSession {
    key: String,
    set: Set,
    config: SessionConfig,
    state: SessionState,
    position: usize,
    summary: SessionSummary,
    removal: BTreeSet<usize>,
}

impl TrainingSession {
    /// Configure a session over the set that was loaded from `key`.
    pub fn new(key: &str, set: Set, config: SessionConfig) -> Result<Self, SessionError> {
        if set.is_empty() {
            return Err(SessionError::EmptySet);
        }
        Ok(TrainingSession {
            key: key.to_owned(),
            set,
            config,
            state: SessionState::Configuring,
            position: 0,
            summary: Default::default(),
            removal: Default::default(),
        })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn set(&self) -> &Set {
        &self.set
    }

    pub fn config(&self) -> SessionConfig {
        self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary
    }

    /// Indices, in the current order, of the pairs the learner asked to drop.
    pub fn removal_candidates(&self) -> &BTreeSet<usize> {
        &self.removal
    }

    /// Begin the first pass.
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), SessionError> {
        if self.state != SessionState::Configuring {
            return Err(SessionError::AlreadyStarted);
        }
        self.begin_pass(rng);
        Ok(())
    }

    /// Another pass with the same settings, only once the previous pass is done.
    pub fn restart<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), SessionError> {
        if self.state != SessionState::Done {
            return Err(SessionError::NotDone);
        }
        if self.set.is_empty() {
            return Err(SessionError::EmptySet);
        }
        self.begin_pass(rng);
        Ok(())
    }

    fn begin_pass<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.config.shuffle {
            self.set.shuffle(rng);
        }
        self.position = 0;
        self.summary = Default::default();
        self.removal.clear();
        self.state = SessionState::Running;
        tracing::info!(
            key = self.key.as_str(),
            pairs = self.set.len(),
            direction = ?self.config.direction,
            shuffle = self.config.shuffle,
            "pass started"
        );
    }

    /// The question to answer next, `None` unless running.
    pub fn question(&self) -> Option<Question<'_>> {
        if self.state != SessionState::Running {
            return None;
        }
        let pair = self.set.pairs().get(self.position)?;
        let (shown, accepted) = pair.sides(self.config.direction);
        Some(Question {
            index: self.position,
            shown,
            accepted,
        })
    }

    /// Grade the answer to the current question and move on to the next one.
    pub fn answer(&mut self, raw_answer: Option<&str>) -> Result<Grade, SessionError> {
        let (index, result) = {
            let question = self.question().ok_or(SessionError::NotRunning)?;
            (question.index, grade(raw_answer, question.accepted))
        };
        tracing::debug!(index, verdict = ?result.verdict, removal = result.removal_requested, "graded");

        self.summary.asked += 1;
        if result.verdict.is_correct() {
            self.summary.correct += 1;
        }
        if result.removal_requested {
            self.removal.insert(index);
        }

        self.position += 1;
        if self.position >= self.set.len() {
            self.state = if self.removal.is_empty() {
                SessionState::Done
            } else {
                SessionState::AwaitingPruneConfirmation
            };
            tracing::info!(
                asked = self.summary.asked,
                correct = self.summary.correct,
                to_remove = self.removal.len(),
                "pass finished"
            );
        }
        Ok(result)
    }

    /// Settle the pending prune. On a successful write the session continues with the pruned
    /// set under the key it was written to. The session is done afterwards in every case, a
    /// failed write leaves the set in memory as it was.
    pub fn confirm_prune(
        &mut self,
        confirmed: bool,
        store: &mut dyn SetStore,
    ) -> Result<Option<PruneOutcome>, SessionError> {
        if self.state != SessionState::AwaitingPruneConfirmation {
            return Err(SessionError::NotAwaitingConfirmation);
        }
        self.state = SessionState::Done;
        if !confirmed {
            return Ok(None);
        }

        let outcome = persist_pruned_set(store, &self.key, &self.set, &self.removal)?;
        if let PruneOutcome::Persisted { key, .. } = &outcome {
            self.set = self.set.without(&self.removal);
            self.key = key.clone();
        }
        self.removal.clear();
        Ok(Some(outcome))
    }
}

/// What happened to the pairs marked for removal at the end of a pass.
#[derive(Debug)]
pub enum PruneReport {
    NothingMarked,
    Declined,
    Finished(PruneOutcome),
    Failed(StoreError),
}

/// One pass over the set, talking to the learner through the console.
pub fn drill(
    session: &mut TrainingSession,
    console: &mut dyn Console,
    store: &mut dyn SetStore,
) -> Result<(SessionSummary, PruneReport), SessionError> {
    if session.state() != SessionState::Running {
        return Err(SessionError::NotRunning);
    }
    let direction = session.config().direction;
    console.write_line(&format!(
        "Next you will get {} word and you have to respond in {}",
        direction.shown(session.set()),
        direction.expected(session.set())
    ));
    console.write_line("If there are multiple answers, you can respond with either");

    while let Some(question) = session.question() {
        console.write(&format!("{}: ", report::join(question.shown)));
        let raw_answer = console.read_line();
        let result = session.answer(raw_answer.as_deref())?;
        console.write_line(&report::verdict_line(&result));
        // Removal is honored on wrong answers as well.
        if result.removal_requested {
            console.write_line(report::removal_line());
        }
    }

    let summary = session.summary();
    console.write_line(&report::score_line(&summary));

    if session.state() != SessionState::AwaitingPruneConfirmation {
        return Ok((summary, PruneReport::NothingMarked));
    }
    let confirmed =
        console.confirm("Are you sure you want to remove the given pairs from the set?");
    let report = match session.confirm_prune(confirmed, store) {
        Ok(None) => PruneReport::Declined,
        Ok(Some(outcome)) => {
            match &outcome {
                PruneOutcome::Persisted { key, remaining, .. } => console.write_line(&format!(
                    "Saved the remaining {remaining} pairs as {key}"
                )),
                PruneOutcome::SubsetAlreadyExists { .. } => {
                    console.write_line("You have already created a subset of this set")
                }
            }
            PruneReport::Finished(outcome)
        }
        Err(SessionError::Store(e)) => {
            tracing::warn!("pruning failed: {e}");
            console.write_line(&format!("The pairs could not be removed: {e}"));
            PruneReport::Failed(e)
        }
        Err(e) => return Err(e),
    };
    Ok((summary, report))
}

/// Start the session and keep drilling while the learner wants another pass.
pub fn train<R: Rng + ?Sized>(
    session: &mut TrainingSession,
    console: &mut dyn Console,
    store: &mut dyn SetStore,
    rng: &mut R,
) -> Result<Vec<SessionSummary>, SessionError> {
    let mut passes = vec![];
    session.start(rng)?;
    loop {
        let (summary, _) = drill(session, console, store)?;
        passes.push(summary);
        if !console.confirm("Do you want to learn this same set again with same settings?") {
            return Ok(passes);
        }
        match session.restart(rng) {
            Ok(()) => {}
            Err(SessionError::EmptySet) => {
                console.write_line("There are no pairs left in this set");
                return Ok(passes);
            }
            Err(e) => return Err(e),
        }
    }
}
