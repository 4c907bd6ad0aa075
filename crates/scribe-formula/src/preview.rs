//! Live preview controller
//!
//! Drives the parse → evaluate pipeline behind the formula editor: edits
//! are debounced, and a monotonically increasing generation counter
//! discards results that were superseded while they were in flight. A slow
//! evaluation that finishes after a newer one has settled must never
//! overwrite the editor's display.
//!
//! The transition logic lives in a pure, synchronous [`PreviewMachine`];
//! [`LivePreview`] is the tokio driver around it. Cancellation is
//! cooperative only: a superseded evaluation keeps running at the I/O
//! level and its result is dropped on arrival.

use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::FormulaError;
use crate::evaluator::{evaluate_parsed, EvaluateOptions, EvaluationResult};
use crate::parser::parse_formula;
use scribe_core::FormulaContext;

/// Options for the live preview pipeline
#[derive(Debug, Clone)]
pub struct PreviewOptions {
    /// Quiet period after the last edit before evaluation starts
    pub debounce: Duration,
    /// Options for each evaluation the pipeline runs
    pub evaluate: EvaluateOptions,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            evaluate: EvaluateOptions::default(),
        }
    }
}

/// A settled preview result, published to the host UI
#[derive(Debug, Clone)]
pub struct PreviewUpdate {
    /// Generation the result belongs to
    pub generation: u64,
    /// Formula text that was evaluated
    pub text: String,
    /// Evaluation outcome
    pub result: EvaluationResult,
    /// Context fields the formula reads, for reactive invalidation
    pub dependencies: HashSet<String>,
}

/// Pipeline states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Idle,
    Debouncing,
    Evaluating,
    Settled,
}

/// What became of a completed evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Latest generation; the result is published
    Settled,
    /// A newer edit owns the pipeline; the result is discarded
    Superseded,
}

/// Transition table of the preview pipeline.
///
/// The state always describes the *latest* generation's cycle; completions
/// of older generations report [`CompletionOutcome::Superseded`] without
/// touching it.
#[derive(Debug)]
pub struct PreviewMachine {
    state: PreviewState,
    generation: u64,
    pending: Option<String>,
}

impl PreviewMachine {
    pub fn new() -> Self {
        Self {
            state: PreviewState::Idle,
            generation: 0,
            pending: None,
        }
    }

    pub fn state(&self) -> PreviewState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_debouncing(&self) -> bool {
        self.state == PreviewState::Debouncing
    }

    /// A new edit arrived: bump the generation and (re)start debouncing.
    /// An in-flight evaluation is not cancelled; its completion will come
    /// back stale.
    pub fn edit(&mut self, text: String) -> u64 {
        self.generation += 1;
        self.pending = Some(text);
        self.state = PreviewState::Debouncing;
        self.generation
    }

    /// The debounce timer fired: hand out the work for the current
    /// generation. Returns `None` unless the machine is debouncing.
    pub fn timer_fired(&mut self) -> Option<(u64, String)> {
        if self.state != PreviewState::Debouncing {
            return None;
        }
        let text = self.pending.take()?;
        self.state = PreviewState::Evaluating;
        Some((self.generation, text))
    }

    /// An evaluation finished; decide whether its result may be applied.
    pub fn completed(&mut self, generation: u64) -> CompletionOutcome {
        if generation == self.generation && self.state == PreviewState::Evaluating {
            self.state = PreviewState::Settled;
            CompletionOutcome::Settled
        } else {
            CompletionOutcome::Superseded
        }
    }
}

impl Default for PreviewMachine {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to a running live preview pipeline.
///
/// Feed it edits with [`edit`](LivePreview::edit); settled results arrive
/// on the receiver returned by [`spawn`](LivePreview::spawn). Dropping the
/// handle (or calling [`shutdown`](LivePreview::shutdown)) stops the
/// pipeline.
pub struct LivePreview {
    edits: mpsc::UnboundedSender<String>,
    task: JoinHandle<()>,
}

impl LivePreview {
    /// Start the pipeline.
    ///
    /// `context_factory` is called once per evaluation so each run gets its
    /// own fresh context snapshot.
    pub fn spawn<F>(
        context_factory: F,
        options: PreviewOptions,
    ) -> (Self, mpsc::UnboundedReceiver<PreviewUpdate>)
    where
        F: Fn() -> FormulaContext + Send + Sync + 'static,
    {
        let (edits_tx, edits_rx) = mpsc::unbounded_channel();
        let (updates_tx, updates_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(run(edits_rx, updates_tx, context_factory, options));

        (
            Self {
                edits: edits_tx,
                task,
            },
            updates_rx,
        )
    }

    /// Submit the editor's current formula text
    pub fn edit<S: Into<String>>(&self, text: S) {
        // A closed pipeline just ignores further edits
        let _ = self.edits.send(text.into());
    }

    /// Stop the pipeline and wait for the driver task to finish
    pub async fn shutdown(self) {
        drop(self.edits);
        let _ = self.task.await;
    }
}

async fn run<F>(
    mut edits: mpsc::UnboundedReceiver<String>,
    updates: mpsc::UnboundedSender<PreviewUpdate>,
    context_factory: F,
    options: PreviewOptions,
) where
    F: Fn() -> FormulaContext + Send + Sync + 'static,
{
    let mut machine = PreviewMachine::new();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<(u64, String, EvaluationResult, HashSet<String>)>();

    let debounce = tokio::time::sleep(options.debounce);
    tokio::pin!(debounce);

    loop {
        tokio::select! {
            edit = edits.recv() => match edit {
                Some(text) => {
                    let generation = machine.edit(text);
                    tracing::debug!(generation, "formula edit received");
                    debounce.as_mut().reset(Instant::now() + options.debounce);
                }
                // Handle dropped: drain nothing further, stop the pipeline
                None => break,
            },

            () = &mut debounce, if machine.is_debouncing() => {
                if let Some((generation, text)) = machine.timer_fired() {
                    let ctx = context_factory();
                    let evaluate_options = options.evaluate.clone();
                    let done = done_tx.clone();
                    tokio::spawn(async move {
                        let (result, dependencies) = run_pipeline(&text, &ctx, &evaluate_options).await;
                        let _ = done.send((generation, text, result, dependencies));
                    });
                }
            }

            Some((generation, text, result, dependencies)) = done_rx.recv() => {
                match machine.completed(generation) {
                    CompletionOutcome::Settled => {
                        let _ = updates.send(PreviewUpdate {
                            generation,
                            text,
                            result,
                            dependencies,
                        });
                    }
                    CompletionOutcome::Superseded => {
                        tracing::debug!(generation, "discarding superseded preview result");
                    }
                }
            }
        }
    }
}

async fn run_pipeline(
    text: &str,
    ctx: &FormulaContext,
    options: &EvaluateOptions,
) -> (EvaluationResult, HashSet<String>) {
    match parse_formula(text) {
        Ok(parsed) => {
            let result = evaluate_parsed(&parsed.ast, ctx, options).await;
            (result, parsed.dependencies)
        }
        Err(err) => (parse_failure(&err), HashSet::new()),
    }
}

fn parse_failure(err: &FormulaError) -> EvaluationResult {
    EvaluationResult {
        success: false,
        value: None,
        error: Some(err.to_string()),
        evaluation_time_ms: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_machine_starts_idle() {
        let machine = PreviewMachine::new();
        assert_eq!(machine.state(), PreviewState::Idle);
        assert_eq!(machine.generation(), 0);
    }

    #[test]
    fn test_edit_starts_debouncing() {
        let mut machine = PreviewMachine::new();
        assert_eq!(machine.edit("SUM(1)".into()), 1);
        assert_eq!(machine.state(), PreviewState::Debouncing);
    }

    #[test]
    fn test_edits_within_window_share_one_firing() {
        let mut machine = PreviewMachine::new();
        machine.edit("S".into());
        machine.edit("SU".into());
        machine.edit("SUM(1,2)".into());
        assert_eq!(machine.generation(), 3);

        let (generation, text) = machine.timer_fired().unwrap();
        assert_eq!(generation, 3);
        assert_eq!(text, "SUM(1,2)");
        assert_eq!(machine.state(), PreviewState::Evaluating);

        // The timer never fires twice for one debounce window
        assert_eq!(machine.timer_fired(), None);
    }

    #[test]
    fn test_matching_completion_settles() {
        let mut machine = PreviewMachine::new();
        machine.edit("SUM(1)".into());
        let (generation, _) = machine.timer_fired().unwrap();

        assert_eq!(machine.completed(generation), CompletionOutcome::Settled);
        assert_eq!(machine.state(), PreviewState::Settled);
    }

    #[test]
    fn test_edit_during_evaluation_supersedes() {
        let mut machine = PreviewMachine::new();
        machine.edit("SUM(1)".into());
        let (old_generation, _) = machine.timer_fired().unwrap();

        // New edit while generation 1 is in flight
        machine.edit("SUM(2)".into());
        assert_eq!(machine.state(), PreviewState::Debouncing);

        // The stale completion is discarded and does not disturb debouncing
        assert_eq!(machine.completed(old_generation), CompletionOutcome::Superseded);
        assert_eq!(machine.state(), PreviewState::Debouncing);

        let (new_generation, _) = machine.timer_fired().unwrap();
        assert_eq!(new_generation, 2);
        assert_eq!(machine.completed(new_generation), CompletionOutcome::Settled);
    }

    #[test]
    fn test_old_completion_after_newer_settled() {
        let mut machine = PreviewMachine::new();
        machine.edit("SUM(1)".into());
        let (gen1, _) = machine.timer_fired().unwrap();

        machine.edit("SUM(2)".into());
        let (gen2, _) = machine.timer_fired().unwrap();

        // Generation 2 settles first; generation 1 limps in afterwards
        assert_eq!(machine.completed(gen2), CompletionOutcome::Settled);
        assert_eq!(machine.completed(gen1), CompletionOutcome::Superseded);
        assert_eq!(machine.state(), PreviewState::Settled);
    }
}
