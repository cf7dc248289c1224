//! Concurrent trial runner
//!
//! Runs the candidate program once per seed on a fixed-size pool of workers.
//! Every trial is its own OS process, so a crash in one trial cannot touch
//! another. Results come back in seed-submission order regardless of which
//! trial finishes first.
//!
//! ```text
//!   seeds ──► SegQueue<(index, seed)> ──► worker 1..N ──► spawn + wait
//!                                                     │
//!   caller ◄── slots[index] ◄── collector ◄── channel ┘
//! ```
//!
//! The collector is the only place that touches the result sink, so the
//! sink needs no locking. The first failed trial aborts the batch: pending
//! seeds are discarded and trials already running are waited for. Results of
//! seeds before the failed one still reach the sink as they complete.

use crate::store::StoreError;
use crate::trial::{parse_output, validate, ExecutionError, FailureReason, TrialResult};
use crossbeam::channel;
use crossbeam::queue::SegQueue;
use std::process::{Command, Stdio};
use std::time::Instant;
use thiserror::Error;

/// Placeholder replaced by the seed in command arguments
pub const SEED_PLACEHOLDER: &str = "{seed}";

/// Errors that abort a batch
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error("failed to record trial result: {0}")]
    Store(#[from] StoreError),
}

/// Command line used to launch the candidate for one seed
///
/// If any argument contains `{seed}`, each occurrence is replaced by the
/// seed. Otherwise the seed is appended as the last argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    program: String,
    args: Vec<String>,
}

impl CommandTemplate {
    /// Build from an argv vector; `None` if it is empty
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments for a given seed
    pub fn args_for(&self, seed: &str) -> Vec<String> {
        if self.args.iter().any(|a| a.contains(SEED_PLACEHOLDER)) {
            self.args
                .iter()
                .map(|a| a.replace(SEED_PLACEHOLDER, seed))
                .collect()
        } else {
            let mut args = self.args.clone();
            args.push(seed.to_string());
            args
        }
    }

    /// Shell-like rendering, for run attributes and logs
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|part| {
                if part.is_empty() || part.contains(char::is_whitespace) {
                    format!("{:?}", part)
                } else {
                    part.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Runs trials of one candidate command
#[derive(Debug, Clone)]
pub struct TrialRunner {
    command: CommandTemplate,
    concurrency: usize,
}

impl TrialRunner {
    /// Create a runner with `concurrency` workers (at least one)
    pub fn new(command: CommandTemplate, concurrency: usize) -> Self {
        Self {
            command,
            concurrency: concurrency.max(1),
        }
    }

    pub fn command(&self) -> &CommandTemplate {
        &self.command
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run the candidate once for `seed`, timing it from launch to exit
    pub fn run_trial(&self, seed: &str) -> Result<TrialResult, ExecutionError> {
        let args = self.command.args_for(seed);
        tracing::debug!("launching seed={}: {} {:?}", seed, self.command.program, args);

        let start = Instant::now();
        let output = Command::new(&self.command.program)
            .args(&args)
            .stdin(Stdio::null())
            .output();
        let elapsed = start.elapsed().as_secs_f64();

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                return Err(ExecutionError {
                    seed: seed.to_string(),
                    reason: FailureReason::Spawn(e),
                    stdout: String::new(),
                    stderr: String::new(),
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        let outcome = if output.status.success() {
            parse_output(&stdout, &stderr).and_then(|parsed| validate(parsed, seed, elapsed))
        } else {
            Err(FailureReason::NonZeroExit(output.status.to_string()))
        };

        outcome.map_err(|reason| ExecutionError {
            seed: seed.to_string(),
            reason,
            stdout,
            stderr,
        })
    }

    /// Run every seed and return results in seed order
    pub fn run_batch(&self, seeds: &[String]) -> Result<Vec<TrialResult>, BatchError> {
        self.run_batch_with(seeds, |_| Ok(()))
    }

    /// Run every seed, handing each result to `on_result` as soon as all
    /// earlier seeds have completed too
    ///
    /// `on_result` runs on the calling thread only. Its first error aborts
    /// the batch the same way a failed trial does. When several trials fail,
    /// the error of the lowest seed index is returned.
    pub fn run_batch_with<F>(
        &self,
        seeds: &[String],
        mut on_result: F,
    ) -> Result<Vec<TrialResult>, BatchError>
    where
        F: FnMut(&TrialResult) -> Result<(), StoreError>,
    {
        let total = seeds.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let queue = SegQueue::new();
        for (index, seed) in seeds.iter().enumerate() {
            queue.push((index, seed.as_str()));
        }

        let workers = self.concurrency.min(total);
        tracing::info!(
            "running {} trials on {} workers: {}",
            total,
            workers,
            self.command.display()
        );

        let (done_tx, done_rx) = channel::unbounded::<(usize, Result<TrialResult, ExecutionError>)>();

        let scoped = crossbeam::scope(|scope| {
            for _ in 0..workers {
                let queue = &queue;
                let done_tx = done_tx.clone();
                scope.spawn(move |_| {
                    while let Some((index, seed)) = queue.pop() {
                        let outcome = self.run_trial(seed);
                        if done_tx.send((index, outcome)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(done_tx);

            let mut slots: Vec<Option<TrialResult>> = vec![None; total];
            let mut next = 0;
            // Lowest-index failed trial; the prefix before it is still flushed
            let mut failed: Option<(usize, ExecutionError)> = None;
            let mut sink_error: Option<StoreError> = None;

            for (index, outcome) in done_rx.iter() {
                match outcome {
                    Ok(result) => {
                        tracing::debug!(
                            "seed={} Score={} elapsed={:.3}s",
                            result.seed,
                            result.score,
                            result.elapsed
                        );
                        slots[index] = Some(result);
                    }
                    Err(e) => {
                        tracing::warn!("aborting batch: trial for seed={} failed: {}", e.seed, e.reason);
                        // Trials not yet started are dropped; running ones finish
                        while queue.pop().is_some() {}
                        if failed.as_ref().map_or(true, |(first, _)| index < *first) {
                            failed = Some((index, e));
                        }
                    }
                }

                if sink_error.is_some() {
                    continue;
                }
                // Stops at the first empty slot, so nothing past a failed seed is flushed
                while let Some(Some(ready)) = slots.get(next) {
                    if let Err(e) = on_result(ready) {
                        while queue.pop().is_some() {}
                        sink_error = Some(e);
                        break;
                    }
                    next += 1;
                }
            }

            if let Some(e) = sink_error {
                return Err(BatchError::Store(e));
            }
            match failed {
                Some((_, e)) => Err(BatchError::Execution(e)),
                None => Ok(slots.into_iter().flatten().collect::<Vec<_>>()),
            }
        });

        match scoped {
            Ok(outcome) => outcome,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}
