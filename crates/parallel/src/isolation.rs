//! Failure isolation for batch units
//!
//! A unit that returns an error or panics is reported in its own slot;
//! the remaining units keep running.

use std::fmt::Display;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::strategy::{ParallelError, ParallelStrategy, ProcessingMode};

/// What happened to one unit
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome<T> {
    Completed(T),
    /// The unit returned an error
    Failed(String),
    /// The unit panicked; holds the panic message
    Panicked(String),
}

impl<T> TaskOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskOutcome::Completed(_))
    }

    pub fn completed(self) -> Option<T> {
        match self {
            TaskOutcome::Completed(v) => Some(v),
            _ => None,
        }
    }

    /// Failure reason, if the unit did not complete
    pub fn reason(&self) -> Option<&str> {
        match self {
            TaskOutcome::Completed(_) => None,
            TaskOutcome::Failed(r) | TaskOutcome::Panicked(r) => Some(r),
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Run `f` on every task under `mode`, one outcome per task in input order.
///
/// Only a failure to build the worker pool aborts the batch.
pub fn run_isolated<I, T, E, F>(mode: ProcessingMode, tasks: &[I], f: F) -> Result<Vec<TaskOutcome<T>>, ParallelError>
where
    I: Display + Sync,
    T: Send,
    E: Display,
    F: Fn(&I) -> Result<T, E> + Sync + Send,
{
    tracing::info!("running {} tasks on {} workers", tasks.len(), mode.threads());

    let outcomes = mode.par_map(0..tasks.len(), |i| {
        let task = &tasks[i];
        tracing::debug!("task {} started", task);
        match catch_unwind(AssertUnwindSafe(|| f(task))) {
            Ok(Ok(value)) => {
                tracing::debug!("task {} completed", task);
                TaskOutcome::Completed(value)
            }
            Ok(Err(e)) => {
                tracing::warn!("task {} failed: {}", task, e);
                TaskOutcome::Failed(e.to_string())
            }
            Err(payload) => {
                let message = panic_message(payload);
                tracing::error!("task {} panicked: {}", task, message);
                TaskOutcome::Panicked(message)
            }
        }
    })?;

    let failed = outcomes.iter().filter(|o| !o.is_completed()).count();
    if failed > 0 {
        tracing::warn!("{} of {} tasks did not complete", failed, tasks.len());
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn work(n: &u32) -> Result<u32, String> {
        match n {
            3 => Err("missing survey file".into()),
            5 => panic!("corrupt raster"),
            n => Ok(n * 10),
        }
    }

    #[test]
    fn test_failures_are_isolated() {
        let tasks: Vec<u32> = (0..8).collect();
        for mode in [ProcessingMode::Sequential, ProcessingMode::ParallelWith(3)] {
            let outcomes = run_isolated(mode, &tasks, work).unwrap();
            assert_eq!(outcomes.len(), 8);
            assert_eq!(outcomes[0], TaskOutcome::Completed(0));
            assert_eq!(outcomes[7], TaskOutcome::Completed(70));
            assert_eq!(outcomes[3], TaskOutcome::Failed("missing survey file".into()));
            assert_eq!(outcomes[5], TaskOutcome::Panicked("corrupt raster".into()));
            assert_eq!(outcomes.iter().filter(|o| o.is_completed()).count(), 6);
        }
    }

    #[test]
    fn test_outcome_accessors() {
        let done: TaskOutcome<u8> = TaskOutcome::Completed(1);
        assert_eq!(done.reason(), None);
        assert_eq!(done.completed(), Some(1));

        let failed: TaskOutcome<u8> = TaskOutcome::Failed("no data".into());
        assert_eq!(failed.reason(), Some("no data"));
        assert_eq!(failed.completed(), None);
    }

    #[test]
    fn test_panic_with_formatted_message() {
        let tasks = vec![1u32];
        let outcomes = run_isolated(ProcessingMode::Sequential, &tasks, |n: &u32| -> Result<u32, String> {
            panic!("unit {} exploded", n)
        })
        .unwrap();
        assert_eq!(outcomes[0], TaskOutcome::Panicked("unit 1 exploded".into()));
    }
}
