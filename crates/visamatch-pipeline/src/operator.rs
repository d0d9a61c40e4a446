//! Serialises pipeline triggers: one classify or match pass at a time.

use crate::classify;
use crate::error::{PipelineError, Result};
use crate::layout::Layout;
use crate::matching::{self, MatchOptions};
use crate::report::{ClassifyReport, MatchReport};
use serde::Serialize;
use std::fmt;
use std::sync::{Mutex, MutexGuard};
use visamatch_core::{Classifier, FaceDetect, FaceEmbed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperatorState {
    Idle,
    Classifying,
    Matching,
}

impl fmt::Display for OperatorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperatorState::Idle => "idle",
            OperatorState::Classifying => "classification",
            OperatorState::Matching => "matching",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Classify,
    Match,
}

impl Operation {
    fn state(self) -> OperatorState {
        match self {
            Operation::Classify => OperatorState::Classifying,
            Operation::Match => OperatorState::Matching,
        }
    }
}

#[derive(Debug)]
pub struct Operator {
    state: Mutex<OperatorState>,
}

impl Default for Operator {
    fn default() -> Self {
        Self::new()
    }
}

impl Operator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(OperatorState::Idle),
        }
    }

    pub fn state(&self) -> OperatorState {
        *self.lock()
    }

    /// Enter `op` if idle. The returned guard goes back to idle on drop.
    pub fn try_begin(&self, op: Operation) -> Result<RunGuard<'_>> {
        let mut state = self.lock();
        if *state != OperatorState::Idle {
            tracing::warn!(current = %*state, requested = ?op, "trigger rejected");
            return Err(PipelineError::Busy(*state));
        }
        *state = op.state();
        tracing::debug!(state = %*state, "operator busy");
        Ok(RunGuard { operator: self })
    }

    pub fn classify<D: FaceDetect>(&self, classifier: &mut Classifier<D>, layout: &Layout) -> Result<ClassifyReport> {
        let _guard = self.try_begin(Operation::Classify)?;
        classify::classify_directory(classifier, layout)
    }

    pub fn match_images<E: FaceEmbed + ?Sized>(
        &self,
        embedder: &mut E,
        layout: &Layout,
        options: &MatchOptions,
    ) -> Result<MatchReport> {
        let _guard = self.try_begin(Operation::Match)?;
        matching::match_directories(embedder, layout, options)
    }

    // A panicking pass must not wedge the operator.
    fn lock(&self) -> MutexGuard<'_, OperatorState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Held for the duration of one pass.
#[derive(Debug)]
pub struct RunGuard<'a> {
    operator: &'a Operator,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *self.operator.lock() = OperatorState::Idle;
        tracing::debug!("operator idle");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;
    use visamatch_core::{EmbedError, Embedding};

    #[test]
    fn test_starts_idle() {
        assert_eq!(Operator::new().state(), OperatorState::Idle);
    }

    #[test]
    fn test_rejects_reentry() {
        let op = Operator::new();
        let guard = op.try_begin(Operation::Classify).unwrap();
        assert_eq!(op.state(), OperatorState::Classifying);

        match op.try_begin(Operation::Match) {
            Err(PipelineError::Busy(OperatorState::Classifying)) => {}
            other => panic!("expected Busy, got {other:?}"),
        }
        assert!(op.try_begin(Operation::Classify).is_err());

        drop(guard);
        assert_eq!(op.state(), OperatorState::Idle);
        assert!(op.try_begin(Operation::Match).is_ok());
    }

    struct Failing;

    impl FaceEmbed for Failing {
        fn embed(&mut self, _: &Path) -> std::result::Result<Embedding, EmbedError> {
            Err(EmbedError::NoFaceDetected)
        }
    }

    #[test]
    fn test_returns_to_idle_after_error() {
        let dir = tempdir().unwrap();
        // A regular file where the root should be makes `ensure` fail.
        let root = dir.path().join("occupied");
        std::fs::write(&root, b"x").unwrap();

        let op = Operator::new();
        let result = op.match_images(&mut Failing, &Layout::under(&root), &MatchOptions::default());
        assert!(matches!(result, Err(PipelineError::Io { .. })));
        assert_eq!(op.state(), OperatorState::Idle);
    }

    #[test]
    fn test_busy_message() {
        let err = PipelineError::Busy(OperatorState::Matching);
        assert_eq!(err.to_string(), "busy: matching is already in progress");
    }
}
