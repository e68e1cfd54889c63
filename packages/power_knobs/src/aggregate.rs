//! Continue-on-error application of writes that span many independent units.

use std::path::PathBuf;

use derive_more::derive::Display;
use thiserror::Error;
use tracing::debug;

use crate::ControlError;
use crate::pal::ControlPlane;
use crate::topology::OnlineState;

/// What the units of a multi-unit operation are, for labeling failures.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[non_exhaustive]
pub enum UnitKind {
    /// A logical core in the interleaved core count sequence.
    #[display("core")]
    Core,

    /// An SMT sibling thread.
    #[display("SMT core")]
    SmtCore,
}

/// One unit of a multi-unit operation that failed.
#[derive(Debug, Error)]
#[error("{kind} {unit}: {source}")]
pub struct UnitFailure {
    kind: UnitKind,
    unit: u32,
    source: ControlError,
}

impl UnitFailure {
    /// What kind of unit failed.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        self.kind
    }

    /// Ordinal of the unit in the sequence the operation applied.
    #[must_use]
    pub const fn unit(&self) -> u32 {
        self.unit
    }

    /// The control file error behind the failure.
    #[must_use]
    pub const fn control_error(&self) -> &ControlError {
        &self.source
    }
}

/// Some units of a multi-unit operation failed. Every unit was still attempted.
///
/// Failures are kept in the order the units were applied.
#[derive(Debug, Error)]
#[error("failed to set some CPU cores: [{}]", list_failures(.failures))]
pub struct AggregateFailure {
    failures: Vec<UnitFailure>,
}

impl AggregateFailure {
    /// The failed units, in application order. Never empty.
    #[must_use]
    pub fn failures(&self) -> &[UnitFailure] {
        &self.failures
    }
}

fn list_failures(failures: &[UnitFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// One planned write of an online toggle.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct UnitWrite {
    pub(crate) path: PathBuf,
    pub(crate) state: OnlineState,
}

impl UnitWrite {
    pub(crate) fn new(path: PathBuf, state: OnlineState) -> Self {
        Self { path, state }
    }
}

/// Collects per-unit outcomes of a sequential multi-unit operation.
#[derive(Debug)]
pub(crate) struct FailureAccumulator {
    kind: UnitKind,
    failures: Vec<UnitFailure>,
}

impl FailureAccumulator {
    pub(crate) const fn new(kind: UnitKind) -> Self {
        Self {
            kind,
            failures: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, unit: u32, outcome: Result<(), ControlError>) {
        if let Err(source) = outcome {
            debug!(kind = %self.kind, unit, error = %source, "unit failed");

            self.failures.push(UnitFailure {
                kind: self.kind,
                unit,
                source,
            });
        }
    }

    pub(crate) fn finish(self) -> Result<(), AggregateFailure> {
        if self.failures.is_empty() {
            Ok(())
        } else {
            Err(AggregateFailure {
                failures: self.failures,
            })
        }
    }
}

/// Applies every write in order, labeling each with its ordinal. A failed write does not stop
/// the remaining ones.
pub(crate) fn apply_unit_writes(
    control_plane: &impl ControlPlane,
    kind: UnitKind,
    writes: &[UnitWrite],
) -> Result<(), AggregateFailure> {
    let mut failures = FailureAccumulator::new(kind);

    for (unit, write) in (0_u32..).zip(writes) {
        let outcome = control_plane
            .write(&write.path, write.state.control_value())
            .map_err(|e| ControlError::new(write.path.clone(), e));

        failures.record(unit, outcome);
    }

    failures.finish()
}
