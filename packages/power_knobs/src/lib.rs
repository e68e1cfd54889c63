#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Maps a small set of power and performance knobs onto the Linux control files that implement
//! them: the number of online physical cores, simultaneous multithreading (SMT), the package
//! power limit (TDP), the battery charge limit and CPU frequency boost.
//!
//! The interesting part is core topology. Every physical core `i` has a primary thread `cpu{i}`
//! and an SMT sibling `cpu{i + P}`, where `P` is the physical core count. Changing the core count
//! must not bring siblings online while SMT is off, and switching SMT must not bring siblings of
//! offline cores online. Operations spanning many cores attempt every core and report every
//! failure instead of stopping at the first one.
//!
//! The binary entry point is in `main.rs`. The logic is exposed via [`run`].
//!
//! # Example
//!
//! ```no_run
//! use power_knobs::{PlatformConfig, RunInput, RunOutcome, run};
//!
//! let input = RunInput {
//!     cores: Some(4),
//!     smt: Some(1),
//!     ..RunInput::new(PlatformConfig::default())
//! };
//!
//! if let RunOutcome::Applied(outcomes) = run(&input) {
//!     for diagnostic in outcomes.iter().filter_map(|o| o.diagnostic()) {
//!         eprintln!("{diagnostic}");
//!     }
//! }
//! ```

mod aggregate;
mod config;
mod cores;
mod error;
mod knobs;
mod pal;
mod smt;
mod status;
#[cfg(test)]
mod test_support;
mod topology;
mod validate;

pub use aggregate::{AggregateFailure, UnitFailure, UnitKind};
pub use config::*;
pub use error::*;
pub use knobs::Knob;
use knobs::apply_knob;
use pal::{ControlPlane, ControlPlaneFacade};
pub use smt::SmtStatus;
pub use status::StatusReport;
use status::read_status;
pub use validate::validate;

/// What to do in one invocation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[allow(
    clippy::exhaustive_structs,
    reason = "built by callers with struct update syntax"
)]
pub struct RunInput {
    /// Requested number of schedulable physical cores.
    pub cores: Option<i64>,

    /// Requested power limit in watts.
    pub tdp: Option<i64>,

    /// Requested maximum battery charge level in percent.
    pub charge: Option<i64>,

    /// Requested SMT state, 0 or 1.
    pub smt: Option<i64>,

    /// Requested frequency boost state, 0 or 1.
    pub boost: Option<i64>,

    /// Report the current state instead of applying anything.
    pub json: bool,

    /// The platform being controlled.
    pub config: PlatformConfig,
}

impl RunInput {
    /// An input that requests nothing.
    #[must_use]
    pub fn new(config: PlatformConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The requested knob values, in the order they are applied.
    pub fn requested(&self) -> impl Iterator<Item = (Knob, i64)> + '_ {
        Knob::APPLY_ORDER
            .into_iter()
            .filter_map(|knob| self.value_of(knob).map(|value| (knob, value)))
    }

    /// Whether the input asks for nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.json && self.requested().next().is_none()
    }

    const fn value_of(&self, knob: Knob) -> Option<i64> {
        match knob {
            Knob::Cores => self.cores,
            Knob::Tdp => self.tdp,
            Knob::Charge => self.charge,
            Knob::Smt => self.smt,
            Knob::Boost => self.boost,
        }
    }
}

/// What happened to one requested knob.
#[derive(Debug)]
#[non_exhaustive]
pub struct KnobOutcome {
    /// The knob.
    pub knob: Knob,

    /// The requested value.
    pub value: i64,

    /// Whether the value was applied.
    pub result: Result<(), KnobError>,
}

impl KnobOutcome {
    /// A human-readable description of the failure, `None` if the knob was applied.
    #[must_use]
    pub fn diagnostic(&self) -> Option<String> {
        let flag = self.knob.flag();
        let value = self.value;

        match &self.result {
            Ok(()) => None,
            Err(KnobError::Range(e)) => Some(format!("Input error: {flag} {e}")),
            Err(e) => Some(format!("Error setting {flag} to value {value}: {e}")),
        }
    }
}

/// The outcome of one invocation.
#[derive(Debug)]
#[non_exhaustive]
pub enum RunOutcome {
    /// The current state was read instead of applying anything.
    Status(StatusReport),

    /// Every requested knob was attempted, in application order.
    Applied(Vec<KnobOutcome>),
}

impl RunOutcome {
    /// Whether everything that was asked for succeeded.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        match self {
            Self::Status(_) => true,
            Self::Applied(outcomes) => outcomes.iter().all(|o| o.result.is_ok()),
        }
    }
}

/// Core logic of the tool, free of process-global state so it can be driven directly.
///
/// A failing knob does not prevent the remaining knobs from being applied.
#[must_use]
pub fn run(input: &RunInput) -> RunOutcome {
    run_with_control_plane(input, &ControlPlaneFacade::target())
}

fn run_with_control_plane(input: &RunInput, control_plane: &impl ControlPlane) -> RunOutcome {
    if input.json {
        return RunOutcome::Status(read_status(control_plane, &input.config));
    }

    let outcomes = input
        .requested()
        .map(|(knob, value)| KnobOutcome {
            knob,
            value,
            result: apply_knob(control_plane, &input.config, knob, value),
        })
        .collect();

    RunOutcome::Applied(outcomes)
}

/// Infers the current SMT status of the platform from its sibling pairs.
///
/// Unlike changing the core count, a read failure here is reported as
/// [`SmtStatus::Indeterminate`] rather than assumed to mean off.
#[must_use]
pub fn smt_status(config: &PlatformConfig) -> SmtStatus {
    smt::infer_smt_status(&ControlPlaneFacade::target(), &config.topology())
}
