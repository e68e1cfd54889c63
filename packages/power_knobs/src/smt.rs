//! Simultaneous multithreading: inferring whether it is on and switching it on or off.
//!
//! SMT state is never stored. It is derived on demand from the online toggles of the sibling
//! pairs. We do not use the kernel's global `smt/control` switch because it also brings primary
//! threads back online, undoing a reduced core count.

use derive_more::derive::Display;
use tracing::{debug, warn};

use crate::ControlError;
use crate::aggregate::{AggregateFailure, UnitKind, UnitWrite, apply_unit_writes};
use crate::pal::ControlPlane;
use crate::topology::{LogicalCore, OFFLINE, ONLINE, OnlineState, Topology};

/// SMT status as observed through the sibling pairs.
#[derive(Debug)]
#[non_exhaustive]
pub enum SmtStatus {
    /// No physical core has an online primary thread with an offline sibling.
    On,

    /// At least one physical core has an online primary thread with an offline sibling.
    Off,

    /// A sibling pair could not be read, so nothing can be said.
    Indeterminate(ControlError),
}

impl SmtStatus {
    /// The status as shown to users, `None` if indeterminate.
    #[must_use]
    pub const fn as_str(&self) -> Option<&'static str> {
        match self {
            Self::On => Some("on"),
            Self::Off => Some("off"),
            Self::Indeterminate(_) => None,
        }
    }
}

/// A definitive SMT state, used where a decision has to be made.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub(crate) enum SmtState {
    #[display("on")]
    On,

    #[display("off")]
    Off,
}

/// Reads the sibling pairs of every managed physical core.
///
/// The first pair with an online primary and a not-online sibling decides: SMT is a platform-wide
/// toggle, so one disabled sibling is enough evidence. A failed read of either thread makes the
/// result indeterminate.
pub(crate) fn infer_smt_status(
    control_plane: &impl ControlPlane,
    topology: &Topology<'_>,
) -> SmtStatus {
    for core in topology.managed_cores() {
        let threads = topology.threads(core);

        let primary = read_online(control_plane, topology, threads.primary);
        let sibling = read_online(control_plane, topology, threads.sibling);

        let (primary, sibling) = match (primary, sibling) {
            (Ok(primary), Ok(sibling)) => (primary, sibling),
            (Err(e), _) | (_, Err(e)) => {
                debug!(%core, error = %e, "failed to read core online status");
                return SmtStatus::Indeterminate(e);
            }
        };

        if primary == ONLINE && sibling != ONLINE {
            debug!(%core, %primary, %sibling, "asymmetric sibling pair, SMT is off");
            return SmtStatus::Off;
        }
    }

    SmtStatus::On
}

/// Collapses an indeterminate status to off.
///
/// Used when changing the core count: an unreadable topology must not block the change, and
/// bringing siblings online by mistake is worse than leaving them offline.
pub(crate) fn assume_off_when_indeterminate(status: SmtStatus) -> SmtState {
    match status {
        SmtStatus::On => SmtState::On,
        SmtStatus::Off => SmtState::Off,
        SmtStatus::Indeterminate(e) => {
            warn!(error = %e, "SMT status could not be determined, assuming off");
            SmtState::Off
        }
    }
}

/// Brings every SMT sibling online or offline.
///
/// The sibling of a physical core whose primary thread reads as offline is always taken offline,
/// whatever was requested. An unreadable primary is treated as online. The boot core's sibling is
/// included.
pub(crate) fn set_smt(
    control_plane: &impl ControlPlane,
    topology: &Topology<'_>,
    enable: bool,
) -> Result<(), AggregateFailure> {
    let requested = OnlineState::from(enable);

    let writes: Vec<UnitWrite> = topology
        .all_cores()
        .map(|core| {
            let threads = topology.threads(core);

            let target = if !core.is_boot()
                && is_confirmed_offline(control_plane, topology, threads.primary)
            {
                debug!(%core, "primary thread is offline, keeping sibling offline");
                OnlineState::Offline
            } else {
                requested
            };

            UnitWrite::new(topology.online_path(threads.sibling), target)
        })
        .collect();

    apply_unit_writes(control_plane, UnitKind::SmtCore, &writes)
}

fn read_online(
    control_plane: &impl ControlPlane,
    topology: &Topology<'_>,
    cpu: LogicalCore,
) -> Result<String, ControlError> {
    let path = topology.online_path(cpu);

    control_plane
        .read(&path)
        .map_err(|e| ControlError::new(path, e))
}

fn is_confirmed_offline(
    control_plane: &impl ControlPlane,
    topology: &Topology<'_>,
    cpu: LogicalCore,
) -> bool {
    read_online(control_plane, topology, cpu).is_ok_and(|value| value == OFFLINE)
}
