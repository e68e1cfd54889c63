//! Bringing physical cores online or offline to match a requested core count.

use tracing::debug;

use crate::aggregate::{AggregateFailure, UnitKind, UnitWrite, apply_unit_writes};
use crate::pal::ControlPlane;
use crate::smt::{SmtState, assume_off_when_indeterminate, infer_smt_status};
use crate::topology::{ONLINE, OnlineState, Topology};

/// Makes `requested` physical cores schedulable, boot core included.
///
/// The current SMT state is inferred first. If it cannot be determined, SMT is assumed to be off
/// and siblings stay offline. Every managed logical core is then written in the interleaved order
/// primary(1), sibling(1), primary(2), sibling(2), ... and every failed write is reported.
pub(crate) fn set_core_count(
    control_plane: &impl ControlPlane,
    topology: &Topology<'_>,
    requested: u32,
) -> Result<(), AggregateFailure> {
    let smt = assume_off_when_indeterminate(infer_smt_status(control_plane, topology));
    debug!(requested, %smt, "setting core count");

    let writes = plan_core_count(topology, requested, smt);

    apply_unit_writes(control_plane, UnitKind::Core, &writes)
}

/// Computes the target of every managed logical core, in application order.
///
/// The cutoff applies to the position in the interleaved sequence. It is even, so both threads
/// of a physical core always land on the same side of it.
pub(crate) fn plan_core_count(
    topology: &Topology<'_>,
    requested: u32,
    smt: SmtState,
) -> Vec<UnitWrite> {
    let cutoff = requested.saturating_mul(2).saturating_sub(2);

    let threads = topology.managed_cores().flat_map(|core| {
        let threads = topology.threads(core);
        [(threads.primary, false), (threads.sibling, true)]
    });

    (0_u32..)
        .zip(threads)
        .map(|(position, (cpu, is_sibling))| {
            let target = if is_sibling && smt == SmtState::Off {
                OnlineState::Offline
            } else {
                OnlineState::from(position < cutoff)
            };

            UnitWrite::new(topology.online_path(cpu), target)
        })
        .collect()
}

/// Counts the physical cores whose primary thread is online. The boot core always counts.
///
/// Unreadable primaries are counted as offline.
pub(crate) fn read_online_core_count(
    control_plane: &impl ControlPlane,
    topology: &Topology<'_>,
) -> u32 {
    let online = topology
        .managed_cores()
        .filter(|&core| {
            let path = topology.online_path(topology.threads(core).primary);
            control_plane.read(&path).is_ok_and(|value| value == ONLINE)
        })
        .count();

    u32::try_from(online).unwrap_or(u32::MAX).saturating_add(1)
}
