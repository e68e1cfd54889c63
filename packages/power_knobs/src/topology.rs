//! Mapping from physical cores to the logical cores (hardware threads) the kernel exposes.
//!
//! Every physical core `i` of a platform with `P` physical cores has exactly two logical cores:
//! the primary thread `cpu{i}` and the SMT sibling `cpu{i + P}`. Wider SMT is not supported.

use std::iter::FusedIterator;
use std::ops::Range;
use std::path::{Path, PathBuf};

use derive_more::derive::Display;

/// Value of an online toggle for a logical core that is online.
pub(crate) const ONLINE: &str = "1";

/// Value of an online toggle for a logical core that is offline.
pub(crate) const OFFLINE: &str = "0";

/// Index of a physical core, in `[0, P)`.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("core {_0}")]
pub(crate) struct PhysicalCore(u32);

impl PhysicalCore {
    /// The boot core. It is never taken offline and the kernel usually refuses to anyway.
    pub(crate) const BOOT: Self = Self(0);

    pub(crate) const fn index(self) -> u32 {
        self.0
    }

    pub(crate) fn is_boot(self) -> bool {
        self == Self::BOOT
    }
}

/// One hardware thread, addressed by the kernel as `cpu{index}`.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[display("cpu{_0}")]
pub(crate) struct LogicalCore(u32);

impl LogicalCore {
    #[cfg(test)]
    pub(crate) const fn index(self) -> u32 {
        self.0
    }
}

/// The two logical cores of one physical core.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct CoreThreads {
    pub(crate) primary: LogicalCore,
    pub(crate) sibling: LogicalCore,
}

/// Desired state of an online toggle.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub(crate) enum OnlineState {
    #[display("online")]
    Online,

    #[display("offline")]
    Offline,
}

impl OnlineState {
    pub(crate) const fn control_value(self) -> &'static str {
        match self {
            Self::Online => ONLINE,
            Self::Offline => OFFLINE,
        }
    }
}

impl From<bool> for OnlineState {
    fn from(online: bool) -> Self {
        if online { Self::Online } else { Self::Offline }
    }
}

/// The core layout of the platform plus the directory the kernel exposes it under.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Topology<'a> {
    physical_cores: u32,
    cpu_root: &'a Path,
}

impl<'a> Topology<'a> {
    pub(crate) const fn new(physical_cores: u32, cpu_root: &'a Path) -> Self {
        Self {
            physical_cores,
            cpu_root,
        }
    }

    /// Every physical core, boot core included.
    pub(crate) fn all_cores(&self) -> PhysicalCores {
        PhysicalCores(0..self.physical_cores)
    }

    /// Every physical core that may be taken offline, i.e. all but the boot core.
    pub(crate) fn managed_cores(&self) -> PhysicalCores {
        PhysicalCores(1..self.physical_cores)
    }

    pub(crate) fn threads(&self, core: PhysicalCore) -> CoreThreads {
        debug_assert!(core.index() < self.physical_cores);

        CoreThreads {
            primary: LogicalCore(core.index()),
            sibling: LogicalCore(core.index().saturating_add(self.physical_cores)),
        }
    }

    /// Path of the online toggle of a logical core.
    pub(crate) fn online_path(&self, cpu: LogicalCore) -> PathBuf {
        self.cpu_root.join(cpu.to_string()).join("online")
    }
}

/// Iterator over a contiguous range of physical cores.
#[derive(Clone, Debug)]
pub(crate) struct PhysicalCores(Range<u32>);

impl Iterator for PhysicalCores {
    type Item = PhysicalCore;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(PhysicalCore)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.0.size_hint()
    }
}

impl ExactSizeIterator for PhysicalCores {}
impl FusedIterator for PhysicalCores {}
