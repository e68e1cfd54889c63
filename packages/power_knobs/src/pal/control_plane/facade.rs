// Facade that dispatches to either the real control files or a mock in tests.

use std::fmt::{self, Debug};
use std::io;
use std::path::Path;
#[cfg(test)]
use std::sync::Arc;

#[cfg(test)]
use crate::pal::MockControlPlane;
use crate::pal::{BuildTargetControlPlane, ControlPlane};

/// Facade over control file access, dispatching to the real or the mock implementation.
///
/// In production this always uses `BuildTargetControlPlane`. In tests it can also wrap a
/// `MockControlPlane`.
pub(crate) enum ControlPlaneFacade {
    /// The control files of the running system.
    Target(&'static BuildTargetControlPlane),

    /// A mock configured by the test that created it.
    #[cfg(test)]
    Mock(Arc<MockControlPlane>),
}

static BUILD_TARGET_CONTROL_PLANE: BuildTargetControlPlane = BuildTargetControlPlane;

// Facade types are trivial pass-through layers - not worth testing.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl ControlPlaneFacade {
    pub(crate) const fn target() -> Self {
        Self::Target(&BUILD_TARGET_CONTROL_PLANE)
    }

    #[cfg(test)]
    pub(crate) fn from_mock(mock: MockControlPlane) -> Self {
        Self::Mock(Arc::new(mock))
    }
}

// Facade types are trivial pass-through layers - not worth testing.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl ControlPlane for ControlPlaneFacade {
    fn read(&self, path: &Path) -> io::Result<String> {
        match self {
            Self::Target(plane) => plane.read(path),
            #[cfg(test)]
            Self::Mock(mock) => mock.read(path),
        }
    }

    fn write(&self, path: &Path, value: &str) -> io::Result<()> {
        match self {
            Self::Target(plane) => plane.write(path, value),
            #[cfg(test)]
            Self::Mock(mock) => mock.write(path, value),
        }
    }
}

// Debug implementations have no API contract to test.
#[cfg_attr(coverage_nightly, coverage(off))]
#[cfg_attr(test, mutants::skip)]
impl Debug for ControlPlaneFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Target(_) => f.debug_struct("ControlPlaneFacade::Target").finish(),
            #[cfg(test)]
            Self::Mock(_) => f.debug_struct("ControlPlaneFacade::Mock").finish(),
        }
    }
}
