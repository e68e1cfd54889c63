// Platform abstraction layer for power_knobs.
//
// Every read and write of a kernel control file goes through the `ControlPlane` trait so the
// topology logic can be exercised against a mock. Same three layers as the rest of the workspace:
// abstraction (trait) → facade (enum) → real implementation.

mod control_plane;

pub(crate) use control_plane::*;
