//! The user-facing knobs and how each maps onto control files.

use std::path::Path;

use derive_more::derive::Display;
use tracing::debug;

use crate::cores::set_core_count;
use crate::pal::ControlPlane;
use crate::smt::set_smt;
use crate::{ControlError, KnobError, PlatformConfig, RangeError, validate};

/// A power or performance setting that can be requested.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[non_exhaustive]
pub enum Knob {
    /// Number of schedulable physical cores.
    #[display("cores")]
    Cores,

    /// Package power limit in watts.
    #[display("tdp")]
    Tdp,

    /// Maximum battery charge level in percent.
    #[display("charge")]
    Charge,

    /// Simultaneous multithreading, 0 or 1.
    #[display("smt")]
    Smt,

    /// CPU frequency boost, 0 or 1.
    #[display("boost")]
    Boost,
}

impl Knob {
    /// Every knob, in the order an invocation applies them.
    pub const APPLY_ORDER: [Self; 5] = [
        Self::Cores,
        Self::Tdp,
        Self::Charge,
        Self::Smt,
        Self::Boost,
    ];

    /// Inclusive interval of accepted values on the given platform.
    #[must_use]
    pub fn bounds(self, config: &PlatformConfig) -> (i64, i64) {
        match self {
            Self::Cores => (2, i64::from(config.physical_cores())),
            Self::Tdp => (8, 25),
            Self::Charge => (50, 100),
            Self::Smt | Self::Boost => (0, 1),
        }
    }

    /// The command line flag, as shown in diagnostics.
    #[must_use]
    pub const fn flag(self) -> &'static str {
        match self {
            Self::Cores => "-cores",
            Self::Tdp => "-tdp",
            Self::Charge => "-charge",
            Self::Smt => "-smt",
            Self::Boost => "-boost",
        }
    }
}

/// Validates `value` for `knob` and, if accepted, applies it.
pub(crate) fn apply_knob(
    control_plane: &impl ControlPlane,
    config: &PlatformConfig,
    knob: Knob,
    value: i64,
) -> Result<(), KnobError> {
    let (min, max) = knob.bounds(config);
    validate(value, min, max)?;

    // Every interval is non-negative, so validation already guarantees this fits.
    let Ok(value) = u32::try_from(value) else {
        return Err(RangeError::new(value, min, max).into());
    };

    debug!(%knob, value, "applying knob");

    match knob {
        Knob::Cores => set_core_count(control_plane, &config.topology(), value)?,
        Knob::Smt => set_smt(control_plane, &config.topology(), value == 1)?,
        Knob::Tdp => set_tdp(control_plane, config, value)?,
        Knob::Charge => write_value(control_plane, config.charge_control(), &value.to_string())?,
        Knob::Boost => write_value(control_plane, config.boost_control(), &value.to_string())?,
    }

    Ok(())
}

/// The platform profile that goes with a power limit.
pub(crate) const fn tdp_profile(watts: u32) -> &'static str {
    match watts {
        0..17 => "quiet",
        17..25 => "balanced",
        _ => "performance",
    }
}

/// Selects the platform profile, then sets the sustained, fast and slow power limits.
///
/// Stops at the first failure. These are four different firmware controls, and leaving the
/// limits disagreeing with the profile is no better than leaving them untouched.
fn set_tdp(
    control_plane: &impl ControlPlane,
    config: &PlatformConfig,
    watts: u32,
) -> Result<(), ControlError> {
    let watts_value = watts.to_string();

    write_value(control_plane, config.profile_control(), tdp_profile(watts))?;
    write_value(control_plane, config.spl_control(), &watts_value)?;
    write_value(control_plane, config.fppt_control(), &watts_value)?;
    write_value(control_plane, config.sppt_control(), &watts_value)?;

    Ok(())
}

fn write_value(
    control_plane: &impl ControlPlane,
    path: &Path,
    value: &str,
) -> Result<(), ControlError> {
    control_plane
        .write(path, value)
        .map_err(|e| ControlError::new(path, e))
}
