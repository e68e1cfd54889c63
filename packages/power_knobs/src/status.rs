//! Reading back the current value of every knob.

use serde::Serialize;
use serde_json::Serializer;
use serde_json::ser::PrettyFormatter;

use crate::PlatformConfig;
use crate::cores::read_online_core_count;
use crate::pal::ControlPlane;
use crate::smt::infer_smt_status;

/// Current value of every knob. A field is `None` if its control files could not be read.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[non_exhaustive]
pub struct StatusReport {
    /// Number of physical cores with an online primary thread, boot core included.
    pub cores: Option<String>,

    /// Sustained power limit in watts.
    pub tdp: Option<String>,

    /// Maximum battery charge level in percent.
    pub charge: Option<String>,

    /// `on` or `off`.
    pub smt: Option<String>,

    /// `1` if frequency boost is enabled, `0` otherwise.
    pub boost: Option<String>,
}

impl StatusReport {
    /// Renders the report as JSON, one field per line, indented by a single space.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails, which only happens on writer failure.
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut buf = Vec::new();
        let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b" "));
        self.serialize(&mut serializer)?;

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

pub(crate) fn read_status(
    control_plane: &impl ControlPlane,
    config: &PlatformConfig,
) -> StatusReport {
    let topology = config.topology();

    StatusReport {
        cores: Some(read_online_core_count(control_plane, &topology).to_string()),
        tdp: control_plane.read(config.spl_control()).ok(),
        charge: control_plane.read(config.charge_control()).ok(),
        smt: infer_smt_status(control_plane, &topology)
            .as_str()
            .map(str::to_owned),
        boost: control_plane.read(config.boost_control()).ok(),
    }
}
