//! Platform configuration: the physical core count and the location of every control file.
//!
//! The defaults describe the reference platform (8 physical cores, 2 threads each, ASUS WMI
//! power limits). A TOML file may override any subset of the keys.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::ConfigError;
use crate::topology::Topology;

const DEFAULT_PHYSICAL_CORES: u32 = 8;
const DEFAULT_CPU_ROOT: &str = "/sys/devices/system/cpu";
const DEFAULT_SPL_CONTROL: &str = "/sys/devices/platform/asus-nb-wmi/ppt_pl1_spl";
const DEFAULT_FPPT_CONTROL: &str = "/sys/devices/platform/asus-nb-wmi/ppt_fppt";
const DEFAULT_SPPT_CONTROL: &str = "/sys/devices/platform/asus-nb-wmi/ppt_pl2_sppt";
const DEFAULT_PROFILE_CONTROL: &str = "/sys/firmware/acpi/platform_profile";
const DEFAULT_CHARGE_CONTROL: &str = "/sys/class/power_supply/BAT0/charge_control_end_threshold";
const DEFAULT_BOOST_CONTROL: &str = "/sys/devices/system/cpu/cpufreq/boost";

/// Describes the platform being controlled.
///
/// # Example
///
/// ```
/// use power_knobs::PlatformConfig;
///
/// let config = PlatformConfig::from_toml_str("physical_cores = 4").unwrap();
///
/// assert_eq!(config.physical_cores(), 4);
/// assert_eq!(config.cpu_root().to_str(), Some("/sys/devices/system/cpu"));
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PlatformConfig {
    physical_cores: u32,
    cpu_root: PathBuf,
    spl_control: PathBuf,
    fppt_control: PathBuf,
    sppt_control: PathBuf,
    profile_control: PathBuf,
    charge_control: PathBuf,
    boost_control: PathBuf,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            physical_cores: DEFAULT_PHYSICAL_CORES,
            cpu_root: PathBuf::from(DEFAULT_CPU_ROOT),
            spl_control: PathBuf::from(DEFAULT_SPL_CONTROL),
            fppt_control: PathBuf::from(DEFAULT_FPPT_CONTROL),
            sppt_control: PathBuf::from(DEFAULT_SPPT_CONTROL),
            profile_control: PathBuf::from(DEFAULT_PROFILE_CONTROL),
            charge_control: PathBuf::from(DEFAULT_CHARGE_CONTROL),
            boost_control: PathBuf::from(DEFAULT_BOOST_CONTROL),
        }
    }
}

impl PlatformConfig {
    /// Loads a configuration file. Keys missing from the file keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, contains unknown keys or
    /// declares fewer than 2 physical cores.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        config.validated()
    }

    /// Parses configuration from TOML text. Keys missing from the text keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML, contains unknown keys or declares fewer
    /// than 2 physical cores.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;

        config.validated()
    }

    /// Returns the same configuration with every control path moved under `root`.
    ///
    /// `/sys/devices/system/cpu` becomes `{root}/sys/devices/system/cpu`, which allows pointing
    /// the tool at a fake control file tree.
    #[must_use]
    pub fn rerooted(self, root: &Path) -> Self {
        let reroot = |path: PathBuf| root.join(path.strip_prefix("/").unwrap_or(path.as_path()));

        Self {
            physical_cores: self.physical_cores,
            cpu_root: reroot(self.cpu_root),
            spl_control: reroot(self.spl_control),
            fppt_control: reroot(self.fppt_control),
            sppt_control: reroot(self.sppt_control),
            profile_control: reroot(self.profile_control),
            charge_control: reroot(self.charge_control),
            boost_control: reroot(self.boost_control),
        }
    }

    /// Returns the same configuration for a platform with a different physical core count.
    ///
    /// # Errors
    ///
    /// Returns an error if `physical_cores` is less than 2.
    pub fn with_physical_cores(self, physical_cores: u32) -> Result<Self, ConfigError> {
        Self {
            physical_cores,
            ..self
        }
        .validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.physical_cores < 2 {
            return Err(ConfigError::TooFewPhysicalCores(self.physical_cores));
        }

        Ok(self)
    }

    /// Number of physical cores. Each has exactly two logical cores.
    #[must_use]
    pub const fn physical_cores(&self) -> u32 {
        self.physical_cores
    }

    /// Directory holding the `cpu{index}` directories.
    #[must_use]
    pub fn cpu_root(&self) -> &Path {
        &self.cpu_root
    }

    /// Sustained power limit (PL1) control.
    #[must_use]
    pub fn spl_control(&self) -> &Path {
        &self.spl_control
    }

    /// Fast package power tracking limit control.
    #[must_use]
    pub fn fppt_control(&self) -> &Path {
        &self.fppt_control
    }

    /// Slow package power tracking limit (PL2) control.
    #[must_use]
    pub fn sppt_control(&self) -> &Path {
        &self.sppt_control
    }

    /// ACPI platform profile control.
    #[must_use]
    pub fn profile_control(&self) -> &Path {
        &self.profile_control
    }

    /// Battery charge end threshold control.
    #[must_use]
    pub fn charge_control(&self) -> &Path {
        &self.charge_control
    }

    /// CPU frequency boost control.
    #[must_use]
    pub fn boost_control(&self) -> &Path {
        &self.boost_control
    }

    pub(crate) fn topology(&self) -> Topology<'_> {
        Topology::new(self.physical_cores, &self.cpu_root)
    }
}
