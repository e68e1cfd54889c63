use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::AggregateFailure;

/// A single control file could not be read or written.
#[derive(Debug, Error)]
#[error("{}: {source}", .path.display())]
pub struct ControlError {
    path: PathBuf,
    source: io::Error,
}

impl ControlError {
    pub(crate) fn new(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }

    /// The control file that failed.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying I/O error.
    #[must_use]
    pub fn io_error(&self) -> &io::Error {
        &self.source
    }
}

/// A requested knob value lies outside the interval the knob accepts.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("{value} is out of range ({min} - {max})")]
pub struct RangeError {
    value: i64,
    min: i64,
    max: i64,
}

impl RangeError {
    pub(crate) const fn new(value: i64, min: i64, max: i64) -> Self {
        Self { value, min, max }
    }

    /// The rejected value.
    #[must_use]
    pub const fn value(&self) -> i64 {
        self.value
    }

    /// The smallest accepted value.
    #[must_use]
    pub const fn min(&self) -> i64 {
        self.min
    }

    /// The largest accepted value.
    #[must_use]
    pub const fn max(&self) -> i64 {
        self.max
    }
}

/// Why a single knob could not be applied.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KnobError {
    /// The value was rejected before anything was written.
    #[error("{0}")]
    Range(#[from] RangeError),

    /// A knob backed by one control file (or a short fail-fast chain of them) hit an I/O error.
    #[error("{0}")]
    Control(#[from] ControlError),

    /// A knob spanning many independent units failed on some of them.
    #[error("{0}")]
    Aggregate(#[from] AggregateFailure),
}

/// The platform configuration could not be loaded.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {}: {source}", .path.display())]
    Read {
        /// The configuration file.
        path: PathBuf,

        /// The underlying I/O error.
        source: io::Error,
    },

    /// The configuration file is not valid TOML or has unexpected keys.
    #[error("invalid configuration file {}: {source}", .path.display())]
    Parse {
        /// The configuration file.
        path: PathBuf,

        /// The parser error.
        source: toml::de::Error,
    },

    /// Every platform has a boot core plus at least one more physical core we can manage.
    #[error("physical core count must be at least 2, got {0}")]
    TooFewPhysicalCores(u32),
}
