// Helpers for unit tests that drive the logic against a mock control plane.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::pal::{ControlPlaneFacade, MockControlPlane};

pub(crate) const CPU_ROOT: &str = "/sys/devices/system/cpu";

pub(crate) fn online_path(cpu: u32) -> PathBuf {
    PathBuf::from(format!("{CPU_ROOT}/cpu{cpu}/online"))
}

/// Describes the control files a mock control plane pretends to have.
#[derive(Debug, Default)]
pub(crate) struct FakeControlFiles {
    values: HashMap<PathBuf, String>,
    unreadable: HashSet<PathBuf>,
    unwritable: HashSet<PathBuf>,
}

impl FakeControlFiles {
    /// Every logical core of a `physical_cores` platform online.
    pub(crate) fn all_online(physical_cores: u32) -> Self {
        let mut files = Self::default();

        for cpu in 0..physical_cores * 2 {
            files = files.with_value(online_path(cpu), "1");
        }

        files
    }

    pub(crate) fn with_value(mut self, path: impl Into<PathBuf>, value: &str) -> Self {
        self.values.insert(path.into(), value.to_string());
        self
    }

    pub(crate) fn with_cpu(self, cpu: u32, value: &str) -> Self {
        self.with_value(online_path(cpu), value)
    }

    pub(crate) fn unreadable(mut self, path: impl Into<PathBuf>) -> Self {
        self.unreadable.insert(path.into());
        self
    }

    pub(crate) fn unwritable(mut self, path: impl Into<PathBuf>) -> Self {
        self.unwritable.insert(path.into());
        self
    }

    /// Builds the control plane plus a log of every attempted write, in order.
    pub(crate) fn build(self) -> (ControlPlaneFacade, WriteLog) {
        let log = WriteLog::default();
        let mut mock = MockControlPlane::new();

        let values = self.values;
        let unreadable = self.unreadable;
        mock.expect_read().returning(move |path| {
            if unreadable.contains(path) {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "access denied",
                ));
            }

            values
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
        });

        let unwritable = self.unwritable;
        let writes = Arc::clone(&log.writes);
        mock.expect_write().returning(move |path, value| {
            writes
                .lock()
                .unwrap()
                .push((path.to_path_buf(), value.to_string()));

            if unwritable.contains(path) {
                Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "access denied",
                ))
            } else {
                Ok(())
            }
        });

        (ControlPlaneFacade::from_mock(mock), log)
    }
}

/// Every write attempted against a fake control plane.
#[derive(Clone, Debug, Default)]
pub(crate) struct WriteLog {
    writes: Arc<Mutex<Vec<(PathBuf, String)>>>,
}

impl WriteLog {
    pub(crate) fn entries(&self) -> Vec<(PathBuf, String)> {
        self.writes.lock().unwrap().clone()
    }

    /// The last value written to a path, if any.
    pub(crate) fn value_of(&self, path: &Path) -> Option<String> {
        self.entries()
            .into_iter()
            .rev()
            .find(|(written, _)| written == path)
            .map(|(_, value)| value)
    }

    pub(crate) fn value_of_cpu(&self, cpu: u32) -> Option<String> {
        self.value_of(&online_path(cpu))
    }
}
