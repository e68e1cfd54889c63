use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

use tracing::info;

use crate::pal::ControlPlane;

/// Control files hold a single short token. Anything past this is ignored.
const READ_BUDGET_BYTES: usize = 16;

/// The control files of the real operating system that the build is targeting.
#[derive(Debug, Default)]
pub(crate) struct BuildTargetControlPlane;

// Real control file access is exercised by the integration tests against a temporary tree.
#[cfg_attr(coverage_nightly, coverage(off))]
impl ControlPlane for BuildTargetControlPlane {
    fn read(&self, path: &Path) -> io::Result<String> {
        let mut file = File::open(path)?;

        let mut buf = [0_u8; READ_BUDGET_BYTES];
        let len = file.read(&mut buf)?;

        let contents = buf.get(..len).unwrap_or_default();
        Ok(String::from_utf8_lossy(contents).trim().to_owned())
    }

    fn write(&self, path: &Path, value: &str) -> io::Result<()> {
        let mut file = OpenOptions::new().write(true).open(path)?;
        file.write_all(value.as_bytes())?;

        info!("{value} > {}", path.display());
        Ok(())
    }
}
