use std::fmt::Debug;
use std::io;
use std::path::Path;

/// The kernel exposes the knobs we care about as tiny virtual files (`cpu3/online`,
/// `platform_profile` and friends). This trait abstracts reading and writing them so that the
/// logic on top can be tested without root privileges or the matching hardware.
///
/// All I/O is synchronous and blocking. These are single-token files served from memory by the
/// kernel, never from a storage device.
#[cfg_attr(test, mockall::automock)]
pub(crate) trait ControlPlane: Debug + Send + Sync + 'static {
    /// Reads the current value of a control file.
    ///
    /// Only a small prefix of the file is read. The result is whitespace-trimmed, so an online
    /// toggle comes back as `"1"` or `"0"` without the trailing newline.
    fn read(&self, path: &Path) -> io::Result<String>;

    /// Writes `value` verbatim into an existing control file.
    ///
    /// The file is never created. A failed write is not retried.
    fn write(&self, path: &Path, value: &str) -> io::Result<()>;
}
