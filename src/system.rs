//! The operating system calls needed to relaunch, behind a substitutable trait.

use std::convert::Infallible;
use std::env;
use std::ffi::{CStr, OsStr, OsString};
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use nix::{
    errno::Errno,
    unistd::{access, AccessFlags},
};
use tracing::trace;

use crate::array::NullTermArray;
use crate::error::{Error, Result};


pub trait SystemCalls {
    /// `true` if `path` names a regular file we may execute.
    fn exe_exists(&self, path: &Path) -> bool;

    /// Replace the current process image with `binary`.
    ///
    /// `argv` and `envp` are null-terminated, as returned by
    /// [`NullTermArray::underlying_array()`]. Never returns on success.
    fn exec_in_place(
        &self,
        binary: &CStr,
        argv: &[*const libc::c_char],
        envp: &[*const libc::c_char],
    ) -> Result<Infallible>;

    /// Colon-delimited executable search path. Empty if unset.
    fn executable_path(&self) -> OsString;

    /// Environment of the current process, as `KEY=VALUE` entries.
    fn system_environment(&self) -> NullTermArray<'_>;

    /// Value of a single environment variable, if set.
    fn environment_variable(&self, key: &str) -> Option<String>;
}

/// [`SystemCalls`] backed by the host Unix system.
#[derive(Clone, Copy, Debug, Default)]
pub struct UnixCalls;

impl UnixCalls {
    pub fn new() -> Self {
        Self
    }
}

impl SystemCalls for UnixCalls {
    fn exe_exists(&self, path: &Path) -> bool {
        // A directory passes the `X_OK` check too.
        let is_file = fs::metadata(path).map_or(false, |m| m.is_file());
        let exists = is_file && access(path, AccessFlags::X_OK).is_ok();

        trace!(path = %path.display(), exists, "checked for executable");

        exists
    }

    fn exec_in_place(
        &self,
        binary: &CStr,
        argv: &[*const libc::c_char],
        envp: &[*const libc::c_char],
    ) -> Result<Infallible> {
        let terminated = |a: &[*const libc::c_char]| a.last().map_or(false, |p| p.is_null());

        if !terminated(argv) || !terminated(envp) {
            internal_error!("exec arrays must be null-terminated");
        }

        // Use `libc::execve` directly: the `nix` wrapper would copy both arrays,
        // and ours are already built.
        let res = unsafe { libc::execve(binary.as_ptr(), argv.as_ptr(), envp.as_ptr()) };

        let binary = binary.to_string_lossy().into_owned();

        if res == -1 {
            Err(Error::Exec { binary, source: Errno::last() })
        } else {
            Err(Error::ExecReturned { binary })
        }
    }

    fn executable_path(&self) -> OsString {
        env::var_os("PATH").unwrap_or_default()
    }

    fn system_environment(&self) -> NullTermArray<'_> {
        let mut environment = NullTermArray::new();

        for (key, value) in env::vars_os() {
            let mut pair = key.as_bytes().to_vec();
            pair.push(b'=');
            pair.extend_from_slice(value.as_bytes());

            // Entries from the OS can't hold a NUL. Skip rather than abort if
            // one ever does.
            if let Err(err) = environment.append(pair) {
                trace!(%err, "skipping unrepresentable environment entry");
            }
        }

        environment
    }

    fn environment_variable(&self, key: &str) -> Option<String> {
        env::var_os(key).map(|value| value.to_string_lossy().into_owned())
    }
}

/// Split a `:`-delimited search path into its components, in order.
///
/// Empty components are kept. An absent path has no components. Components
/// need not be UTF-8.
pub fn split_path_string(path: Option<&OsStr>) -> Vec<&OsStr> {
    match path {
        Some(path) => path
            .as_bytes()
            .split(|&b| b == b':')
            .map(OsStr::from_bytes)
            .collect(),
        None => vec![],
    }
}
