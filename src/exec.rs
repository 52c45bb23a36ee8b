//! Find the wrapper binary of a tool and relaunch the current program under it.

use std::convert::Infallible;
use std::ffi::{CString, OsStr, OsString};
use std::os::unix::ffi::OsStringExt;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::array::{insert_environment_pair, NullTermArray};
use crate::cmd::{build_command_line, string_vector_to_argv};
use crate::constants::TOOL_ENV_KEY;
use crate::error::{Error, Result};
use crate::system::{split_path_string, SystemCalls};
use crate::tool::Program;


/// Return the first `<dir>/<wrapper>` which exists, searching the directories
/// of the executable path from left to right.
///
/// Fails with [`Error::NoWrapperBinary`], without querying `calls`, if `tool`
/// has no wrapper.
pub fn find_executable(tool: &dyn Program, calls: &dyn SystemCalls) -> Result<PathBuf> {
    let wrapper = tool.wrapper_binary();

    if wrapper.is_empty() {
        return Err(Error::NoWrapperBinary { tool: tool.tool_id() });
    }

    let path = calls.executable_path();

    if path.is_empty() {
        return Err(Error::EmptyExecutablePath);
    }

    let mut searched = vec![];

    for dir in split_path_string(Some(path.as_os_str())) {
        // Joined by hand: `Path::join` would drop an empty directory.
        let mut candidate = OsString::from(dir);
        candidate.push("/");
        candidate.push(wrapper);
        let candidate = PathBuf::from(candidate);

        debug!(candidate = %candidate.display(), "searching for wrapper");

        if calls.exe_exists(&candidate) {
            return Ok(candidate);
        }

        searched.push(candidate);
    }

    Err(Error::ExecutableNotFound { wrapper: wrapper.to_owned(), searched })
}

/// Argument vector to exec the wrapper of `tool` with, given the argument
/// vector of the current program.
pub fn get_tool_argv<S>(tool: &dyn Program, current_argv: &[S]) -> Result<NullTermArray<'static>>
where
    S: AsRef<OsStr>,
{
    let args = build_command_line(current_argv, tool)?;
    string_vector_to_argv(&args)
}

/// The current environment, with the name of `tool` exported under
/// [`TOOL_ENV_KEY`] so the relaunched program knows not to relaunch again.
pub fn get_tool_env<'s>(tool: &dyn Program, calls: &'s dyn SystemCalls) -> Result<NullTermArray<'s>> {
    let name = tool.name();

    if name.is_empty() {
        return Err(Error::NoToolName { tool: tool.tool_id() });
    }

    let mut env = calls.system_environment();
    insert_environment_pair(&mut env, TOOL_ENV_KEY, name)?;

    Ok(env)
}

/// Replace the current process with the one described by the three fetch
/// callbacks.
///
/// Only returns on failure.
pub fn relaunch<'s, E, A, V>(
    tool: &dyn Program,
    fetch_executable: E,
    fetch_argv: A,
    fetch_env: V,
    calls: &'s dyn SystemCalls,
) -> Result<Infallible>
where
    E: FnOnce(&dyn Program, &dyn SystemCalls) -> Result<PathBuf>,
    A: FnOnce(&dyn Program) -> Result<NullTermArray<'static>>,
    V: FnOnce(&dyn Program, &'s dyn SystemCalls) -> Result<NullTermArray<'s>>,
{
    let executable = fetch_executable(tool, calls)?;
    let argv = fetch_argv(tool)?;
    let env = fetch_env(tool, calls)?;

    info!(
        tool = tool.name(),
        executable = %executable.display(),
        argv = ?argv,
        "relaunching under instrumentation"
    );

    let binary = CString::new(executable.into_os_string().into_vec())?;

    calls.exec_in_place(&binary, argv.underlying_array(), env.underlying_array())
}

/// Relaunch the current program under `tool`, searching the executable path
/// for its wrapper.
///
/// `current_argv` is the argument vector the current program was started with.
/// Only returns on failure.
pub fn relaunch_current_program<S>(
    tool: &dyn Program,
    current_argv: &[S],
    calls: &dyn SystemCalls,
) -> Result<Infallible>
where
    S: AsRef<OsStr>,
{
    relaunch(
        tool,
        find_executable,
        |tool| get_tool_argv(tool, current_argv),
        get_tool_env,
        calls,
    )
}
