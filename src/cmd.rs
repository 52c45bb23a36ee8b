use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::OsStrExt;

use crate::array::NullTermArray;
use crate::error::{Error, Result};
use crate::tool::Program;


/// Build the command line that relaunches the current program under `tool`.
///
/// Yields, in order: the wrapper binary and wrapper options (each only if
/// non-empty), then the program's own invocation name `current_argv[0]`.
/// The rest of `current_argv` is dropped.
pub fn build_command_line<S>(current_argv: &[S], tool: &dyn Program) -> Result<Vec<OsString>>
where
    S: AsRef<OsStr>,
{
    let program = current_argv.first().ok_or(Error::MissingProgramName)?;

    // Usually wrapper, options, and program.
    let mut arguments: Vec<OsString> = Vec::with_capacity(3);

    let wrapper = tool.wrapper_binary();

    if !wrapper.is_empty() {
        arguments.push(wrapper.into());
    }

    let options = tool.wrapper_options();

    if !options.is_empty() {
        arguments.push(options.into());
    }

    arguments.push(program.as_ref().to_owned());

    Ok(arguments)
}

/// Copy each of `args` into a new null-terminated argument vector.
pub fn string_vector_to_argv<S>(args: &[S]) -> Result<NullTermArray<'static>>
where
    S: AsRef<OsStr>,
{
    let mut argv = NullTermArray::new();
    argv.append_all(args.iter().map(|arg| arg.as_ref().as_bytes()))?;
    Ok(argv)
}
