//! The `--yiqi_tool` command line option.
//!
//! The rest of the command line belongs to the host test runner, so only
//! occurrences of our option are handed to the parser.

use std::ffi::OsStr;
use std::os::unix::ffi::OsStrExt;

use structopt::clap::AppSettings;
use structopt::StructOpt;

use crate::constants::{DEFAULT_TOOL_NAME, TOOL_OPTION};
use crate::error::Result;
use crate::tool::ToolId;


#[derive(Debug, StructOpt)]
#[structopt(name = "yiqi", setting = AppSettings::StrictUtf8)]
struct ToolOptions {
    /// Instrumentation tool to run the tests under.
    #[structopt(long = TOOL_OPTION, default_value = DEFAULT_TOOL_NAME)]
    yiqi_tool: String,
}

/// Name of the tool requested on the command line, or the default tool name.
///
/// Accepts `--yiqi_tool <name>` and `--yiqi_tool=<name>`. Unrelated arguments
/// are ignored, whatever their encoding. The name is not validated.
pub fn parse_tool_name<S>(argv: &[S]) -> Result<String>
where
    S: AsRef<OsStr>,
{
    let flag = format!("--{}", TOOL_OPTION);
    let flag = flag.as_bytes();

    let mut ours = vec![OsStr::new("yiqi")];
    let mut args = argv.iter().skip(1).map(|a| a.as_ref());

    while let Some(arg) = args.next() {
        let bytes = arg.as_bytes();

        if bytes == flag {
            ours.push(arg);

            if let Some(value) = args.next() {
                ours.push(value);
            }
        } else if let Some(rest) = bytes.strip_prefix(flag) {
            if rest.starts_with(b"=") {
                ours.push(arg);
            }
        }
    }

    let options = ToolOptions::from_iter_safe(ours)?;

    Ok(options.yiqi_tool)
}

/// Tool requested on the command line, or [`ToolId::None`].
pub fn parse_tool<S>(argv: &[S]) -> Result<ToolId>
where
    S: AsRef<OsStr>,
{
    ToolId::from_name(&parse_tool_name(argv)?)
}
