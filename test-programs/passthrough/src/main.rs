//! Stand-in for an instrumentation wrapper.
//!
//! Prints a startup line, echoes each `--` option, then runs the first
//! non-option argument with the arguments after it, and exits with its exit
//! code. Exits 1 if there is nothing to run.

use std::env;
use std::os::unix::process::ExitStatusExt;
use std::process::{exit, Command};

use anyhow::{bail, Result};

const STARTUP_MESSAGE: &str = "PASSTHROUGH BINARY LAUNCHED";
const OPTION_HEADER: &str = "OPTION: ";

fn main() -> Result<()> {
    println!("{}", STARTUP_MESSAGE);

    let args: Vec<String> = env::args().skip(1).collect();

    for (i, arg) in args.iter().enumerate() {
        if arg.starts_with("--") {
            println!("{}{}", OPTION_HEADER, arg);
            continue;
        }

        let status = Command::new(arg).args(&args[i + 1..]).status()?;

        if let Some(signal) = status.signal() {
            bail!("child killed by signal {}", signal);
        }

        exit(status.code().unwrap_or(1));
    }

    exit(1);
}
