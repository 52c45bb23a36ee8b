use std::collections::TryReserveError;
use std::ffi::NulError;
use std::path::PathBuf;

use crate::tool::ToolId;


pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("No such tool with name = {name:?}")]
    UnknownTool { name: String },

    #[error("Tool not available for identifier ordinal = {ordinal}")]
    ToolNotAvailable { ordinal: usize },

    #[error("Invalid instrumentation command line option")]
    Options(#[from] structopt::clap::Error),

    #[error("Relaunch requested for tool = {tool} which has no wrapper binary")]
    NoWrapperBinary { tool: ToolId },

    #[error("Relaunch requested for tool = {tool} which has no name")]
    NoToolName { tool: ToolId },

    #[error("Command line must contain at least the program name")]
    MissingProgramName,

    #[error("String contains an interior NUL byte")]
    Nul(#[from] NulError),

    #[error("Executable search path is empty")]
    EmptyExecutablePath,

    #[error("Could not find wrapper = {wrapper:?} in any of {searched:?}")]
    ExecutableNotFound {
        wrapper: String,
        searched: Vec<PathBuf>,
    },

    #[error("Could not exec binary = {binary:?}")]
    Exec {
        binary: String,
        source: nix::Error,
    },

    #[error("Exec of binary = {binary:?} failed, but did not return -1")]
    ExecReturned { binary: String },

    #[error("Could not allocate storage")]
    Allocation(#[from] TryReserveError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of an [`Error`], for callers which only need to
/// know who is at fault.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Unknown tool name or identifier, or malformed tool option.
    Configuration,

    /// Relaunch machinery invoked with a tool that can't be relaunched.
    Logic,

    /// Caller passed data that can't be turned into a command line.
    InvalidInput,

    /// Depends on the deployment environment, e.g. `PATH`.
    Environment,

    /// The exec primitive itself failed.
    System,

    Resource,

    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use Error::*;

        match self {
            UnknownTool { .. } | ToolNotAvailable { .. } | Options(..) =>
                ErrorKind::Configuration,
            NoWrapperBinary { .. } | NoToolName { .. } =>
                ErrorKind::Logic,
            MissingProgramName | Nul(..) =>
                ErrorKind::InvalidInput,
            EmptyExecutablePath | ExecutableNotFound { .. } =>
                ErrorKind::Environment,
            Exec { .. } | ExecReturned { .. } =>
                ErrorKind::System,
            Allocation(..) =>
                ErrorKind::Resource,
            Internal(..) =>
                ErrorKind::Internal,
        }
    }

    /// The OS error code, if the exec primitive failed with one.
    pub fn errno(&self) -> Option<nix::errno::Errno> {
        if let Error::Exec { source, .. } = self {
            Some(*source)
        } else {
            None
        }
    }
}

macro_rules! internal_error {
    ($msg: expr) => {
        return Err(crate::error::Error::Internal($msg.into()))
    };
}
