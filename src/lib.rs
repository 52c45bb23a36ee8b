#[macro_use]
pub mod error;

pub mod array;
pub mod cmd;
pub mod constants;
pub mod exec;
pub mod options;
pub mod platform;
pub mod system;
pub mod tool;

pub use array::NullTermArray;
pub use error::{Error, ErrorKind, Result};
pub use exec::{find_executable, get_tool_argv, get_tool_env, relaunch, relaunch_current_program};
pub use platform::{init, init_with, IterationHooks, Platform};
pub use system::{SystemCalls, UnixCalls};
pub use tool::{Controller, FactoryPackage, Program, Status, ToolId, Value};
