//! Well-known strings shared by the parent and the relaunched child.

/// Environment variable set in the relaunched child. Its value is the name of
/// the active tool, and its presence means "do not relaunch again".
pub const TOOL_ENV_KEY: &str = "__YIQI_INSTRUMENTATION_TOOL_ACTIVE";

/// Long option used to select a tool, as in `--yiqi_tool=memcheck`.
pub const TOOL_OPTION: &str = "yiqi_tool";

/// Tool selected when no option is given.
pub const DEFAULT_TOOL_NAME: &str = "none";

pub const VALGRIND_WRAPPER: &str = "valgrind";
pub const VALGRIND_TOOL_OPTION_PREFIX: &str = "--tool=";

pub const PASSTHROUGH_WRAPPER: &str = "passthrough";
pub const PASSTHROUGH_OPTIONS: &str = "--passthrough";

/// Printed on stdout by a child which finds [`TOOL_ENV_KEY`] set.
pub const RUNNING_UNDER_HEADER: &str = "[YIQI] RUNNING UNDER INSTRUMENTATION: ";
