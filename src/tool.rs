//! Instrumentation tools: how to relaunch under one, and how to drive one.
//!
//! The tool set is closed. Each [`ToolId`] indexes one row of a static table
//! holding its launch data and the constructors of its [`Program`] and
//! [`Controller`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use tracing::{debug, warn};

use crate::constants::{
    PASSTHROUGH_OPTIONS,
    PASSTHROUGH_WRAPPER,
    VALGRIND_TOOL_OPTION_PREFIX,
    VALGRIND_WRAPPER,
};
use crate::error::{Error, Result};


/// Identifier of a supported instrumentation tool.
///
/// The discriminant is the tool's ordinal in the factory table.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum ToolId {
    None = 0,
    Timer = 1,
    Memcheck = 2,
    Callgrind = 3,
    Cachegrind = 4,
    Passthrough = 5,
}

impl ToolId {
    pub const ALL: [ToolId; 6] = [
        ToolId::None,
        ToolId::Timer,
        ToolId::Memcheck,
        ToolId::Callgrind,
        ToolId::Cachegrind,
        ToolId::Passthrough,
    ];

    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn from_ordinal(ordinal: usize) -> Result<Self> {
        Self::ALL
            .get(ordinal)
            .copied()
            .ok_or(Error::ToolNotAvailable { ordinal })
    }

    /// Exact, case-sensitive lookup of a tool by name.
    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|tool| tool.name() == name)
            .ok_or_else(|| Error::UnknownTool { name: name.to_owned() })
    }

    pub fn name(self) -> &'static str {
        TOOLS[self.ordinal()].name
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Describes how to relaunch the current program under a tool.
pub trait Program {
    /// Wrapper binary to exec in place of the current program. Empty if no
    /// relaunch is needed.
    fn wrapper_binary(&self) -> &str;

    /// Single argument passed to the wrapper, before the program path. May be
    /// empty.
    fn wrapper_options(&self) -> &str;

    /// Name of the tool, as exported to the relaunched child.
    fn name(&self) -> &str;

    fn tool_id(&self) -> ToolId;
}

/// Brackets a test iteration with tool-specific start and stop actions.
///
/// Calls to [`start()`](Controller::start) and [`stop()`](Controller::stop)
/// must alternate, starting with `start()`. This is not checked.
pub trait Controller {
    fn start(&mut self);

    fn stop(&mut self) -> Status;

    fn tool_id(&self) -> ToolId;
}

/// Value reported by a tool.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Warnings and results collected between a `start()` and `stop()`.
#[derive(Debug, Default, PartialEq)]
pub struct Status {
    pub warnings: Vec<(String, Value)>,
    pub results: Vec<(String, Value)>,

    /// Annotations keyed by source line number.
    pub lines: BTreeMap<usize, (String, Value)>,
}

impl Status {
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty() && self.results.is_empty() && self.lines.is_empty()
    }
}

/// Constructors for the two views of one tool.
#[derive(Clone, Copy)]
pub struct FactoryPackage {
    pub program: fn() -> Box<dyn Program>,
    pub controller: fn() -> Box<dyn Controller>,
}

impl fmt::Debug for FactoryPackage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryPackage").finish_non_exhaustive()
    }
}

/// Look up the factory package for the tool with the given ordinal.
///
/// Fails with [`Error::ToolNotAvailable`] if no tool has that ordinal.
pub fn factory_package_for_ordinal(ordinal: usize) -> Result<FactoryPackage> {
    TOOLS
        .get(ordinal)
        .map(|row| row.factories)
        .ok_or(Error::ToolNotAvailable { ordinal })
}

pub fn factory_package_for_tool(tool: ToolId) -> Result<FactoryPackage> {
    factory_package_for_ordinal(tool.ordinal())
}

struct ToolRow {
    name: &'static str,
    wrapper: &'static str,
    options: Options,
    factories: FactoryPackage,
}

enum Options {
    Fixed(&'static str),

    // `--tool=<name>`, followed by any tool-specific additions.
    Valgrind { additional: &'static str },
}

// Indexed by `ToolId` ordinal.
static TOOLS: [ToolRow; 6] = [
    ToolRow {
        name: "none",
        wrapper: "",
        options: Options::Fixed(""),
        factories: FactoryPackage {
            program: make_program::<{ ToolId::None as usize }>,
            controller: make_null_controller::<{ ToolId::None as usize }>,
        },
    },
    ToolRow {
        name: "timer",
        wrapper: "",
        options: Options::Fixed(""),
        factories: FactoryPackage {
            program: make_program::<{ ToolId::Timer as usize }>,
            controller: make_timer_controller,
        },
    },
    ToolRow {
        name: "memcheck",
        wrapper: VALGRIND_WRAPPER,
        options: Options::Valgrind { additional: "" },
        factories: FactoryPackage {
            program: make_program::<{ ToolId::Memcheck as usize }>,
            controller: make_null_controller::<{ ToolId::Memcheck as usize }>,
        },
    },
    ToolRow {
        name: "callgrind",
        wrapper: VALGRIND_WRAPPER,
        options: Options::Valgrind { additional: "" },
        factories: FactoryPackage {
            program: make_program::<{ ToolId::Callgrind as usize }>,
            controller: make_null_controller::<{ ToolId::Callgrind as usize }>,
        },
    },
    ToolRow {
        name: "cachegrind",
        wrapper: VALGRIND_WRAPPER,
        options: Options::Valgrind { additional: "" },
        factories: FactoryPackage {
            program: make_program::<{ ToolId::Cachegrind as usize }>,
            controller: make_null_controller::<{ ToolId::Cachegrind as usize }>,
        },
    },
    ToolRow {
        name: "passthrough",
        wrapper: PASSTHROUGH_WRAPPER,
        options: Options::Fixed(PASSTHROUGH_OPTIONS),
        factories: FactoryPackage {
            program: make_program::<{ ToolId::Passthrough as usize }>,
            controller: make_null_controller::<{ ToolId::Passthrough as usize }>,
        },
    },
];

/// Launch data of one of the built-in tools.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ToolProgram {
    tool: ToolId,
    options: String,
}

impl ToolProgram {
    pub fn new(tool: ToolId) -> Self {
        let row = &TOOLS[tool.ordinal()];

        let options = match row.options {
            Options::Fixed(options) => options.to_owned(),
            Options::Valgrind { additional } =>
                format!("{}{}{}", VALGRIND_TOOL_OPTION_PREFIX, row.name, additional),
        };

        Self { tool, options }
    }
}

impl Program for ToolProgram {
    fn wrapper_binary(&self) -> &str {
        TOOLS[self.tool.ordinal()].wrapper
    }

    fn wrapper_options(&self) -> &str {
        &self.options
    }

    fn name(&self) -> &str {
        self.tool.name()
    }

    fn tool_id(&self) -> ToolId {
        self.tool
    }
}

fn make_program<const ORDINAL: usize>() -> Box<dyn Program> {
    Box::new(ToolProgram::new(ToolId::ALL[ORDINAL]))
}

/// Controller for tools which do all their work outside the process, or none at all.
#[derive(Debug)]
pub struct NullController {
    tool: ToolId,
}

impl NullController {
    pub fn new(tool: ToolId) -> Self {
        Self { tool }
    }
}

impl Controller for NullController {
    fn start(&mut self) {
        debug!(tool = %self.tool, "starting instrumentation");
    }

    fn stop(&mut self) -> Status {
        debug!(tool = %self.tool, "stopping instrumentation");
        Status::default()
    }

    fn tool_id(&self) -> ToolId {
        self.tool
    }
}

fn make_null_controller<const ORDINAL: usize>() -> Box<dyn Controller> {
    Box::new(NullController::new(ToolId::ALL[ORDINAL]))
}

/// Result key of the elapsed wall time, in microseconds.
pub const ELAPSED_US: &str = "elapsed_us";

/// Measures the wall time between `start()` and `stop()`.
#[derive(Debug, Default)]
pub struct TimerController {
    started: Option<Instant>,
}

impl TimerController {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Controller for TimerController {
    fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    fn stop(&mut self) -> Status {
        let mut status = Status::default();

        if let Some(started) = self.started.take() {
            let elapsed = started.elapsed().as_micros();
            let elapsed = i64::try_from(elapsed).unwrap_or(i64::MAX);

            debug!(elapsed, "timed iteration");
            status.results.push((ELAPSED_US.to_owned(), Value::Int(elapsed)));
        } else {
            warn!("timer stopped without being started");
        }

        status
    }

    fn tool_id(&self) -> ToolId {
        ToolId::Timer
    }
}

fn make_timer_controller() -> Box<dyn Controller> {
    Box::new(TimerController::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    use crate::error::ErrorKind;

    #[test]
    fn test_names_round_trip() {
        for tool in ToolId::ALL {
            assert_eq!(ToolId::from_name(tool.name()).unwrap(), tool);
            assert_eq!(ToolId::from_ordinal(tool.ordinal()).unwrap(), tool);
        }
    }

    #[test]
    fn test_name_lookup_is_exact() {
        for name in ["Memcheck", "memcheck ", "", "valgrind"] {
            let err = name.parse::<ToolId>().unwrap_err();

            assert!(matches!(err, Error::UnknownTool { .. }));
            assert_eq!(err.kind(), ErrorKind::Configuration);
        }
    }

    #[test]
    fn test_tool_data() {
        let cases = [
            (ToolId::None, "", ""),
            (ToolId::Timer, "", ""),
            (ToolId::Memcheck, "valgrind", "--tool=memcheck"),
            (ToolId::Callgrind, "valgrind", "--tool=callgrind"),
            (ToolId::Cachegrind, "valgrind", "--tool=cachegrind"),
            (ToolId::Passthrough, "passthrough", "--passthrough"),
        ];

        for (tool, wrapper, options) in cases {
            let program = (factory_package_for_tool(tool).unwrap().program)();

            assert_eq!(program.tool_id(), tool);
            assert_eq!(program.name(), tool.name());
            assert_eq!(program.wrapper_binary(), wrapper);
            assert_eq!(program.wrapper_options(), options);
        }
    }

    #[test]
    fn test_controllers_match_tool() {
        for tool in ToolId::ALL {
            let controller = (factory_package_for_tool(tool).unwrap().controller)();
            assert_eq!(controller.tool_id(), tool);
        }
    }

    #[test]
    fn test_factory_out_of_range() {
        let ordinal = ToolId::ALL.len();
        let err = factory_package_for_ordinal(ordinal).unwrap_err();

        assert!(matches!(err, Error::ToolNotAvailable { ordinal: o } if o == ordinal));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_timer_reports_elapsed() {
        let mut timer = TimerController::new();

        timer.start();
        let status = timer.stop();

        assert_eq!(status.results.len(), 1);
        assert_eq!(status.results[0].0, ELAPSED_US);
        assert!(matches!(status.results[0].1, Value::Int(us) if us >= 0));
        assert!(status.warnings.is_empty());
    }

    #[test]
    fn test_timer_stop_without_start_is_empty() {
        let mut timer = TimerController::new();

        assert!(timer.stop().is_empty());
    }
}
