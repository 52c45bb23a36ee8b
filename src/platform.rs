//! Start-up of an instrumented test binary, and the seam to its test runner.

use std::ffi::OsStr;

use tracing::{debug, info};

use crate::constants::{RUNNING_UNDER_HEADER, TOOL_ENV_KEY};
use crate::error::Result;
use crate::exec::relaunch_current_program;
use crate::options::parse_tool;
use crate::system::{SystemCalls, UnixCalls};
use crate::tool::{factory_package_for_tool, Controller, Status, ToolId};


/// A host test runner, which drives the controller of the active tool.
pub trait Platform {
    fn register(&mut self, controller: Box<dyn Controller>);
}

/// A [`Platform`] for runners without a listener API: call
/// [`iteration_start()`](IterationHooks::iteration_start) and
/// [`iteration_end()`](IterationHooks::iteration_end) around each test iteration.
#[derive(Default)]
pub struct IterationHooks {
    controller: Option<Box<dyn Controller>>,
}

impl IterationHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active tool, if a controller has been registered.
    pub fn tool_id(&self) -> Option<ToolId> {
        self.controller.as_ref().map(|c| c.tool_id())
    }

    pub fn iteration_start(&mut self) {
        if let Some(controller) = &mut self.controller {
            controller.start();
        }
    }

    pub fn iteration_end(&mut self) -> Option<Status> {
        self.controller.as_mut().map(|c| c.stop())
    }
}

impl Platform for IterationHooks {
    fn register(&mut self, controller: Box<dyn Controller>) {
        debug!(tool = %controller.tool_id(), "registering controller");
        self.controller = Some(controller);
    }
}

/// Decide whether to relaunch the current program under the tool selected by
/// `argv`, using the host system.
///
/// See [`init_with()`].
pub fn init<S>(platform: &mut dyn Platform, argv: &[S]) -> Result<()>
where
    S: AsRef<OsStr>,
{
    init_with(platform, argv, &UnixCalls::new())
}

/// Start up an instrumented test binary.
///
/// If we were already relaunched, register the controller of the active tool.
/// Otherwise look up the tool selected by `argv`: if it needs no wrapper,
/// register its controller, else relaunch under the wrapper. In the relaunch
/// case this only returns on failure.
pub fn init_with<S>(platform: &mut dyn Platform, argv: &[S], calls: &dyn SystemCalls) -> Result<()>
where
    S: AsRef<OsStr>,
{
    if let Some(active) = calls.environment_variable(TOOL_ENV_KEY) {
        return init_as_instrumented(platform, &active);
    }

    let tool = parse_tool(argv)?;
    let factories = factory_package_for_tool(tool)?;
    let program = (factories.program)();

    if program.wrapper_binary().is_empty() {
        debug!(%tool, "no relaunch needed");
        platform.register((factories.controller)());
        return Ok(());
    }

    match relaunch_current_program(&*program, argv, calls) {
        Ok(never) => match never {},
        Err(err) => Err(err),
    }
}

fn init_as_instrumented(platform: &mut dyn Platform, active: &str) -> Result<()> {
    println!("{}{}", RUNNING_UNDER_HEADER, active);
    info!(tool = active, "running under instrumentation");

    let tool = ToolId::from_name(active)?;
    let factories = factory_package_for_tool(tool)?;
    platform.register((factories.controller)());

    Ok(())
}
