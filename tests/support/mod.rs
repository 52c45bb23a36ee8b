use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::ffi::{CStr, CString, OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use yiqi::{Error, NullTermArray, Program, Result, SystemCalls, ToolId};

#[allow(unused)]
pub const MOCK_TOOL: &str = "mocktool";

#[allow(unused)]
pub const MOCK_ARGUMENT: &str = "--mock";

#[allow(unused)]
pub const PROGRAM: &str = "program";

lazy_static! {
    /// Environment of the mocked process.
    pub static ref SYSTEM_ENVIRONMENT: Vec<CString> = vec![
        CString::new("HOME=/home/yiqi").unwrap(),
        CString::new("LANG=C").unwrap(),
    ];
}

/// Build an owned argument vector from string literals.
#[allow(unused)]
macro_rules! argv {
    ($($arg: expr),* $(,)?) => {
        vec![$(String::from($arg)),*]
    };
}

/// Arguments of a call to [`SystemCalls::exec_in_place()`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Exec {
    pub binary: PathBuf,
    pub argv: Vec<String>,
    pub envp: Vec<String>,
}

/// Scripted [`SystemCalls`] which records every query and exec.
///
/// `exec_in_place()` records its arguments and returns [`Error::ExecReturned`],
/// since a mock can't replace the test process.
#[derive(Debug, Default)]
pub struct MockCalls {
    pub path: OsString,
    pub executables: HashSet<PathBuf>,
    pub variables: HashMap<String, String>,

    pub queried: RefCell<Vec<String>>,
    pub execs: RefCell<Vec<Exec>>,
}

#[allow(unused)]
impl MockCalls {
    pub fn new(path: impl Into<OsString>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executables.insert(path.into());
        self
    }

    pub fn with_variable(mut self, key: &str, value: &str) -> Self {
        self.variables.insert(key.to_owned(), value.to_owned());
        self
    }

    pub fn queried(&self) -> Vec<String> {
        self.queried.borrow().clone()
    }

    pub fn execs(&self) -> Vec<Exec> {
        self.execs.borrow().clone()
    }
}

impl SystemCalls for MockCalls {
    fn exe_exists(&self, path: &Path) -> bool {
        self.queried.borrow_mut().push(path.to_string_lossy().into_owned());
        self.executables.contains(path)
    }

    fn exec_in_place(
        &self,
        binary: &CStr,
        argv: &[*const libc::c_char],
        envp: &[*const libc::c_char],
    ) -> Result<Infallible> {
        assert!(argv.last().unwrap().is_null(), "argv not null-terminated");
        assert!(envp.last().unwrap().is_null(), "envp not null-terminated");

        let argv = unsafe { NullTermArray::from_raw(argv.as_ptr()) }.to_strings();
        let envp = unsafe { NullTermArray::from_raw(envp.as_ptr()) }.to_strings();

        self.execs.borrow_mut().push(Exec {
            binary: OsStr::from_bytes(binary.to_bytes()).into(),
            argv,
            envp,
        });

        Err(Error::ExecReturned { binary: binary.to_string_lossy().into_owned() })
    }

    fn executable_path(&self) -> OsString {
        self.path.clone()
    }

    fn system_environment(&self) -> NullTermArray<'_> {
        NullTermArray::from_cstrs(SYSTEM_ENVIRONMENT.iter().map(|s| s.as_c_str()))
    }

    fn environment_variable(&self, key: &str) -> Option<String> {
        self.variables.get(key).cloned()
    }
}

/// A [`Program`] with arbitrary launch data.
#[derive(Clone, Debug)]
pub struct MockProgram {
    pub wrapper: String,
    pub options: String,
    pub name: String,
}

#[allow(unused)]
impl MockProgram {
    pub fn new() -> Self {
        Self {
            wrapper: MOCK_TOOL.to_owned(),
            options: MOCK_ARGUMENT.to_owned(),
            name: MOCK_TOOL.to_owned(),
        }
    }

    pub fn without_wrapper() -> Self {
        Self { wrapper: String::new(), ..Self::new() }
    }

    pub fn without_name() -> Self {
        Self { name: String::new(), ..Self::new() }
    }
}

impl Program for MockProgram {
    fn wrapper_binary(&self) -> &str {
        &self.wrapper
    }

    fn wrapper_options(&self) -> &str {
        &self.options
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn tool_id(&self) -> ToolId {
        ToolId::None
    }
}

/// Environment we expect a relaunched `tool` to be given.
#[allow(unused)]
pub fn expected_environment(tool: &str) -> Vec<String> {
    let mut envp: Vec<String> = SYSTEM_ENVIRONMENT
        .iter()
        .map(|s| s.to_string_lossy().into_owned())
        .collect();
    envp.push(format!("{}={}", yiqi::constants::TOOL_ENV_KEY, tool));
    envp
}
