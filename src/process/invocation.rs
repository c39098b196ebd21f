use crate::error::{DaemonError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// How the running binary was invoked, enough to execute it again
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Absolute path of the executable
    program: PathBuf,

    /// Original `argv[0]`, if it should be preserved
    arg0: Option<OsString>,

    /// Arguments after `argv[0]`
    args: Vec<OsString>,
}

impl Invocation {
    /// Invocation of an arbitrary program with no arguments
    pub fn new<P: AsRef<Path>>(program: P) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            arg0: None,
            args: Vec::new(),
        }
    }

    /// Invocation of the currently running process
    pub fn current() -> Result<Self> {
        let program = std::env::current_exe().map_err(DaemonError::ExecutableNotFound)?;
        let mut argv = std::env::args_os();
        let arg0 = argv.next();

        Ok(Self {
            program,
            arg0,
            args: argv.collect(),
        })
    }

    /// Append an argument
    pub fn arg<S: Into<OsString>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arg0(&self) -> Option<&OsString> {
        self.arg0.as_ref()
    }

    pub fn arguments(&self) -> &[OsString] {
        &self.args
    }

    /// Program path followed by the arguments, space separated
    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }
}
