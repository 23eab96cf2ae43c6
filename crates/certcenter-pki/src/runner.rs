//! External command execution.
//!
//! [`CommandRunner`] is the seam between the lifecycle manager and the
//! operating system; tests substitute a fake that emulates the toolchain.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

/// A fully built command: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    /// Directory the command runs in. The caller's own working directory is
    /// never changed.
    pub working_dir: Option<PathBuf>,
}

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Combined output and exit status of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// All of stdout, then all of stderr, each lossily decoded. Lines of the
    /// two streams are not interleaved in the order the process wrote them.
    pub output: String,
    /// Exit code; `-1` when the process was terminated by a signal.
    pub exit_status: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// Runs one command to completion. No timeout and no retry: a hung
/// process hangs the caller. A non-zero exit is returned, not raised.
pub trait CommandRunner: Send + Sync {
    fn run(
        &self,
        command: &CommandLine,
    ) -> impl Future<Output = std::io::Result<CommandOutput>> + Send;
}

/// Runs commands as real subprocesses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &CommandLine) -> std::io::Result<CommandOutput> {
        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args).stdin(Stdio::null());
        if let Some(dir) = &command.working_dir {
            cmd.current_dir(dir);
        }

        let output = cmd.output().await?;
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(CommandOutput {
            output: combined,
            exit_status: output.status.code().unwrap_or(-1),
        })
    }
}
