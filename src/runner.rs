//! External tool execution

use std::fmt;
use std::process::{Command, Stdio};

use crate::error::RunError;

/// A single external command: program plus ordered arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append one argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append a flag followed by its value
    pub fn flag(self, flag: &str, value: impl Into<String>) -> Self {
        self.arg(flag).arg(value)
    }

    /// Values following every occurrence of `flag`
    pub fn flag_values<'a>(&'a self, flag: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.args
            .windows(2)
            .filter(move |pair| pair[0] == flag)
            .map(|pair| pair[1].as_str())
    }
}

impl fmt::Display for ToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Runs tool invocations and reports whether they succeeded
pub trait CommandRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<(), RunError>;
}

/// Runs invocations as real child processes, blocking until each exits.
///
/// The child's stdout and stderr are inherited so the tool's own
/// diagnostics reach the caller unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<(), RunError> {
        log::debug!("Running: {}", invocation);

        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| RunError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        if status.success() {
            log::debug!("{} succeeded", invocation.program);
            Ok(())
        } else {
            Err(RunError::Status {
                program: invocation.program.clone(),
                status: status.to_string(),
            })
        }
    }
}

/// Prints invocations to stdout without running them
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunner;

impl CommandRunner for DryRunner {
    fn run(&self, invocation: &ToolInvocation) -> Result<(), RunError> {
        println!("{}", invocation);
        Ok(())
    }
}
