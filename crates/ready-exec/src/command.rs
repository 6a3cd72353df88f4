//! Validated `oc` command builder.
//!
//! Commands are spawned directly with their argument vector; no shell is
//! involved, so request bodies and URLs are passed through untouched apart
//! from rejecting control characters that would corrupt the argument list.

use std::process::Stdio;

use tokio::process::Command;
use tracing::trace;

use crate::error::{ExecError, Result};
use crate::target::PodTarget;

/// Default program used to reach the cluster.
pub const DEFAULT_OC_PROGRAM: &str = "oc";

/// Characters that are never allowed in command arguments.
const FORBIDDEN_CHARS: &[char] = &['\0', '\n', '\r'];

/// Validate a command argument.
///
/// # Errors
///
/// Returns an error if the argument contains forbidden characters.
pub fn validate_argument(arg: &str, field_name: &str) -> Result<()> {
    if let Some(c) = arg.chars().find(|c| FORBIDDEN_CHARS.contains(c)) {
        return Err(ExecError::invalid(
            field_name,
            format!("contains forbidden character {c:?}"),
        ));
    }
    Ok(())
}

/// Validate a program path.
///
/// # Errors
///
/// Returns an error if the path is empty or contains dangerous patterns.
pub fn validate_program_path(path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ExecError::invalid("program_path", "cannot be empty"));
    }
    if path.contains("..") {
        return Err(ExecError::invalid("program_path", "path traversal detected"));
    }
    if path
        .chars()
        .any(|c| FORBIDDEN_CHARS.contains(&c) || matches!(c, ';' | '&' | '|' | '$' | '`'))
    {
        return Err(ExecError::invalid("program_path", "shell metacharacter detected"));
    }
    Ok(())
}

/// Output from a successful command execution.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Standard output.
    pub stdout: Vec<u8>,
    /// Standard error.
    pub stderr: Vec<u8>,
    /// Exit status code (0 for success).
    pub exit_code: i32,
}

impl CommandOutput {
    /// Get stdout as a UTF-8 string, replacing invalid characters.
    #[must_use]
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Get stderr as a UTF-8 string, replacing invalid characters.
    #[must_use]
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Builder for an `oc` invocation.
///
/// Validation problems are collected while building and reported by
/// [`OcCommand::execute`], so call sites can chain without intermediate `?`.
#[derive(Debug)]
pub struct OcCommand {
    program: String,
    args: Vec<String>,
    validation_errors: Vec<ExecError>,
}

impl OcCommand {
    /// Create a command that runs the given `oc` program.
    #[must_use]
    pub fn new(program: &str) -> Self {
        let mut cmd = Self {
            program: DEFAULT_OC_PROGRAM.to_string(),
            args: Vec::new(),
            validation_errors: Vec::new(),
        };
        match validate_program_path(program) {
            Ok(()) => cmd.program = program.to_string(),
            Err(e) => cmd.validation_errors.push(e),
        }
        cmd
    }

    /// Create an `oc exec` command running inside the target container.
    ///
    /// Arguments added afterwards form the in-container command line.
    #[must_use]
    pub fn exec_in(program: &str, target: &PodTarget) -> Self {
        Self::new(program).args([
            "exec",
            "-n",
            target.namespace(),
            target.pod(),
            "-c",
            target.container(),
            "--",
        ])
    }

    /// Add a single argument.
    #[must_use]
    pub fn arg(mut self, arg: &str) -> Self {
        match validate_argument(arg, "argument") {
            Ok(()) => self.args.push(arg.to_string()),
            Err(e) => self.validation_errors.push(e),
        }
        self
    }

    /// Add multiple arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for arg in args {
            self = self.arg(arg.as_ref());
        }
        self
    }

    /// The program that will be spawned.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// The argument vector, excluding the program.
    #[must_use]
    pub fn argv(&self) -> &[String] {
        &self.args
    }

    /// Check if there are any validation errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.validation_errors.is_empty()
    }

    /// Build the command description for logging.
    #[must_use]
    pub fn description(&self) -> String {
        format!("{} {}", self.program, self.args.join(" "))
    }

    /// Execute the command and return its output.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Validation errors were collected during building
    /// - The command fails to spawn
    /// - The command returns a non-zero exit code
    pub async fn execute(mut self) -> Result<CommandOutput> {
        if !self.validation_errors.is_empty() {
            return Err(self.validation_errors.swap_remove(0));
        }

        trace!(command = %self.description(), "running command");

        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ExecError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        let exit_code = output.status.code().unwrap_or(-1);
        if !output.status.success() {
            return Err(ExecError::non_zero_exit(
                self.description(),
                exit_code,
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }

        Ok(CommandOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code,
        })
    }
}
