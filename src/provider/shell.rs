use std::{fmt, future::Future, process::Stdio, time::Duration};

use tokio::{io::AsyncWriteExt, process::Command, time::timeout};
use tracing::info;

use crate::error::Error;

/// A program invocation with its arguments and optional standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl ShellCommand {
    pub fn new(program: &str) -> Self {
        ShellCommand {
            program: program.to_owned(),
            args: vec![],
            stdin: None,
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
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

    /// Appends `--name value`.
    pub fn flag<S: Into<String>>(self, name: &str, value: S) -> Self {
        self.arg(format!("--{}", name)).arg(value)
    }

    pub fn stdin<S: Into<String>>(mut self, input: S) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|item| item == arg)
    }

    /// Value following `--name`, if present.
    pub fn flag_value(&self, name: &str) -> Option<&str> {
        let flag = format!("--{}", name);
        self.args
            .iter()
            .position(|item| *item == flag)
            .and_then(|index| self.args.get(index + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs external programs, the seam every contract and deploy call goes
/// through.
pub trait Invoker: Send + Sync {
    /// Runs `command` and returns its trimmed standard output.
    fn run(
        &self,
        command: ShellCommand,
    ) -> impl Future<Output = Result<String, Error>> + Send;
}

#[derive(Debug, Clone)]
pub struct Shell {
    pub timeout: Duration,
}

impl Shell {
    pub fn new(timeout: u64) -> Self {
        Shell {
            timeout: Duration::from_secs(timeout),
        }
    }

    async fn exe(&self, command: &ShellCommand) -> Result<String, Error> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(if command.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let (Some(input), Some(mut stdin)) =
            (&command.stdin, child.stdin.take())
        {
            stdin.write_all(input.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(Error::CommandError {
                command: command.to_string(),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        let stdout = String::from_utf8(output.stdout)?;
        Ok(stdout.trim().to_owned())
    }
}

impl Invoker for Shell {
    async fn run(&self, command: ShellCommand) -> Result<String, Error> {
        info!("exe: {}", command);
        timeout(self.timeout, self.exe(&command)).await?
    }
}
