use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{ReconError, Result};

/// One external command: program, arguments, optional stdin and working dir.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<Vec<u8>>,
    pub current_dir: Option<PathBuf>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), ..Default::default() }
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

    pub fn stdin(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.stdin = Some(data.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Value following `flag` in the argument list, e.g. the `-o` path.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args.iter().position(|a| a == flag).and_then(|i| self.args.get(i + 1)).map(String::as_str)
    }
}

/// Runs external tools. Only stdout and success/failure are part of the contract.
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    async fn run(&self, cmd: &ToolCommand) -> Result<Vec<u8>>;
}

/// Spawns real processes through tokio.
#[derive(Debug, Default, Clone)]
pub struct SystemInvoker;

#[async_trait]
impl ToolInvoker for SystemInvoker {
    async fn run(&self, cmd: &ToolCommand) -> Result<Vec<u8>> {
        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if cmd.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .kill_on_drop(true);
        if let Some(dir) = &cmd.current_dir {
            command.current_dir(dir);
        }

        tracing::debug!(program = %cmd.program, args = ?cmd.args, "spawning tool");
        let mut child = command.spawn().map_err(|e| ReconError::invocation(&cmd.program, e))?;

        if let (Some(data), Some(mut stdin)) = (cmd.stdin.clone(), child.stdin.take()) {
            // fed from a task: the child may fill stdout before it drains stdin
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&data).await {
                    tracing::debug!(error = %e, "failed to write tool stdin");
                }
            });
        }

        let output = child.wait_with_output().await.map_err(|e| ReconError::invocation(&cmd.program, e))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = format!("{} ({})", output.status, stderr.lines().last().unwrap_or("").trim());
            return Err(ReconError::invocation(&cmd.program, reason));
        }
        Ok(output.stdout)
    }
}
