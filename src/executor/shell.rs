// One-shot shell commands for the SHELL action.
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;

/// Runs a single command and reports its combined output as text.
///
/// Failures to spawn and timeouts are reported in the returned text rather than as
/// errors; the caller treats the result as an action diagnostic either way.
#[async_trait]
pub trait ShellRunner: Send + Sync {
    async fn run(&self, command: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct SystemShell {
    timeout: Duration,
}

impl SystemShell {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }

    fn command(command: &str) -> tokio::process::Command {
        #[cfg(target_os = "windows")]
        {
            let mut cmd = tokio::process::Command::new("powershell.exe");
            cmd.args(["-NoProfile", "-NonInteractive", "-Command", command]);
            cmd
        }
        #[cfg(not(target_os = "windows"))]
        {
            let mut cmd = tokio::process::Command::new("sh");
            cmd.args(["-c", command]);
            cmd
        }
    }
}

#[async_trait]
impl ShellRunner for SystemShell {
    async fn run(&self, command: &str) -> String {
        tracing::info!(command, "running shell command");
        let child = Self::command(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(output)) => {
                let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
                text.push_str(&String::from_utf8_lossy(&output.stderr));
                tracing::debug!(status = ?output.status.code(), bytes = text.len(), "shell finished");
                text
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "shell spawn failed");
                e.to_string()
            }
            Err(_) => {
                tracing::warn!(timeout_secs = self.timeout.as_secs(), "shell command timed out");
                format!("Command timed out after {} seconds", self.timeout.as_secs())
            }
        }
    }
}
