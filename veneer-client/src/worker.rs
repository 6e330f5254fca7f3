use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};

use crate::error::ClientError;

/// A dedicated language-server process owned by one wrapper.
///
/// The pipes can be wired to a transport exactly once; unlike a browser
/// worker port there is no way to re-attach to a live process after its
/// stdio has been handed out.
#[derive(Debug)]
pub struct LanguageWorker {
    child: Child,
    command: String,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
}

impl LanguageWorker {
    pub fn spawn(command: &str, args: &[String]) -> Result<Self, ClientError> {
        log::info!("spawning language worker '{}' with args {:?}", command, args);
        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                ClientError::connection_with(
                    format!("failed to spawn language worker '{}'", command),
                    e,
                )
            })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        Ok(LanguageWorker {
            child,
            command: command.to_string(),
            stdin,
            stdout,
            stderr,
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    /// Whether the pipes are still available for a transport.
    pub fn is_connectable(&self) -> bool {
        self.stdin.is_some() && self.stdout.is_some()
    }

    pub(crate) fn take_io(
        &mut self,
    ) -> Result<(ChildStdin, ChildStdout, Option<ChildStderr>), ClientError> {
        match (self.stdin.take(), self.stdout.take()) {
            (Some(stdin), Some(stdout)) => Ok((stdin, stdout, self.stderr.take())),
            _ => Err(ClientError::connection(format!(
                "language worker '{}' is already wired to a transport",
                self.command
            ))),
        }
    }

    /// Kill the process and reap it.
    pub async fn terminate(&mut self) {
        log::info!("terminating language worker '{}'", self.command);
        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spawn_failure_is_a_connection_error() {
        let err = LanguageWorker::spawn("definitely-not-a-real-language-server", &[]).unwrap_err();
        assert!(matches!(err, ClientError::Connection { .. }));
    }

    #[tokio::test]
    async fn io_can_only_be_taken_once() {
        let mut worker = LanguageWorker::spawn("cat", &[]).unwrap();
        assert!(worker.is_connectable());
        assert!(worker.take_io().is_ok());
        assert!(!worker.is_connectable());
        assert!(worker.take_io().is_err());
        worker.terminate().await;
    }
}
