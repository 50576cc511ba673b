use std::future::Future;
use std::io::Write;
use std::process::ExitCode;

use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::error::LaunchError;
use crate::shared::invocation::{Invocation, TunnelProgram};

/// How a launch ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The tunnel program exited with status 0.
    Completed,

    /// The user interrupted the launcher; the child was stopped.
    Interrupted,
}

impl Outcome {
    pub fn exit_code(&self) -> ExitCode {
        ExitCode::SUCCESS
    }
}

/// Launcher session state machine
struct Session<'a, W, S> {
    out: &'a mut W,
    state: S,
}

/// Status printed, child not yet spawned
struct Pending {
    command: Command,
}

/// Child spawned and owned by the session
struct Running {
    child: Child,
}

pub struct Launcher {
    /// The external tunnel program.
    program: TunnelProgram,

    /// Arguments forwarded to the tunnel program.
    invocation: Invocation,
}

impl Launcher {
    pub fn new(program: TunnelProgram, invocation: Invocation) -> Self {
        Self {
            program,
            invocation,
        }
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// Print the status lines, spawn the tunnel program and wait for it.
    ///
    /// Returns early with [`Outcome::Interrupted`] once `shutdown` resolves,
    /// after the child has been killed and reaped.
    pub async fn run<W, F>(self, out: &mut W, shutdown: F) -> Result<Outcome, LaunchError>
    where
        W: Write,
        F: Future<Output = ()>,
    {
        let mut session = Session {
            out,
            state: Pending {
                command: self.program.command(&self.invocation),
            },
        };
        session.say(&self.invocation.status());

        session.spawn()?.supervise(shutdown).await
    }
}

impl<W: Write, S> Session<'_, W, S> {
    /// Print to the user. A broken stdout must not take the tunnel down.
    fn say(&mut self, text: &str) {
        let result = self
            .out
            .write_all(text.as_bytes())
            .and_then(|()| self.out.flush());
        if let Err(err) = result {
            warn!(%err, "unable to write status output");
        }
    }
}

impl<'a, W: Write> Session<'a, W, Pending> {
    fn spawn(mut self) -> Result<Session<'a, W, Running>, LaunchError> {
        let command = &mut self.state.command;
        debug!(command = ?command.as_std(), "spawning tunnel program");

        let child = command.spawn().map_err(LaunchError::SpawnFailed)?;
        info!(pid = ?child.id(), "tunnel program started");

        Ok(Session {
            out: self.out,
            state: Running { child },
        })
    }
}

impl<W: Write> Session<'_, W, Running> {
    async fn supervise<F>(mut self, shutdown: F) -> Result<Outcome, LaunchError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;

            _ = shutdown => {
                info!("interrupt received, stopping tunnel program");
                self.say("\nShutting down PageKite tunnel...\n");
                if let Err(err) = self.state.child.kill().await {
                    warn!(%err, "unable to stop tunnel program");
                }
                Ok(Outcome::Interrupted)
            }

            status = self.state.child.wait() => {
                let status = status.map_err(LaunchError::Wait)?;
                if status.success() {
                    info!("tunnel program exited");
                    Ok(Outcome::Completed)
                } else {
                    warn!(%status, "tunnel program failed");
                    Err(LaunchError::ChildFailed { status })
                }
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::future;
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    fn shell(script: &str) -> TunnelProgram {
        TunnelProgram::new("sh").arg("-c").arg(script)
    }

    fn myapp() -> Invocation {
        Invocation::new("11434", "myapp.pagekite.me")
    }

    #[tokio::test]
    async fn test_child_success() -> Result<()> {
        let mut out = Vec::new();
        let launcher = Launcher::new(shell("exit 0"), myapp());

        let outcome = launcher.run(&mut out, future::pending()).await?;

        assert_eq!(outcome, Outcome::Completed);
        let out = String::from_utf8(out)?;
        assert!(out.contains("Public URL: https://myapp.pagekite.me"));
        Ok(())
    }

    #[tokio::test]
    async fn test_arguments_forwarded() -> Result<()> {
        // `sh -c` binds the forwarded pair to $0 and $1.
        let script = r#"test "$0" = 11434 && test "$1" = myapp.pagekite.me"#;
        let launcher = Launcher::new(shell(script), myapp());

        let outcome = launcher.run(&mut Vec::new(), future::pending()).await?;

        assert_eq!(outcome, Outcome::Completed);
        Ok(())
    }

    #[tokio::test]
    async fn test_child_failure_reports_status() -> Result<()> {
        let launcher = Launcher::new(shell("exit 3"), myapp());

        let err = launcher
            .run(&mut Vec::new(), future::pending())
            .await
            .unwrap_err();

        match &err {
            LaunchError::ChildFailed { status } => assert_eq!(status.code(), Some(3)),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().starts_with("PageKite failed with error"));
        assert!(err.to_string().contains('3'));
        Ok(())
    }

    #[tokio::test]
    async fn test_child_killed_by_signal() -> Result<()> {
        let launcher = Launcher::new(shell("kill -9 $$"), myapp());

        let err = launcher
            .run(&mut Vec::new(), future::pending())
            .await
            .unwrap_err();

        match err {
            LaunchError::ChildFailed { status } => assert_eq!(status.code(), None),
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_spawn_failure_after_status() -> Result<()> {
        let mut out = Vec::new();
        let program = TunnelProgram::new("/nonexistent/kitewrap-tunnel");
        let launcher = Launcher::new(program, myapp());

        let err = launcher.run(&mut out, future::pending()).await.unwrap_err();

        assert!(matches!(err, LaunchError::SpawnFailed(_)));
        assert!(String::from_utf8(out)?.starts_with("Starting PageKite tunnel..."));
        Ok(())
    }

    #[tokio::test]
    async fn test_interrupt_stops_child() -> Result<()> {
        let mut out = Vec::new();
        let launcher = Launcher::new(shell("sleep 30"), myapp());

        let outcome = timeout(
            Duration::from_secs(5),
            launcher.run(&mut out, sleep(Duration::from_millis(100))),
        )
        .await??;

        assert_eq!(outcome, Outcome::Interrupted);
        assert!(String::from_utf8(out)?.ends_with("\nShutting down PageKite tunnel...\n"));
        Ok(())
    }

    #[tokio::test]
    async fn test_interrupt_takes_priority() -> Result<()> {
        let launcher = Launcher::new(shell("exit 1"), myapp());

        let outcome = launcher.run(&mut Vec::new(), async {}).await?;

        assert_eq!(outcome, Outcome::Interrupted);
        Ok(())
    }
}
