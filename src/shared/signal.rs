use std::future::Future;
use std::io;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

/// Install the interrupt listeners and return a future that resolves when
/// the user asks the launcher to stop.
///
/// Listeners are registered before this returns, so a signal that arrives
/// before the future is first polled is still seen. On Unix both SIGINT and
/// SIGTERM count; elsewhere Ctrl+C does.
#[cfg(unix)]
pub fn interrupted() -> io::Result<impl Future<Output = ()>> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    Ok(async move {
        tokio::select! {
            _ = sigint.recv() => {},
            _ = sigterm.recv() => {},
        }
    })
}

#[cfg(windows)]
pub fn interrupted() -> io::Result<impl Future<Output = ()>> {
    let mut ctrl_c = tokio::signal::windows::ctrl_c()?;

    Ok(async move {
        ctrl_c.recv().await;
    })
}
