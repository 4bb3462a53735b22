//! Launching the game and telling when it is gone.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;

use sysinfo::{ProcessStatus, ProcessesToUpdate, System};

use crate::WatchError;

/// Boxed future returned by [`ProcessSupervisor`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Linux truncates process names to this many bytes.
const COMM_LEN: usize = 15;

/// A launched game.
///
/// Owns the child when there is one; the child is killed if the handle
/// is dropped while it still runs.
#[derive(Debug)]
pub struct ProcessHandle {
    name: String,
    child: Option<tokio::process::Child>,
}

impl ProcessHandle {
    /// Wraps a spawned child.
    pub fn from_child(name: impl Into<String>, child: tokio::process::Child) -> Self {
        Self {
            name: name.into(),
            child: Some(child),
        }
    }

    /// A process known only by name.
    pub fn detached(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            child: None,
        }
    }

    /// Process name used for liveness polling.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True while the owned child has not exited. Reaps it once it has.
    pub fn child_alive(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                tracing::debug!(name = %self.name, %status, "child exited");
                self.child = None;
                false
            }
            Err(e) => {
                tracing::warn!(name = %self.name, error = %e, "failed to poll child");
                false
            }
        }
    }

    /// Kills the owned child, if still running.
    pub fn terminate(&mut self) {
        if let Some(child) = self.child.as_mut() {
            if let Err(e) = child.start_kill() {
                tracing::warn!(name = %self.name, error = %e, "failed to kill child");
            }
        }
    }
}

/// Starts processes and checks whether one is running.
pub trait ProcessSupervisor: Send + Sync {
    /// Launches `exe` with `cwd` as its working directory.
    fn launch(&self, exe: &Path, cwd: &Path) -> Result<ProcessHandle, WatchError>;

    /// True if any process named `name` is alive (case-insensitive).
    fn is_running<'a>(&'a self, name: &'a str) -> BoxFuture<'a, bool>;
}

/// Supervisor backed by the operating system process table.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemSupervisor;

impl ProcessSupervisor for SystemSupervisor {
    fn launch(&self, exe: &Path, cwd: &Path) -> Result<ProcessHandle, WatchError> {
        let child = tokio::process::Command::new(exe)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| WatchError::Launch(format!("{}: {e}", exe.display())))?;

        let name = process_name(exe);
        tracing::info!(exe = %exe.display(), pid = ?child.id(), "game launched");
        Ok(ProcessHandle::from_child(name, child))
    }

    fn is_running<'a>(&'a self, name: &'a str) -> BoxFuture<'a, bool> {
        let name = name.to_string();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || process_running(&name))
                .await
                .unwrap_or(false)
        })
    }
}

/// File name of an executable, as it shows up in the process table.
pub(crate) fn process_name(exe: &Path) -> String {
    exe.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| exe.to_string_lossy().into_owned())
}

fn process_running(name: &str) -> bool {
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::All, true);
    system.processes().values().any(|p| {
        p.status() != ProcessStatus::Zombie && names_match(&p.name().to_string_lossy(), name)
    })
}

/// Compares process names ignoring case, a trailing `.exe` and the
/// Linux name truncation.
pub(crate) fn names_match(actual: &str, wanted: &str) -> bool {
    let actual = strip_exe(actual).to_lowercase();
    let wanted = strip_exe(wanted).to_lowercase();
    if actual == wanted {
        return true;
    }
    actual.len() == COMM_LEN && wanted.starts_with(&actual)
}

fn strip_exe(name: &str) -> &str {
    let cut = name.len().saturating_sub(4);
    match name.get(cut..) {
        Some(ext) if cut > 0 && ext.eq_ignore_ascii_case(".exe") => &name[..cut],
        _ => name,
    }
}
