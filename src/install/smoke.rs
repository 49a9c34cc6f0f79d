//! Runtime smoke test.
//!
//! Launches the extracted application briefly to prove it starts at
//! all, then shuts it down with an escalating ladder: SIGTERM to the
//! process group, a grace period, then SIGKILL. The child is always
//! reaped.

use anyhow::{Context, Result, anyhow};
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

/// How long the application gets to come up.
const LAUNCH_GRACE: Duration = Duration::from_secs(10);
/// How long a SIGTERM gets before escalating to SIGKILL.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);
const SHUTDOWN_POLL: Duration = Duration::from_millis(500);

/// Launch `apprun`, let it run for the grace period, then tear the
/// whole process group down.
///
/// Returns an error if the process cannot be spawned or dies before
/// the grace period ends; surviving the grace period counts as a pass.
pub fn smoke_test(apprun: &Path) -> Result<()> {
    // Own process group, so the shutdown signals reach every helper
    // process the application forks.
    let mut child = Command::new(apprun)
        .arg("--no-sandbox")
        .process_group(0)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("launching {}", apprun.display()))?;

    std::thread::sleep(LAUNCH_GRACE);

    match child.try_wait().context("checking smoke test process")? {
        Some(status) => Err(anyhow!("application exited early during smoke test: {status}")),
        None => {
            shutdown_group(&mut child);
            Ok(())
        }
    }
}

fn shutdown_group(child: &mut std::process::Child) {
    let pgid = Pid::from_raw(child.id() as i32);

    let _ = killpg(pgid, Signal::SIGTERM);

    let mut waited = Duration::ZERO;
    while waited < SHUTDOWN_GRACE {
        std::thread::sleep(SHUTDOWN_POLL);
        waited += SHUTDOWN_POLL;
        if matches!(child.try_wait(), Ok(Some(_))) {
            return;
        }
    }

    let _ = killpg(pgid, Signal::SIGKILL);
    // Reap, whatever happened above.
    let _ = child.wait();
}
