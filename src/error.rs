use std::path::PathBuf;
use thiserror::Error;

/// Fatal precondition failures.
///
/// Anything listed here aborts the whole run with a nonzero exit code.
/// Every other failure mode is advisory: it gets logged and the install
/// sequence moves on to the next step.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("cannot determine the target user (set SUDO_USER or run unprivileged)")]
    UnresolvedUser,

    #[error("cannot determine the home directory for user '{0}'")]
    UnresolvedHome(String),

    #[error("no privilege escalation mechanism available (need root, sudo or pkexec)")]
    NoEscalation,

    #[error("supplied artifact does not exist: {0}")]
    ArtifactMissing(PathBuf),
}
