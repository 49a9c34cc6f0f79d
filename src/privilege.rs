//! Privileged command execution.
//!
//! Every privileged call returns an explicit [`BrokerOutcome`] instead
//! of silently swallowing failures. Call sites decide whether a
//! failure is advisory or fatal.

use crate::error::SetupError;
use crate::ui::prelude::*;
use sudo::RunningAs;

/// How root rights are obtained for a single command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// Already running as root, execute directly.
    Direct,
    /// Prefix with `sudo`.
    Sudo,
    /// Prefix with `pkexec`.
    Pkexec,
}

/// Result of one privileged invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerOutcome {
    Succeeded,
    Failed(String),
    /// The operation could not even be attempted (no package manager,
    /// no escalation path for this call).
    Unavailable,
}

/// Native package manager used for dependency installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativeManager {
    Pacman,
    Apt,
    Dnf,
    Zypper,
}

impl NativeManager {
    /// Probe the system for its native package manager.
    pub fn detect() -> Option<Self> {
        if which::which("pacman").is_ok() {
            Some(Self::Pacman)
        } else if which::which("apt-get").is_ok() {
            Some(Self::Apt)
        } else if which::which("dnf").is_ok() {
            Some(Self::Dnf)
        } else if which::which("zypper").is_ok() {
            Some(Self::Zypper)
        } else {
            None
        }
    }

    /// Install command for a batch of packages. The already-installed
    /// case is a no-op for every listed manager, which keeps repeated
    /// runs idempotent.
    pub fn install_argv(&self, packages: &[String]) -> Vec<String> {
        let base: &[&str] = match self {
            Self::Pacman => &["pacman", "-S", "--noconfirm", "--needed"],
            Self::Apt => &["apt-get", "install", "-y"],
            Self::Dnf => &["dnf", "install", "-y"],
            Self::Zypper => &["zypper", "install", "-y"],
        };
        let mut argv: Vec<String> = base.iter().map(|s| s.to_string()).collect();
        argv.extend(packages.iter().cloned());
        argv
    }
}

/// Runs commands with elevated rights.
#[derive(Debug, Clone)]
pub struct PrivilegeBroker {
    escalation: Escalation,
    manager: Option<NativeManager>,
}

impl PrivilegeBroker {
    /// Detect the escalation mechanism.
    ///
    /// Root processes execute directly; otherwise `sudo` or `pkexec`
    /// must be on PATH. Neither being available is a fatal
    /// precondition failure.
    pub fn detect() -> Result<Self, SetupError> {
        let escalation = match sudo::check() {
            RunningAs::Root | RunningAs::Suid => Escalation::Direct,
            RunningAs::User => {
                if which::which("sudo").is_ok() {
                    Escalation::Sudo
                } else if which::which("pkexec").is_ok() {
                    Escalation::Pkexec
                } else {
                    return Err(SetupError::NoEscalation);
                }
            }
        };
        Ok(Self {
            escalation,
            manager: NativeManager::detect(),
        })
    }

    #[cfg(test)]
    pub fn for_tests(escalation: Escalation, manager: Option<NativeManager>) -> Self {
        Self { escalation, manager }
    }

    /// Run a command with root rights, capturing its output.
    pub fn run(&self, argv: &[String]) -> BrokerOutcome {
        let full: Vec<String> = match self.escalation {
            Escalation::Direct => argv.to_vec(),
            Escalation::Sudo => std::iter::once("sudo".to_string())
                .chain(argv.iter().cloned())
                .collect(),
            Escalation::Pkexec => std::iter::once("pkexec".to_string())
                .chain(argv.iter().cloned())
                .collect(),
        };

        let Some((program, args)) = full.split_first() else {
            return BrokerOutcome::Unavailable;
        };

        emit(
            Level::Debug,
            "privilege.run",
            &format!("{} Running privileged: {}", char::from(NerdFont::Lock), full.join(" ")),
            None,
        );

        match duct::cmd(program.as_str(), args)
            .stdout_capture()
            .stderr_capture()
            .unchecked()
            .run()
        {
            Ok(output) if output.status.success() => BrokerOutcome::Succeeded,
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                BrokerOutcome::Failed(stderr.trim().to_string())
            }
            Err(e) => BrokerOutcome::Failed(e.to_string()),
        }
    }

    /// Install a batch of packages through the native package manager.
    pub fn install_packages(&self, packages: &[String]) -> BrokerOutcome {
        if packages.is_empty() {
            return BrokerOutcome::Succeeded;
        }
        let Some(manager) = self.manager else {
            return BrokerOutcome::Unavailable;
        };
        self.run(&manager.install_argv(packages))
    }
}

/// Seam for dependency resolution: anything that can install packages.
pub trait PackageInstaller {
    fn install(&self, packages: &[String]) -> BrokerOutcome;
}

impl PackageInstaller for PrivilegeBroker {
    fn install(&self, packages: &[String]) -> BrokerOutcome {
        self.install_packages(packages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_argv_appends_packages() {
        let argv = NativeManager::Apt.install_argv(&["libfuse2".to_string(), "libnss3".to_string()]);
        assert_eq!(argv[..3], ["apt-get", "install", "-y"]);
        assert_eq!(argv[3..], ["libfuse2", "libnss3"]);
    }

    #[test]
    fn empty_batch_is_a_noop_success() {
        let broker = PrivilegeBroker::for_tests(Escalation::Direct, Some(NativeManager::Apt));
        assert_eq!(broker.install_packages(&[]), BrokerOutcome::Succeeded);
    }

    #[test]
    fn missing_manager_reports_unavailable() {
        let broker = PrivilegeBroker::for_tests(Escalation::Direct, None);
        let outcome = broker.install_packages(&["libfuse2".to_string()]);
        assert_eq!(outcome, BrokerOutcome::Unavailable);
    }
}
