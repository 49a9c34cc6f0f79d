//! The bounded inspect → map → install → re-inspect loop.

use super::inspect::LinkageInspector;
use super::mapping::PackageMapping;
use crate::privilege::{BrokerOutcome, PackageInstaller};
use crate::ui::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Default round budget. The loop always terminates within this many
/// install attempts no matter what the package manager does.
pub const MAX_ROUNDS: u32 = 3;

/// Outcome of a resolution run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionResult {
    /// Every inspected binary has clean linkage.
    Satisfied,
    /// Libraries remain missing but none of them map to a package, so
    /// there is nothing left to try. Advisory, not fatal.
    PartiallyUnresolved(Vec<String>),
    /// The round budget ran out with libraries still missing.
    ExhaustedRounds(Vec<String>),
    /// No inspection tool on this system; nothing was verified.
    Unavailable,
}

impl ResolutionResult {
    pub fn describe(&self) -> String {
        match self {
            Self::Satisfied => "all shared library dependencies satisfied".to_string(),
            Self::PartiallyUnresolved(missing) => format!(
                "unresolved libraries with no package suggestion: {}",
                missing.join(", ")
            ),
            Self::ExhaustedRounds(missing) => format!(
                "still missing after {} rounds: {}",
                MAX_ROUNDS,
                missing.join(", ")
            ),
            Self::Unavailable => "no linkage inspection tool available, skipping verification".to_string(),
        }
    }
}

/// Repairs missing shared-library dependencies.
///
/// All three collaborators are injected: the inspector (how linkage is
/// queried), the mapping (soname → package) and the installer (how
/// packages get onto the system).
pub struct DependencyResolver<'a> {
    inspector: &'a dyn LinkageInspector,
    mapping: &'a PackageMapping,
    installer: &'a dyn PackageInstaller,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(
        inspector: &'a dyn LinkageInspector,
        mapping: &'a PackageMapping,
        installer: &'a dyn PackageInstaller,
    ) -> Self {
        Self {
            inspector,
            mapping,
            installer,
        }
    }

    /// Run the repair loop over `binaries` with a fixed round budget.
    ///
    /// Paths that do not exist or are not executable are skipped
    /// silently. Installation failures never abort the loop; the
    /// re-inspection decides whether anything improved.
    pub fn resolve(&self, binaries: &[PathBuf], max_rounds: u32) -> ResolutionResult {
        if !self.inspector.available() {
            return ResolutionResult::Unavailable;
        }

        let mut missing = self.collect_missing(binaries);
        if missing.is_empty() {
            return ResolutionResult::Satisfied;
        }

        for round in 1..=max_rounds {
            let packages: Vec<String> = missing
                .iter()
                .filter_map(|soname| self.mapping.suggest(soname))
                .map(|pkg| pkg.to_string())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();

            if packages.is_empty() {
                return ResolutionResult::PartiallyUnresolved(missing);
            }

            emit(
                Level::Info,
                "deps.install",
                &format!(
                    "{} Round {}/{}: installing {}",
                    char::from(NerdFont::Package),
                    round,
                    max_rounds,
                    packages.join(", ")
                ),
                None,
            );

            match self.installer.install(&packages) {
                BrokerOutcome::Succeeded => {}
                BrokerOutcome::Failed(reason) => {
                    emit(
                        Level::Warn,
                        "deps.install.failed",
                        &format!(
                            "{} Package installation failed: {}",
                            char::from(NerdFont::Warning),
                            reason
                        ),
                        None,
                    );
                }
                BrokerOutcome::Unavailable => {
                    emit(
                        Level::Warn,
                        "deps.install.unavailable",
                        &format!(
                            "{} No package manager available to install {}",
                            char::from(NerdFont::Warning),
                            packages.join(", ")
                        ),
                        None,
                    );
                }
            }

            missing = self.collect_missing(binaries);
            if missing.is_empty() {
                return ResolutionResult::Satisfied;
            }
        }

        ResolutionResult::ExhaustedRounds(missing)
    }

    /// Union of unresolved sonames across all inspectable binaries.
    fn collect_missing(&self, binaries: &[PathBuf]) -> Vec<String> {
        let mut missing = BTreeSet::new();
        for binary in binaries.iter().filter(|b| is_executable_file(b)) {
            match self.inspector.missing_libraries(binary) {
                Ok(sonames) => missing.extend(sonames),
                Err(e) => {
                    emit(
                        Level::Debug,
                        "deps.inspect.error",
                        &format!("inspection of {} failed: {e:#}", binary.display()),
                        None,
                    );
                }
            }
        }
        missing.into_iter().collect()
    }
}

fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
