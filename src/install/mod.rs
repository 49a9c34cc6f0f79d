//! The install sequence.
//!
//! A strict-order state machine; every step is idempotent, so the
//! contract for interrupted runs is simply "run the installer again".
//! Only precondition failures abort — once the sequence is underway,
//! failing steps log a warning and the machine advances.

mod extract;
mod fetch;
mod launcher;
mod pin;
mod smoke;

use crate::cleanup::{self, ConfirmProvider, KeepSet};
use crate::config::InstallConfig;
use crate::deps::{DependencyResolver, LddInspector, MAX_ROUNDS, PackageMapping, ResolutionResult};
use crate::error::SetupError;
use crate::privilege::{BrokerOutcome, PrivilegeBroker};
use crate::ui::prelude::*;
use anyhow::Result;
use std::path::PathBuf;

pub struct InstallOrchestrator<'a> {
    config: &'a InstallConfig,
    broker: &'a PrivilegeBroker,
    mapping: PackageMapping,
    confirm: Box<dyn ConfirmProvider>,
    headless: bool,
}

impl<'a> InstallOrchestrator<'a> {
    pub fn new(
        config: &'a InstallConfig,
        broker: &'a PrivilegeBroker,
        mapping: PackageMapping,
        confirm: Box<dyn ConfirmProvider>,
        headless: bool,
    ) -> Self {
        Self {
            config,
            broker,
            mapping,
            confirm,
            headless,
        }
    }

    /// Run the whole sequence. `artifact` is an optional locally
    /// supplied AppImage; without it the latest build is fetched.
    pub fn run(&self, artifact: Option<PathBuf>) -> Result<()> {
        // A supplied artifact that does not exist is a precondition
        // failure, checked before anything touches the filesystem.
        if let Some(path) = &artifact
            && !path.is_file()
        {
            return Err(SetupError::ArtifactMissing(path.clone()).into());
        }

        self.pre_scan_cleanup(artifact.as_deref().map(PathBuf::from));
        self.acquire_and_pin(artifact);
        self.extract_artifact();
        self.fix_permissions();
        self.resolve_dependencies();
        self.register_launcher();
        self.register_menu_entry();
        self.install_icon();
        self.runtime_smoke_test();
        self.post_scan_cleanup();

        emit(
            Level::Success,
            "install.done",
            &format!(
                "{} Cursor installed for {} at {}",
                char::from(NerdFont::Check),
                self.config.user,
                self.config.artifact_path().display()
            ),
            None,
        );
        Ok(())
    }

    /// Keep-set shared by both cleanup passes: the pinned artifact and
    /// the registered menu entry, whether or not they exist yet.
    fn base_keep_set(&self) -> KeepSet {
        let mut keep = KeepSet::new();
        keep.insert(self.config.artifact_path());
        keep.insert(self.config.desktop_entry_path());
        keep
    }

    fn cleanup_pass(&self, phase: &str, keep: &KeepSet) {
        emit(
            Level::Info,
            "cleanup.scan",
            &format!("{} Scanning for duplicate installs ({phase})", char::from(NerdFont::Search)),
            None,
        );
        let matches = cleanup::scan_all(&self.config.scan_roots(), &cleanup::artifact_patterns());
        let plan = cleanup::plan(matches, keep);
        emit(
            Level::Debug,
            "cleanup.plan",
            &format!(
                "{} match(es), {} deletion candidate(s)",
                plan.matches.len(),
                plan.candidates.len()
            ),
            None,
        );
        cleanup::execute(&plan, self.confirm.as_ref());
    }

    fn pre_scan_cleanup(&self, supplied: Option<PathBuf>) {
        let mut keep = self.base_keep_set();
        // The input artifact must survive the pre-install sweep: it is
        // about to be pinned.
        if let Some(path) = supplied {
            keep.insert(path);
        }
        self.cleanup_pass("pre-install", &keep);
    }

    fn acquire_and_pin(&self, artifact: Option<PathBuf>) {
        let dest = self.config.artifact_path();

        let (source, version) = match artifact {
            Some(local) => {
                emit(
                    Level::Info,
                    "install.acquire.local",
                    &format!("{} Using local artifact {}", char::from(NerdFont::Archive), local.display()),
                    None,
                );
                (LocalOrFetched::Local(local), String::new())
            }
            None => {
                emit(
                    Level::Info,
                    "install.acquire.fetch",
                    &format!("{} Downloading the latest Cursor build...", char::from(NerdFont::Download)),
                    None,
                );
                match fetch::fetch_latest() {
                    Ok(fetched) => {
                        let version = fetched.version.clone();
                        (LocalOrFetched::Fetched(fetched), version)
                    }
                    Err(e) => {
                        // A previously pinned artifact may still be in
                        // place; the rest of the sequence works off it.
                        emit(
                            Level::Warn,
                            "install.acquire.failed",
                            &format!("{} Download failed: {e:#}", char::from(NerdFont::Warning)),
                            None,
                        );
                        return;
                    }
                }
            }
        };

        if !version.is_empty() {
            emit(
                Level::Info,
                "install.version",
                &format!("{} Version: {}", char::from(NerdFont::Info), version),
                None,
            );
        }

        match pin::pin_artifact(source.path(), &dest) {
            Ok(()) => {
                // Covers the freshly created data directory as well.
                self.config.restore_ownership(&self.config.data_dir());
                emit(
                    Level::Success,
                    "install.pin",
                    &format!("{} Pinned artifact at {}", char::from(NerdFont::Check), dest.display()),
                    None,
                );
            }
            Err(e) => {
                emit(
                    Level::Warn,
                    "install.pin.failed",
                    &format!("{} Could not pin artifact: {e:#}", char::from(NerdFont::Warning)),
                    None,
                );
            }
        }
        // Dropping a fetched artifact discards its temp directory.
    }

    fn extract_artifact(&self) {
        let artifact = self.config.artifact_path();
        if !artifact.is_file() {
            emit(
                Level::Warn,
                "install.extract.skipped",
                &format!("{} No pinned artifact to extract", char::from(NerdFont::Warning)),
                None,
            );
            return;
        }

        emit(
            Level::Info,
            "install.extract",
            &format!("{} Extracting AppImage...", char::from(NerdFont::Archive)),
            None,
        );
        match extract::extract(&artifact, &self.config.extract_dir()) {
            Ok(root) => {
                // Recursive: the whole extracted tree must belong to
                // the target user, not root.
                self.config.restore_ownership(&self.config.extract_dir());
                emit(
                    Level::Debug,
                    "install.extract.done",
                    &format!("extracted to {}", root.display()),
                    None,
                );
            }
            Err(e) => {
                emit(
                    Level::Warn,
                    "install.extract.failed",
                    &format!("{} Extraction failed: {e:#}", char::from(NerdFont::Warning)),
                    None,
                );
            }
        }
    }

    /// The Chromium sandbox helper must be setuid root to work on
    /// kernels without unprivileged user namespaces.
    fn fix_permissions(&self) {
        let helper = self.config.sandbox_helper();
        if !helper.is_file() {
            emit(
                Level::Warn,
                "install.sandbox.missing",
                &format!(
                    "{} No chrome-sandbox helper in extracted tree, skipping permission fix",
                    char::from(NerdFont::Warning)
                ),
                None,
            );
            return;
        }

        let helper_str = helper.display().to_string();
        for argv in [
            vec!["chown".to_string(), "root:root".to_string(), helper_str.clone()],
            vec!["chmod".to_string(), "4755".to_string(), helper_str.clone()],
        ] {
            match self.broker.run(&argv) {
                BrokerOutcome::Succeeded => {}
                BrokerOutcome::Failed(reason) => {
                    emit(
                        Level::Warn,
                        "install.sandbox.failed",
                        &format!(
                            "{} Sandbox permission fix failed ({}): {}",
                            char::from(NerdFont::Warning),
                            argv.join(" "),
                            reason
                        ),
                        None,
                    );
                }
                BrokerOutcome::Unavailable => {
                    emit(
                        Level::Warn,
                        "install.sandbox.unavailable",
                        &format!(
                            "{} Cannot elevate to fix sandbox permissions",
                            char::from(NerdFont::Warning)
                        ),
                        None,
                    );
                }
            }
        }
    }

    fn resolve_dependencies(&self) {
        emit(
            Level::Info,
            "deps.verify",
            &format!("{} Verifying shared library dependencies...", char::from(NerdFont::Wrench)),
            None,
        );

        let inspector = LddInspector;
        let resolver = DependencyResolver::new(&inspector, &self.mapping, self.broker);
        let result = resolver.resolve(&self.config.resolver_binaries(), MAX_ROUNDS);

        let (level, code) = match &result {
            ResolutionResult::Satisfied => (Level::Success, "deps.satisfied"),
            ResolutionResult::PartiallyUnresolved(_) => (Level::Warn, "deps.partial"),
            ResolutionResult::ExhaustedRounds(_) => (Level::Warn, "deps.exhausted"),
            ResolutionResult::Unavailable => (Level::Warn, "deps.unavailable"),
        };
        let icon = match level {
            Level::Success => NerdFont::Check,
            _ => NerdFont::Warning,
        };
        emit(level, code, &format!("{} {}", char::from(icon), result.describe()), None);
    }

    fn register_launcher(&self) {
        match launcher::register_launcher(self.config) {
            Ok(path) => emit(
                Level::Success,
                "install.launcher",
                &format!("{} Launcher at {}", char::from(NerdFont::Terminal), path.display()),
                None,
            ),
            Err(e) => emit(
                Level::Warn,
                "install.launcher.failed",
                &format!("{} Could not write launcher: {e:#}", char::from(NerdFont::Warning)),
                None,
            ),
        }
    }

    fn register_menu_entry(&self) {
        match launcher::register_menu_entry(self.config) {
            Ok(path) => emit(
                Level::Success,
                "install.menu_entry",
                &format!("{} Menu entry at {}", char::from(NerdFont::Desktop), path.display()),
                None,
            ),
            Err(e) => emit(
                Level::Warn,
                "install.menu_entry.failed",
                &format!("{} Could not write menu entry: {e:#}", char::from(NerdFont::Warning)),
                None,
            ),
        }
    }

    fn install_icon(&self) {
        match launcher::install_icon(self.config) {
            Ok(path) => emit(
                Level::Success,
                "install.icon",
                &format!("{} Icon at {}", char::from(NerdFont::Check), path.display()),
                None,
            ),
            Err(e) => emit(
                Level::Warn,
                "install.icon.failed",
                &format!("{} Could not install icon: {e:#}", char::from(NerdFont::Warning)),
                None,
            ),
        }
    }

    fn runtime_smoke_test(&self) {
        if self.headless {
            emit(
                Level::Info,
                "install.smoke.skipped",
                &format!("{} Headless mode, skipping runtime smoke test", char::from(NerdFont::Info)),
                None,
            );
            return;
        }
        let apprun = self.config.apprun();
        if !apprun.is_file() {
            emit(
                Level::Warn,
                "install.smoke.missing",
                &format!("{} Nothing to smoke test, extraction missing", char::from(NerdFont::Warning)),
                None,
            );
            return;
        }

        emit(
            Level::Info,
            "install.smoke",
            &format!("{} Launching Cursor briefly to verify it starts...", char::from(NerdFont::Rocket)),
            None,
        );
        match smoke::smoke_test(&apprun) {
            Ok(()) => emit(
                Level::Success,
                "install.smoke.ok",
                &format!("{} Application starts and shuts down cleanly", char::from(NerdFont::Check)),
                None,
            ),
            Err(e) => emit(
                Level::Warn,
                "install.smoke.failed",
                &format!("{} Smoke test failed: {e:#}", char::from(NerdFont::Warning)),
                None,
            ),
        }
    }

    /// Computed strictly after pinning and menu registration, so the
    /// keep-set protects exactly what this run produced.
    fn post_scan_cleanup(&self) {
        self.cleanup_pass("post-install", &self.base_keep_set());
    }
}

enum LocalOrFetched {
    Local(PathBuf),
    Fetched(fetch::FetchedArtifact),
}

impl LocalOrFetched {
    fn path(&self) -> &std::path::Path {
        match self {
            Self::Local(path) => path,
            Self::Fetched(fetched) => &fetched.path,
        }
    }
}
