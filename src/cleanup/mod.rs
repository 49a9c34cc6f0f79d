//! Duplicate artifact detection and safe cleanup.
//!
//! Prior installer runs and manual downloads leave stray AppImages and
//! menu entries behind. The scan finds everything that looks like one,
//! the plan subtracts the keep-set, and execution deletes only with an
//! explicit "yes".

use crate::ui::prelude::*;
use glob::Pattern;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// How deep below each scan root the walk descends.
const SCAN_DEPTH: usize = 4;

/// File name patterns that identify artifacts of this application.
pub fn artifact_patterns() -> Vec<Pattern> {
    ["cursor*.AppImage", "cursor*.appimage", "cursor*.desktop"]
        .iter()
        .map(|p| Pattern::new(p).expect("static pattern"))
        .collect()
}

/// Paths a cleanup pass must never delete.
///
/// Membership is exact path equality. The scan patterns are coarser
/// than the keep paths, so safety comes from set subtraction here and
/// never from tweaking the patterns.
#[derive(Debug, Clone, Default)]
pub struct KeepSet {
    paths: HashSet<PathBuf>,
}

impl KeepSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a path. Nonexistent paths are kept too: a file pinned a
    /// moment from now must already be protected.
    pub fn insert(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        // Canonicalize where possible so symlinked homes still match.
        let resolved = path.canonicalize().unwrap_or_else(|_| path.clone());
        self.paths.insert(resolved);
        self.paths.insert(path);
    }

    pub fn contains(&self, path: &Path) -> bool {
        if self.paths.contains(path) {
            return true;
        }
        path.canonicalize()
            .map(|resolved| self.paths.contains(&resolved))
            .unwrap_or(false)
    }
}

/// The result of planning a cleanup: everything found, and the subset
/// that is actually safe to delete.
#[derive(Debug, Clone)]
pub struct CleanupPlan {
    pub matches: Vec<PathBuf>,
    pub candidates: Vec<PathBuf>,
}

/// Seam for yes/no questions. A provider without a terminal answers
/// "no", which makes cleanup safe by default.
pub trait ConfirmProvider {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Prompts on the terminal via dialoguer. Any prompt failure,
/// including there being no terminal attached, counts as "no".
pub struct InteractiveConfirm;

impl ConfirmProvider for InteractiveConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// Never confirms anything. Used in headless mode and whenever no
/// interactive channel exists.
pub struct HeadlessConfirm;

impl ConfirmProvider for HeadlessConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

/// Scan a subtree for artifact-like files.
///
/// Best-effort walk: traversal errors are skipped, only regular files
/// are reported, and the walk is bounded to a fixed depth.
pub fn scan(root: &Path, patterns: &[Pattern]) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }

    WalkDir::new(root)
        .max_depth(SCAN_DEPTH)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            patterns.iter().any(|p| p.matches(&name))
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Scan several roots, deduplicating overlap between them.
pub fn scan_all(roots: &[PathBuf], patterns: &[Pattern]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut matches = Vec::new();
    for root in roots {
        for path in scan(root, patterns) {
            if seen.insert(path.clone()) {
                matches.push(path);
            }
        }
    }
    matches
}

/// Compute the deletion candidate set: all matches minus the keep-set.
pub fn plan(matches: Vec<PathBuf>, keep: &KeepSet) -> CleanupPlan {
    let candidates = matches
        .iter()
        .filter(|path| !keep.contains(path))
        .cloned()
        .collect();
    CleanupPlan { matches, candidates }
}

/// Delete the planned candidates, if confirmed.
///
/// Without an affirmative answer nothing is deleted and the plan is
/// only reported. Each deletion is individually best-effort.
pub fn execute(plan: &CleanupPlan, confirm: &dyn ConfirmProvider) -> Vec<PathBuf> {
    if plan.candidates.is_empty() {
        emit(
            Level::Debug,
            "cleanup.none",
            "no duplicate artifacts to remove",
            None,
        );
        return Vec::new();
    }

    for candidate in &plan.candidates {
        emit(
            Level::Info,
            "cleanup.candidate",
            &format!("{} Duplicate: {}", char::from(NerdFont::Search), candidate.display()),
            None,
        );
    }

    let prompt = format!("Delete {} duplicate file(s)?", plan.candidates.len());
    if !confirm.confirm(&prompt) {
        emit(
            Level::Info,
            "cleanup.skipped",
            &format!(
                "{} Keeping {} duplicate(s); nothing deleted",
                char::from(NerdFont::Info),
                plan.candidates.len()
            ),
            None,
        );
        return Vec::new();
    }

    let mut deleted = Vec::new();
    for candidate in &plan.candidates {
        match std::fs::remove_file(candidate) {
            Ok(()) => {
                emit(
                    Level::Success,
                    "cleanup.deleted",
                    &format!("{} Removed {}", char::from(NerdFont::Trash), candidate.display()),
                    None,
                );
                deleted.push(candidate.clone());
            }
            Err(e) => {
                emit(
                    Level::Warn,
                    "cleanup.delete_failed",
                    &format!(
                        "{} Could not remove {}: {}",
                        char::from(NerdFont::Warning),
                        candidate.display(),
                        e
                    ),
                    None,
                );
            }
        }
    }
    deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    struct AlwaysYes;
    impl ConfirmProvider for AlwaysYes {
        fn confirm(&self, _prompt: &str) -> bool {
            true
        }
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn scan_finds_artifacts_by_pattern() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("cursor.AppImage"));
        touch(&dir.path().join("cursor-old.AppImage"));
        touch(&dir.path().join("unrelated.txt"));
        touch(&dir.path().join("sub/cursor.desktop"));

        let found = scan(dir.path(), &artifact_patterns());
        assert_eq!(found.len(), 3);
        assert!(!found.iter().any(|p| p.ends_with("unrelated.txt")));
    }

    #[test]
    fn scan_respects_depth_bound() {
        let dir = tempfile::tempdir().unwrap();
        let deep = dir.path().join("a/b/c/d/e/cursor.AppImage");
        touch(&deep);
        let shallow = dir.path().join("a/cursor.AppImage");
        touch(&shallow);

        let found = scan(dir.path(), &artifact_patterns());
        assert_eq!(found, vec![shallow]);
    }

    #[test]
    fn scan_of_missing_root_is_empty() {
        let found = scan(Path::new("/nonexistent/surely"), &artifact_patterns());
        assert!(found.is_empty());
    }

    #[test]
    fn plan_never_includes_keep_set_members() {
        // Scenario C plus the general safety property: whatever the
        // scan found, keep-set members never become candidates.
        let dir = tempfile::tempdir().unwrap();
        let pinned = dir.path().join("cursor.AppImage");
        let stale = dir.path().join("cursor-old.AppImage");
        touch(&pinned);
        touch(&stale);

        let mut keep = KeepSet::new();
        keep.insert(&pinned);

        let plan = plan(scan(dir.path(), &artifact_patterns()), &keep);
        assert_eq!(plan.matches.len(), 2);
        assert_eq!(plan.candidates, vec![stale]);
        for kept in &plan.matches {
            if keep.contains(kept) {
                assert!(!plan.candidates.contains(kept));
            }
        }
    }

    #[test]
    fn keep_set_protects_paths_that_do_not_exist_yet() {
        let mut keep = KeepSet::new();
        keep.insert("/home/alice/.local/share/cursor/cursor.AppImage");
        assert!(keep.contains(Path::new(
            "/home/alice/.local/share/cursor/cursor.AppImage"
        )));
    }

    #[test]
    fn declined_confirmation_deletes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("cursor-old.AppImage");
        touch(&stale);

        let plan = plan(vec![stale.clone()], &KeepSet::new());
        let deleted = execute(&plan, &HeadlessConfirm);

        assert!(deleted.is_empty());
        assert!(stale.exists());
    }

    #[test]
    fn confirmed_execution_deletes_candidates_only() {
        let dir = tempfile::tempdir().unwrap();
        let pinned = dir.path().join("cursor.AppImage");
        let stale = dir.path().join("cursor-old.AppImage");
        touch(&pinned);
        touch(&stale);

        let mut keep = KeepSet::new();
        keep.insert(&pinned);

        let plan = plan(scan(dir.path(), &artifact_patterns()), &keep);
        let deleted = execute(&plan, &AlwaysYes);

        assert_eq!(deleted, vec![stale.clone()]);
        assert!(pinned.exists());
        assert!(!stale.exists());
    }

    #[test]
    fn one_failed_deletion_does_not_abort_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("cursor-a.AppImage");
        let present = dir.path().join("cursor-b.AppImage");
        touch(&present);

        // `gone` never existed on disk, so its deletion fails.
        let plan = plan(vec![gone, present.clone()], &KeepSet::new());
        let deleted = execute(&plan, &AlwaysYes);

        assert_eq!(deleted, vec![present.clone()]);
        assert!(!present.exists());
    }
}
